/// normalize_degrees maps an arbitrary angle in degrees into the half-open range [0.0, 360.0[.
pub fn normalize_degrees(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }

    let norm = deg.rem_euclid(360.0);

    // rem_euclid may return exactly 360.0 for tiny negative inputs due to rounding
    if norm >= 360.0 {
        0.0
    } else {
        norm
    }
}

/// deg_to_rad converts degrees to radians.
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// round_to rounds x to the given number of decimal places.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}
