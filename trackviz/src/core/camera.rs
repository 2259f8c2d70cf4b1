use helpers::general::{normalize_degrees, round_to};
use helpers::geometry::Vector2d;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Layer is one independently toggleable overlay of the track drawing. The order of `Layer::ALL`
/// is not the draw order, see `Renderer::render` for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Track,
    Elevation,
    Facilities,
    DrsZones,
    Sectors,
    Corners,
    Barriers,
    Lighting,
}

impl Layer {
    pub const ALL: [Layer; 8] = [
        Layer::Track,
        Layer::Elevation,
        Layer::Facilities,
        Layer::DrsZones,
        Layer::Sectors,
        Layer::Corners,
        Layer::Barriers,
        Layer::Lighting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Layer::Track => "Track",
            Layer::Elevation => "Elevation",
            Layer::Facilities => "Facilities",
            Layer::DrsZones => "DRS zones",
            Layer::Sectors => "Sectors",
            Layer::Corners => "Corners",
            Layer::Barriers => "Barriers",
            Layer::Lighting => "Lighting",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Layer::Track => "track",
            Layer::Elevation => "elevation",
            Layer::Facilities => "facilities",
            Layer::DrsZones => "drs_zones",
            Layer::Sectors => "sectors",
            Layer::Corners => "corners",
            Layer::Barriers => "barriers",
            Layer::Lighting => "lighting",
        };
        write!(f, "{}", text)
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "track" => Ok(Layer::Track),
            "elevation" => Ok(Layer::Elevation),
            "facilities" => Ok(Layer::Facilities),
            "drs" | "drszones" => Ok(Layer::DrsZones),
            "sectors" => Ok(Layer::Sectors),
            "corners" => Ok(Layer::Corners),
            "barriers" => Ok(Layer::Barriers),
            "lighting" => Ok(Layer::Lighting),
            _ => Err(format!("unknown layer '{}'", s)),
        }
    }
}

/// LayerSet holds one visibility flag per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSet {
    flags: [bool; 8],
}

impl Default for LayerSet {
    fn default() -> Self {
        LayerSet::all()
    }
}

impl LayerSet {
    pub fn all() -> LayerSet {
        LayerSet { flags: [true; 8] }
    }

    pub fn none() -> LayerSet {
        LayerSet { flags: [false; 8] }
    }

    pub fn only(layers: &[Layer]) -> LayerSet {
        let mut set = LayerSet::none();
        for &layer in layers {
            set.set(layer, true);
        }
        set
    }

    fn idx(layer: Layer) -> usize {
        Layer::ALL
            .iter()
            .position(|&l| l == layer)
            .unwrap_or_default()
    }

    pub fn is_visible(&self, layer: Layer) -> bool {
        self.flags[LayerSet::idx(layer)]
    }

    pub fn set(&mut self, layer: Layer, visible: bool) {
        self.flags[LayerSet::idx(layer)] = visible;
    }

    pub fn toggle(&mut self, layer: Layer) {
        let idx = LayerSet::idx(layer);
        self.flags[idx] = !self.flags[idx];
    }

    pub fn visible(&self) -> impl Iterator<Item = Layer> + '_ {
        Layer::ALL.iter().copied().filter(move |&l| self.is_visible(l))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Overview,
    Detailed,
    Technical,
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Overview
    }
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Overview, ViewMode::Detailed, ViewMode::Technical];
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            ViewMode::Overview => "Overview",
            ViewMode::Detailed => "Detailed",
            ViewMode::Technical => "Technical",
        };
        write!(f, "{}", text)
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overview" => Ok(ViewMode::Overview),
            "detailed" => Ok(ViewMode::Detailed),
            "technical" => Ok(ViewMode::Technical),
            _ => Err(format!(
                "unknown view mode '{}', use overview, detailed or technical",
                s
            )),
        }
    }
}

/// ViewPreset bundles a rotation and a zoom level that are applied together.
///
/// * `name` - Button label, e.g. Bird's eye
/// * `rotation` - (deg) Camera rotation
/// * `zoom` - Zoom factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPreset {
    pub name: String,
    pub rotation: f64,
    pub zoom: f64,
}

impl ViewPreset {
    pub fn new(name: &str, rotation: f64, zoom: f64) -> ViewPreset {
        ViewPreset {
            name: name.to_owned(),
            rotation,
            zoom,
        }
    }

    pub fn defaults() -> Vec<ViewPreset> {
        vec![
            ViewPreset::new("Start/Finish", 0.0, 1.0),
            ViewPreset::new("Bird's eye", 0.0, 0.6),
            ViewPreset::new("Close-up", 45.0, 2.0),
            ViewPreset::new("Side", 90.0, 1.4),
        ]
    }
}

/// * `min_zoom`, `max_zoom` - Zoom bounds
/// * `zoom_step` - Zoom change per zoom button press
/// * `default_zoom` - Zoom after a camera reset
/// * `rotation_step` - (deg) Rotation advance per animation frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    pub default_zoom: f64,
    pub rotation_step: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            min_zoom: 0.3,
            max_zoom: 3.0,
            zoom_step: 0.2,
            default_zoom: 1.0,
            rotation_step: 0.5,
        }
    }
}

/// CameraState holds the view parameters of one view session. The rotation is kept in [0, 360[,
/// the zoom within the configured bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    config: CameraConfig,
    rotation: f64,
    zoom: f64,
    pan: Vector2d,
    pub layers: LayerSet,
    pub view_mode: ViewMode,
}

impl Default for CameraState {
    fn default() -> Self {
        CameraState::new(CameraConfig::default())
    }
}

impl CameraState {
    pub fn new(config: CameraConfig) -> CameraState {
        let mut camera = CameraState {
            config,
            rotation: 0.0,
            zoom: 1.0,
            pan: Vector2d::default(),
            layers: LayerSet::default(),
            view_mode: ViewMode::default(),
        };
        camera.zoom = camera.clamp_zoom(config.default_zoom);
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vector2d {
        self.pan
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.zoom;
        }
        // rounding keeps repeated button steps on the decimal grid (1.0 + 5 * 0.2 == 2.0)
        round_to(
            zoom.max(self.config.min_zoom).min(self.config.max_zoom),
            6,
        )
    }

    /// set_zoom changes the zoom by `delta` and clamps the result silently.
    pub fn set_zoom(&mut self, delta: f64) {
        self.zoom = self.clamp_zoom(self.zoom + delta);
    }

    pub fn set_zoom_level(&mut self, zoom: f64) {
        self.zoom = self.clamp_zoom(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(-self.config.zoom_step);
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = normalize_degrees(degrees);
    }

    /// advance_rotation is the only camera mutation performed by the animation driver.
    pub fn advance_rotation(&mut self) {
        self.set_rotation(self.rotation + self.config.rotation_step);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.pan = self.pan.add(&Vector2d::new(dx, dy));
        }
    }

    pub fn toggle_layer(&mut self, layer: Layer) {
        self.layers.toggle(layer);
    }

    pub fn apply_preset(&mut self, preset: &ViewPreset) {
        let rotation = normalize_degrees(preset.rotation);
        let zoom = self.clamp_zoom(preset.zoom);
        self.rotation = rotation;
        self.zoom = zoom;
    }

    /// reset restores rotation, zoom and pan. Layers and the view mode stay as they are.
    pub fn reset(&mut self) {
        self.rotation = 0.0;
        self.zoom = self.clamp_zoom(self.config.default_zoom);
        self.pan = Vector2d::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zoom_is_clamped_for_any_delta() {
        let mut camera = CameraState::default();
        for delta in [-1e9, -5.0, -0.71, 0.0, 0.3, 2.5, 1e12, f64::INFINITY, f64::NEG_INFINITY] {
            camera.set_zoom(delta);
            assert!(camera.zoom() >= 0.3 && camera.zoom() <= 3.0, "{}", camera.zoom());
        }
        camera.set_zoom(f64::NAN);
        assert!(camera.zoom() >= 0.3 && camera.zoom() <= 3.0);
    }

    #[test]
    fn five_zoom_steps_reach_two_and_ceiling_holds() {
        let mut camera = CameraState::default();
        for _ in 0..5 {
            camera.set_zoom(0.2);
        }
        assert_eq!(camera.zoom(), 2.0);
        for _ in 0..10 {
            camera.zoom_in();
        }
        assert_eq!(camera.zoom(), 3.0);
        camera.set_zoom(-100.0);
        assert_eq!(camera.zoom(), 0.3);
    }

    #[test]
    fn rotation_is_normalized_and_periodic() {
        let mut camera = CameraState::default();
        for d in [-725.5, -360.0, -0.5, 0.0, 12.25, 359.5, 360.0, 1000.0] {
            camera.set_rotation(d);
            let base = camera.rotation();
            assert!((0.0..360.0).contains(&base));
            for k in [-3, -1, 1, 4] {
                camera.set_rotation(d + 360.0 * k as f64);
                assert_relative_eq!(camera.rotation(), base, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn reset_is_idempotent_and_keeps_layers() {
        let mut camera = CameraState::default();
        camera.set_rotation(123.0);
        camera.set_zoom(1.2);
        camera.pan_by(30.0, -12.0);
        camera.toggle_layer(Layer::Lighting);
        camera.view_mode = ViewMode::Technical;

        camera.reset();
        let once = camera.clone();
        camera.reset();

        assert_eq!(camera, once);
        assert_eq!(camera.rotation(), 0.0);
        assert_eq!(camera.zoom(), 1.0);
        assert_eq!(camera.pan(), Vector2d::default());
        assert!(!camera.layers.is_visible(Layer::Lighting));
        assert_eq!(camera.view_mode, ViewMode::Technical);
    }

    #[test]
    fn preset_sets_rotation_and_zoom_together() {
        let mut camera = CameraState::default();
        camera.apply_preset(&ViewPreset::new("Spin", -90.0, 9.0));
        assert_eq!(camera.rotation(), 270.0);
        assert_eq!(camera.zoom(), 3.0);
    }

    #[test]
    fn toggle_flips_exactly_one_layer() {
        let mut camera = CameraState::default();
        camera.toggle_layer(Layer::Facilities);
        for layer in Layer::ALL {
            assert_eq!(camera.layers.is_visible(layer), layer != Layer::Facilities);
        }
    }

    #[test]
    fn layer_names_parse() {
        assert_eq!("drsZones".parse::<Layer>(), Ok(Layer::DrsZones));
        assert_eq!("drs_zones".parse::<Layer>(), Ok(Layer::DrsZones));
        assert_eq!("DRS".parse::<Layer>(), Ok(Layer::DrsZones));
        assert!("weather".parse::<Layer>().is_err());
        for layer in Layer::ALL {
            assert_eq!(layer.to_string().parse::<Layer>(), Ok(layer));
        }
    }

    #[test]
    fn advance_rotation_wraps() {
        let mut camera = CameraState::default();
        camera.set_rotation(359.5);
        camera.advance_rotation();
        assert_eq!(camera.rotation(), 0.0);
    }
}
