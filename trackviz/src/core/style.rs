use crate::core::circuit::{CornerKind, FacilityKind, SpeedClass};
use crate::core::surface::Rgba;
use serde::{Deserialize, Serialize};

/// Theme is the swappable lookup table from geometry classifications to colors. Every field can be
/// overridden from the viewer configuration as a CSS color string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background_top: Rgba,
    pub background_bottom: Rgba,

    pub track_bed: Rgba,
    pub track_surface: Rgba,
    pub racing_line: Rgba,
    pub track_boundary: Rgba,
    pub barrier: Rgba,

    pub elevation_up: Rgba,
    pub elevation_down: Rgba,
    pub label: Rgba,

    pub drs: Rgba,
    pub drs_label: Rgba,
    pub sectors: Vec<Rgba>,

    pub corner_left: Rgba,
    pub corner_right: Rgba,
    pub corner_chicane: Rgba,
    pub banking_positive: Rgba,
    pub banking_negative: Rgba,
    pub speed_slow: Rgba,
    pub speed_medium: Rgba,
    pub speed_fast: Rgba,

    pub grandstand: Rgba,
    pub pit: Rgba,
    pub paddock: Rgba,
    pub media: Rgba,
    pub safety: Rgba,
    pub fallback: Rgba,

    pub light: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background_top: Rgba::rgb(0x1a, 0x1a, 0x2e),
            background_bottom: Rgba::rgb(0x16, 0x21, 0x3e),
            track_bed: Rgba::rgb(0x2d, 0x37, 0x48),
            track_surface: Rgba::rgb(0x4a, 0x55, 0x68),
            racing_line: Rgba::rgb(0xe5, 0x3e, 0x3e),
            track_boundary: Rgba::WHITE,
            barrier: Rgba::rgb(0x71, 0x80, 0x96),
            elevation_up: Rgba::rgb(239, 68, 68),
            elevation_down: Rgba::rgb(59, 130, 246),
            label: Rgba::WHITE,
            drs: Rgba::rgb(72, 187, 120),
            drs_label: Rgba::rgb(0x48, 0xbb, 0x78),
            sectors: vec![
                Rgba::rgb(0xf5, 0x65, 0x65),
                Rgba::rgb(0x48, 0xbb, 0x78),
                Rgba::rgb(0x42, 0x99, 0xe1),
            ],
            corner_left: Rgba::rgb(0xf5, 0x65, 0x65),
            corner_right: Rgba::rgb(0x42, 0x99, 0xe1),
            corner_chicane: Rgba::rgb(0xed, 0x89, 0x36),
            banking_positive: Rgba::rgb(0xf6, 0xad, 0x55),
            banking_negative: Rgba::rgb(0x63, 0xb3, 0xed),
            speed_slow: Rgba::rgb(0xf5, 0x65, 0x65),
            speed_medium: Rgba::rgb(0xed, 0x89, 0x36),
            speed_fast: Rgba::rgb(0x48, 0xbb, 0x78),
            grandstand: Rgba::rgb(0x80, 0x5a, 0xd5),
            pit: Rgba::rgb(0xe5, 0x3e, 0x3e),
            paddock: Rgba::rgb(0x38, 0xa1, 0x69),
            media: Rgba::rgb(0x31, 0x82, 0xce),
            safety: Rgba::rgb(0xd6, 0x9e, 0x2e),
            fallback: Rgba::rgb(0x71, 0x80, 0x96),
            light: Rgba::WHITE,
        }
    }
}

impl Theme {
    pub fn corner_color(&self, kind: CornerKind) -> Rgba {
        match kind {
            CornerKind::Left => self.corner_left,
            CornerKind::Right => self.corner_right,
            CornerKind::Chicane => self.corner_chicane,
        }
    }

    pub fn speed_color(&self, speed: SpeedClass) -> Rgba {
        match speed {
            SpeedClass::Slow => self.speed_slow,
            SpeedClass::Medium => self.speed_medium,
            SpeedClass::Fast => self.speed_fast,
        }
    }

    pub fn facility_color(&self, kind: FacilityKind) -> Rgba {
        match kind {
            FacilityKind::Grandstand => self.grandstand,
            FacilityKind::Pit => self.pit,
            FacilityKind::Paddock => self.paddock,
            FacilityKind::Media => self.media,
            FacilityKind::Safety => self.safety,
        }
    }

    /// sector_color cycles through the sector palette, falling back for an empty palette.
    pub fn sector_color(&self, idx: usize) -> Rgba {
        if self.sectors.is_empty() {
            self.fallback
        } else {
            self.sectors[idx % self.sectors.len()]
        }
    }

    pub fn banking_color(&self, banking: f64) -> Rgba {
        if banking > 0.0 {
            self.banking_positive
        } else {
            self.banking_negative
        }
    }

    /// elevation_color is warm above the reference height and cool otherwise, with an alpha that
    /// grows with the absolute elevation up to 0.8.
    pub fn elevation_color(&self, z: f64) -> Rgba {
        let alpha = (z.abs() / 50.0).min(0.8);
        if z > 0.0 {
            self.elevation_up.with_alpha(alpha)
        } else {
            self.elevation_down.with_alpha(alpha)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sector_palette_cycles() {
        let theme = Theme::default();
        assert_eq!(theme.sector_color(3), theme.sector_color(0));
        let empty = Theme {
            sectors: Vec::new(),
            ..Theme::default()
        };
        assert_eq!(empty.sector_color(1), empty.fallback);
    }

    #[test]
    fn elevation_alpha_saturates() {
        let theme = Theme::default();
        assert_relative_eq!(theme.elevation_color(10.0).a, 0.2);
        assert_relative_eq!(theme.elevation_color(-100.0).a, 0.8);
        assert_eq!(theme.elevation_color(-10.0).b, 246);
    }

    #[test]
    fn partial_theme_overrides_keep_defaults() {
        let theme: Theme =
            serde_json::from_str(r##"{ "corner_left": "#00ff00", "sectors": ["red"] }"##).unwrap();
        assert_eq!(theme.corner_left, Rgba::rgb(0, 255, 0));
        assert_eq!(theme.sector_color(2), Rgba::rgb(255, 0, 0));
        assert_eq!(theme.corner_right, Theme::default().corner_right);
    }
}
