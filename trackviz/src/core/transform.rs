use crate::core::camera::CameraState;
use helpers::general::deg_to_rad;
use glam::{DAffine2, DVec2};
use helpers::geometry::Point2d;
use serde::{Deserialize, Serialize};

/// Viewport is the pixel size of the drawing surface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Viewport {
        Viewport { width, height }
    }

    /// is_ready is false as long as the surface has not been measured.
    pub fn is_ready(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Point2d {
        Point2d::new(self.width / 2.0, self.height / 2.0)
    }
}

fn to_dvec2(p: &Point2d) -> DVec2 {
    DVec2::new(p.x, p.y)
}

fn to_point2d(v: DVec2) -> Point2d {
    Point2d::new(v.x, v.y)
}

/// ViewTransform maps drawing units to surface pixels: scale first, then rotate, then translate
/// to the viewport center plus the camera pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    affine: DAffine2,
    inverse: DAffine2,
    scale: f64,
}

impl ViewTransform {
    /// new returns None for an unready viewport, so no frame is ever drawn with a degenerate scale.
    pub fn new(camera: &CameraState, viewport: &Viewport, reference_size: f64) -> Option<ViewTransform> {
        if !viewport.is_ready() || reference_size <= 0.0 {
            return None;
        }

        let scale = camera.zoom() * viewport.width.min(viewport.height) / reference_size;
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }

        let origin = viewport.center().offset(&camera.pan());
        let affine = DAffine2::from_scale_angle_translation(
            DVec2::splat(scale),
            deg_to_rad(camera.rotation()),
            to_dvec2(&origin),
        );

        Some(ViewTransform {
            affine,
            inverse: affine.inverse(),
            scale,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn origin(&self) -> Point2d {
        to_point2d(self.affine.translation)
    }

    pub fn apply(&self, p: &Point2d) -> Point2d {
        to_point2d(self.affine.transform_point2(to_dvec2(p)))
    }

    pub fn invert(&self, screen: &Point2d) -> Point2d {
        to_point2d(self.inverse.transform_point2(to_dvec2(screen)))
    }
}
