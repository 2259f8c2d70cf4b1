use crate::core::camera::Layer;
use crate::core::surface::{Font, Paint, Path, PathCmd, StrokeStyle, Surface, TextAlign};
use crate::core::transform::{ViewTransform, Viewport};
use helpers::geometry::Point2d;
use serde::Serialize;

/// DrawCall is one recorded drawing element. Paths are stored flattened; a path consisting of a
/// single circle is stored as its center plus radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCall {
    FillRect {
        origin: Point2d,
        width: f64,
        height: f64,
        paint: Paint,
    },
    FillPath {
        points: Vec<Point2d>,
        radius: Option<f64>,
        paint: Paint,
    },
    StrokePath {
        points: Vec<Point2d>,
        radius: Option<f64>,
        width: f64,
        dash: Vec<f64>,
        paint: Paint,
    },
    FillText {
        text: String,
        at: Point2d,
        font: Font,
        align: TextAlign,
        paint: Paint,
    },
}

/// RecordedCall is a draw call together with the layer it was issued in (None for the background
/// and everything drawn outside of a layer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedCall {
    pub layer: Option<Layer>,
    #[serde(flatten)]
    pub call: DrawCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerCount {
    pub layer: String,
    pub calls: usize,
}

/// RecordingSurface keeps every draw call in issue order instead of rasterizing it.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Viewport,
    calls: Vec<RecordedCall>,
    layer: Option<Layer>,
    transform: Option<ViewTransform>,
    clears: usize,
}

fn path_geometry(path: &Path) -> (Vec<Point2d>, Option<f64>) {
    match path.cmds() {
        [PathCmd::Circle { center, radius }] => (vec![*center], Some(*radius)),
        _ => (path.flatten().into_iter().flatten().collect(), None),
    }
}

impl RecordingSurface {
    pub fn new(size: Viewport) -> RecordingSurface {
        RecordingSurface {
            size,
            calls: Vec::new(),
            layer: None,
            transform: None,
            clears: 0,
        }
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    /// transform returns the transform active at the end of the recording, None if reset.
    pub fn transform(&self) -> Option<&ViewTransform> {
        self.transform.as_ref()
    }

    pub fn calls_in(&self, layer: Option<Layer>) -> impl Iterator<Item = &DrawCall> + '_ {
        self.calls
            .iter()
            .filter(move |c| c.layer == layer)
            .map(|c| &c.call)
    }

    pub fn count_in(&self, layer: Option<Layer>) -> usize {
        self.calls_in(layer).count()
    }

    /// layer_summary returns the number of draw calls per layer in the order the layers were drawn.
    pub fn layer_summary(&self) -> Vec<LayerCount> {
        let mut summary: Vec<(Option<Layer>, usize)> = Vec::new();
        for call in self.calls.iter() {
            match summary.iter_mut().find(|(l, _)| *l == call.layer) {
                Some((_, n)) => *n += 1,
                None => summary.push((call.layer, 1)),
            }
        }
        summary
            .into_iter()
            .map(|(layer, calls)| LayerCount {
                layer: layer.map_or_else(|| "background".to_owned(), |l| l.to_string()),
                calls,
            })
            .collect()
    }

    fn push(&mut self, call: DrawCall) {
        self.calls.push(RecordedCall {
            layer: self.layer,
            call,
        });
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Viewport {
        self.size
    }

    fn clear(&mut self) {
        self.calls.clear();
        self.layer = None;
        self.clears += 1;
    }

    fn set_transform(&mut self, transform: &ViewTransform) {
        self.transform = Some(*transform);
    }

    fn reset_transform(&mut self) {
        self.transform = None;
    }

    fn fill_rect(&mut self, origin: Point2d, width: f64, height: f64, paint: &Paint) {
        self.push(DrawCall::FillRect {
            origin,
            width,
            height,
            paint: paint.clone(),
        });
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let (points, radius) = path_geometry(path);
        self.push(DrawCall::FillPath {
            points,
            radius,
            paint: paint.clone(),
        });
    }

    fn stroke_path(&mut self, path: &Path, style: &StrokeStyle) {
        let (points, radius) = path_geometry(path);
        self.push(DrawCall::StrokePath {
            points,
            radius,
            width: style.width,
            dash: style.dash.clone(),
            paint: style.paint.clone(),
        });
    }

    fn fill_text(&mut self, text: &str, at: Point2d, font: Font, align: TextAlign, paint: &Paint) {
        self.push(DrawCall::FillText {
            text: text.to_owned(),
            at,
            font,
            align,
            paint: paint.clone(),
        });
    }

    fn begin_layer(&mut self, layer: Option<Layer>) {
        self.layer = layer;
    }

    fn end_layer(&mut self) {
        self.layer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::CameraState;
    use crate::core::circuit::fixtures::monaco_like;
    use crate::core::renderer::{RenderConfig, Renderer};
    use crate::core::style::Theme;

    #[test]
    fn summary_follows_draw_order() {
        let viewport = Viewport::new(800.0, 600.0);
        let mut surface = RecordingSurface::new(viewport);
        let renderer = Renderer::new(&RenderConfig::default(), Theme::default());
        renderer
            .render(&mut surface, &monaco_like(), &CameraState::default(), &viewport)
            .unwrap();

        let layers: Vec<String> = surface.layer_summary().into_iter().map(|c| c.layer).collect();
        assert_eq!(
            layers,
            vec![
                "background",
                "track",
                "barriers",
                "elevation",
                "drs_zones",
                "sectors",
                "corners",
                "facilities",
                "lighting"
            ]
        );
        assert!(surface.transform().is_none());
    }

    #[test]
    fn clear_drops_previous_frame() {
        let viewport = Viewport::new(800.0, 600.0);
        let mut surface = RecordingSurface::new(viewport);
        let renderer = Renderer::new(&RenderConfig::default(), Theme::default());
        let circuit = monaco_like();
        let camera = CameraState::default();
        let first = renderer.render(&mut surface, &circuit, &camera, &viewport).unwrap();
        let second = renderer.render(&mut surface, &circuit, &camera, &viewport).unwrap();
        assert_eq!(first, second);
        assert_eq!(surface.calls().len(), second.elements_drawn + 1);
        assert_eq!(surface.clears(), 2);
    }

    #[test]
    fn recorded_calls_serialize_with_layer() {
        let mut surface = RecordingSurface::new(Viewport::new(10.0, 10.0));
        surface.begin_layer(Some(Layer::Corners));
        surface.fill_path(
            &Path::new().circle(Point2d::new(1.0, 2.0), 8.0),
            &Paint::Solid(crate::core::surface::Rgba::WHITE),
        );
        let json = serde_json::to_value(&surface.calls()[0]).unwrap();
        assert_eq!(json["layer"], "corners");
        assert_eq!(json["op"], "fill_path");
        assert_eq!(json["radius"], 8.0);
    }
}
