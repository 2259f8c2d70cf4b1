use crate::core::camera::Layer;
use crate::core::transform::{ViewTransform, Viewport};
use helpers::geometry::Point2d;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThemeError {
    #[error("invalid CSS color '{0}'")]
    InvalidColor(String),
}

/// Rgba is a straight (non-premultiplied) color with an alpha value in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Rgba {
        Rgba { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Rgba {
        Rgba { r, g, b, a }
    }

    /// parse accepts any CSS color notation (#rrggbb, rgb(), rgba(), named colors).
    pub fn parse(s: &str) -> Result<Rgba, ThemeError> {
        let color = s
            .trim()
            .parse::<css_color_parser::Color>()
            .map_err(|_| ThemeError::InvalidColor(s.to_owned()))?;
        Ok(Rgba {
            r: color.r,
            g: color.g,
            b: color.b,
            a: (color.a as f64).max(0.0).min(1.0),
        })
    }

    pub fn with_alpha(&self, a: f64) -> Rgba {
        Rgba {
            a: a.max(0.0).min(1.0),
            ..*self
        }
    }

    pub fn lerp(&self, other: &Rgba, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.max(0.0).min(1.0) };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = ThemeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgba::parse(&s)
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba,
}

impl GradientStop {
    pub fn new(offset: f64, color: Rgba) -> GradientStop {
        GradientStop { offset, color }
    }
}

/// Paint is a fill or stroke source. Gradient geometry is given in the coordinate system that is
/// active when the paint is used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Paint {
    Solid(Rgba),
    Linear {
        from: Point2d,
        to: Point2d,
        stops: Vec<GradientStop>,
    },
    Radial {
        center: Point2d,
        inner_radius: f64,
        outer_radius: f64,
        stops: Vec<GradientStop>,
    },
}

impl From<Rgba> for Paint {
    fn from(c: Rgba) -> Self {
        Paint::Solid(c)
    }
}

fn sample_stops(stops: &[GradientStop], t: f64) -> Rgba {
    let first = match stops.first() {
        Some(s) => s,
        None => return Rgba::TRANSPARENT,
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        if t <= pair[1].offset {
            let span = pair[1].offset - pair[0].offset;
            if span <= 0.0 {
                return pair[1].color;
            }
            return pair[0].color.lerp(&pair[1].color, (t - pair[0].offset) / span);
        }
    }
    stops.last().map(|s| s.color).unwrap_or(first.color)
}

impl Paint {
    /// color_at samples the paint at a point, which is enough for backends without native
    /// gradient support.
    pub fn color_at(&self, p: &Point2d) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::Linear { from, to, stops } => {
                let axis = to.as_vector2d().sub(&from.as_vector2d());
                let len_sq = axis.x * axis.x + axis.y * axis.y;
                if len_sq <= f64::EPSILON {
                    return sample_stops(stops, 0.0);
                }
                let d = p.as_vector2d().sub(&from.as_vector2d());
                sample_stops(stops, (d.x * axis.x + d.y * axis.y) / len_sq)
            }
            Paint::Radial {
                center,
                inner_radius,
                outer_radius,
                stops,
            } => {
                let span = outer_radius - inner_radius;
                if span <= 0.0 {
                    return sample_stops(stops, 1.0);
                }
                sample_stops(stops, (center.dist(p) - inner_radius) / span)
            }
        }
    }

    /// dominant returns a single representative color (the mean of the stops).
    pub fn dominant(&self) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::Linear { stops, .. } | Paint::Radial { stops, .. } => {
                match (stops.first(), stops.last()) {
                    (Some(a), Some(b)) => a.color.lerp(&b.color, 0.5),
                    _ => Rgba::TRANSPARENT,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrokeStyle {
    pub paint: Paint,
    pub width: f64,
    pub dash: Vec<f64>,
}

impl StrokeStyle {
    pub fn solid(color: Rgba, width: f64) -> StrokeStyle {
        StrokeStyle {
            paint: Paint::Solid(color),
            width,
            dash: Vec::new(),
        }
    }

    pub fn dashed(mut self, dash: &[f64]) -> StrokeStyle {
        self.dash = dash.to_vec();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Font {
    pub size: f64,
    pub bold: bool,
}

impl Font {
    pub fn regular(size: f64) -> Font {
        Font { size, bold: false }
    }

    pub fn bold(size: f64) -> Font {
        Font { size, bold: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathCmd {
    MoveTo(Point2d),
    LineTo(Point2d),
    QuadTo { ctrl: Point2d, to: Point2d },
    Circle { center: Point2d, radius: f64 },
    Close,
}

/// Path is a sequence of drawing commands in the current coordinate system.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Path {
    cmds: Vec<PathCmd>,
}

const QUAD_SEGMENTS: usize = 12;
const CIRCLE_SEGMENTS: usize = 32;

impl Path {
    pub fn new() -> Path {
        Path { cmds: Vec::new() }
    }

    pub fn move_to(mut self, p: Point2d) -> Path {
        self.cmds.push(PathCmd::MoveTo(p));
        self
    }

    pub fn line_to(mut self, p: Point2d) -> Path {
        self.cmds.push(PathCmd::LineTo(p));
        self
    }

    pub fn quad_to(mut self, ctrl: Point2d, to: Point2d) -> Path {
        self.cmds.push(PathCmd::QuadTo { ctrl, to });
        self
    }

    pub fn circle(mut self, center: Point2d, radius: f64) -> Path {
        self.cmds.push(PathCmd::Circle { center, radius });
        self
    }

    pub fn close(mut self) -> Path {
        self.cmds.push(PathCmd::Close);
        self
    }

    pub fn segment(from: Point2d, to: Point2d) -> Path {
        Path::new().move_to(from).line_to(to)
    }

    pub fn cmds(&self) -> &[PathCmd] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// flatten converts the path into polylines. Quadratic curves and circles are approximated by
    /// line segments, circles are returned as closed polylines.
    pub fn flatten(&self) -> Vec<Vec<Point2d>> {
        let mut polylines: Vec<Vec<Point2d>> = Vec::new();
        let mut cur: Vec<Point2d> = Vec::new();

        for cmd in self.cmds.iter() {
            match *cmd {
                PathCmd::MoveTo(p) => {
                    if cur.len() > 1 {
                        polylines.push(std::mem::take(&mut cur));
                    }
                    cur.clear();
                    cur.push(p);
                }
                PathCmd::LineTo(p) => cur.push(p),
                PathCmd::QuadTo { ctrl, to } => {
                    let start = match cur.last() {
                        Some(&p) => p,
                        None => ctrl,
                    };
                    if cur.is_empty() {
                        cur.push(start);
                    }
                    for i in 1..=QUAD_SEGMENTS {
                        let t = i as f64 / QUAD_SEGMENTS as f64;
                        let u = 1.0 - t;
                        cur.push(Point2d::new(
                            u * u * start.x + 2.0 * u * t * ctrl.x + t * t * to.x,
                            u * u * start.y + 2.0 * u * t * ctrl.y + t * t * to.y,
                        ));
                    }
                }
                PathCmd::Circle { center, radius } => {
                    if cur.len() > 1 {
                        polylines.push(std::mem::take(&mut cur));
                    }
                    cur.clear();
                    polylines.push(circle_points(&center, radius));
                }
                PathCmd::Close => {
                    if let Some(&first) = cur.first() {
                        cur.push(first);
                    }
                }
            }
        }

        if cur.len() > 1 {
            polylines.push(cur);
        }
        polylines
    }
}

// RASTER HELPERS ------------------------------------------------------------------------------
// neither egui 0.14 nor the plotters bitmap backend draws dashes or gradients, so the backends
// build them from these plain polygons and polylines

pub fn circle_points(center: &Point2d, radius: f64) -> Vec<Point2d> {
    (0..=CIRCLE_SEGMENTS)
        .map(|i| {
            let a = i as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
            Point2d::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// dash_polyline splits a polyline into the "on" pieces of a dash pattern. An empty pattern or one
/// without positive length returns the polyline unchanged.
pub fn dash_polyline(points: &[Point2d], dash: &[f64]) -> Vec<Vec<Point2d>> {
    let total: f64 = dash.iter().filter(|d| **d > 0.0).sum();
    if dash.is_empty() || total <= 0.0 || points.len() < 2 {
        return vec![points.to_vec()];
    }

    let mut pieces = Vec::new();
    let mut cur: Vec<Point2d> = Vec::new();
    let mut dash_idx = 0;
    let mut left_in_dash = dash[0].max(0.0);
    let mut on = true;
    cur.push(points[0]);

    for seg in points.windows(2) {
        let (mut a, b) = (seg[0], seg[1]);
        let mut seg_len = a.dist(&b);

        while seg_len > 0.0 {
            if left_in_dash >= seg_len {
                left_in_dash -= seg_len;
                if on {
                    cur.push(b);
                }
                seg_len = 0.0;
            } else {
                let t = left_in_dash / seg_len;
                let split = Point2d::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
                if on {
                    cur.push(split);
                    if cur.len() > 1 {
                        pieces.push(std::mem::take(&mut cur));
                    }
                    cur.clear();
                } else {
                    cur.push(split);
                }
                on = !on;
                seg_len -= left_in_dash;
                a = split;
                dash_idx = (dash_idx + 1) % dash.len();
                left_in_dash = dash[dash_idx].max(0.0);
            }
        }
    }

    if on && cur.len() > 1 {
        pieces.push(cur);
    }
    pieces
}

const SHADE_CELLS: usize = 16;
const SHADE_RINGS: usize = 8;

/// shade_rect splits a rectangle into convex cells with one color each. Solid paints yield a single
/// cell, gradients a grid sampled at the cell centers.
pub fn shade_rect(origin: Point2d, width: f64, height: f64, paint: &Paint) -> Vec<(Vec<Point2d>, Rgba)> {
    let quad = |x: f64, y: f64, w: f64, h: f64| {
        vec![
            Point2d::new(x, y),
            Point2d::new(x + w, y),
            Point2d::new(x + w, y + h),
            Point2d::new(x, y + h),
        ]
    };

    if let Paint::Solid(c) = paint {
        return vec![(quad(origin.x, origin.y, width, height), *c)];
    }

    let (cw, ch) = (width / SHADE_CELLS as f64, height / SHADE_CELLS as f64);
    let mut cells = Vec::with_capacity(SHADE_CELLS * SHADE_CELLS);
    for i in 0..SHADE_CELLS {
        for j in 0..SHADE_CELLS {
            let (x, y) = (origin.x + i as f64 * cw, origin.y + j as f64 * ch);
            let color = paint.color_at(&Point2d::new(x + cw / 2.0, y + ch / 2.0));
            if color.a > 0.0 {
                cells.push((quad(x, y, cw, ch), color));
            }
        }
    }
    cells
}

/// shade_disc splits a filled circle into convex ring-sector cells for gradient paints.
pub fn shade_disc(center: Point2d, radius: f64, paint: &Paint) -> Vec<(Vec<Point2d>, Rgba)> {
    if let Paint::Solid(c) = paint {
        return vec![(circle_points(&center, radius), *c)];
    }

    let ring_width = radius / SHADE_RINGS as f64;
    let at = |r: f64, a: f64| Point2d::new(center.x + r * a.cos(), center.y + r * a.sin());
    let mut cells = Vec::with_capacity(SHADE_RINGS * CIRCLE_SEGMENTS);

    for k in 0..SHADE_RINGS {
        let (r0, r1) = (k as f64 * ring_width, (k + 1) as f64 * ring_width);
        let color = paint.color_at(&at((r0 + r1) / 2.0, 0.0));
        if color.a <= 0.0 {
            continue;
        }
        for s in 0..CIRCLE_SEGMENTS {
            let a0 = s as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
            let a1 = (s + 1) as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
            cells.push((vec![at(r0, a0), at(r1, a0), at(r1, a1), at(r0, a1)], color));
        }
    }
    cells
}

/// Surface is the drawing target of the renderer. Geometry passed to the drawing calls is in the
/// coordinate system set by `set_transform` (drawing units) or in pixels after `reset_transform`.
pub trait Surface {
    /// size returns the pixel dimensions of the surface.
    fn size(&self) -> Viewport;

    fn clear(&mut self);

    fn set_transform(&mut self, transform: &ViewTransform);

    fn reset_transform(&mut self);

    fn fill_rect(&mut self, origin: Point2d, width: f64, height: f64, paint: &Paint);

    fn fill_path(&mut self, path: &Path, paint: &Paint);

    fn stroke_path(&mut self, path: &Path, style: &StrokeStyle);

    fn fill_text(&mut self, text: &str, at: Point2d, font: Font, align: TextAlign, paint: &Paint);

    /// begin_layer marks the start of a layer's draw calls. Backends that do not care may ignore it.
    fn begin_layer(&mut self, _layer: Option<Layer>) {}

    fn end_layer(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_css_colors() {
        assert_eq!(Rgba::parse("#2d3748"), Ok(Rgba::rgb(0x2d, 0x37, 0x48)));
        let c = Rgba::parse("rgba(72, 187, 120, 0.3)").unwrap();
        assert_eq!((c.r, c.g, c.b), (72, 187, 120));
        assert_relative_eq!(c.a, 0.3, epsilon = 1e-6);
        assert!(Rgba::parse("not-a-color").is_err());
    }

    #[test]
    fn color_serializes_as_css_string() {
        let json = serde_json::to_string(&Rgba::rgb(255, 0, 0)).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Rgba = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgba::rgb(255, 0, 0));
    }

    #[test]
    fn linear_gradient_samples_along_axis() {
        let paint = Paint::Linear {
            from: Point2d::new(0.0, 0.0),
            to: Point2d::new(0.0, 100.0),
            stops: vec![
                GradientStop::new(0.0, Rgba::rgb(0, 0, 0)),
                GradientStop::new(1.0, Rgba::rgb(200, 100, 0)),
            ],
        };
        assert_eq!(paint.color_at(&Point2d::new(50.0, 50.0)), Rgba::rgb(100, 50, 0));
        assert_eq!(paint.color_at(&Point2d::new(0.0, 500.0)), Rgba::rgb(200, 100, 0));
        assert_eq!(paint.color_at(&Point2d::new(0.0, -10.0)), Rgba::rgb(0, 0, 0));
    }

    #[test]
    fn radial_gradient_fades_out() {
        let paint = Paint::Radial {
            center: Point2d::ORIGIN,
            inner_radius: 0.0,
            outer_radius: 30.0,
            stops: vec![
                GradientStop::new(0.0, Rgba::WHITE.with_alpha(0.3)),
                GradientStop::new(1.0, Rgba::WHITE.with_alpha(0.0)),
            ],
        };
        assert_relative_eq!(paint.color_at(&Point2d::ORIGIN).a, 0.3);
        assert_relative_eq!(paint.color_at(&Point2d::new(15.0, 0.0)).a, 0.15);
        assert_relative_eq!(paint.color_at(&Point2d::new(40.0, 0.0)).a, 0.0);
    }

    #[test]
    fn flatten_closes_and_curves() {
        let path = Path::new()
            .move_to(Point2d::new(0.0, 0.0))
            .quad_to(Point2d::new(5.0, 0.0), Point2d::new(10.0, 0.0))
            .line_to(Point2d::new(0.0, 0.0));
        let lines = path.flatten();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 1 + QUAD_SEGMENTS + 1);
        assert_eq!(lines[0].last(), Some(&Point2d::new(0.0, 0.0)));
    }

    #[test]
    fn dash_pattern_splits_segment() {
        let line = [Point2d::new(0.0, 0.0), Point2d::new(20.0, 0.0)];
        let pieces = dash_polyline(&line, &[5.0, 5.0]);
        assert_eq!(pieces.len(), 2);
        assert_relative_eq!(pieces[0][1].x, 5.0);
        assert_relative_eq!(pieces[1][0].x, 10.0);
        assert_relative_eq!(pieces[1][1].x, 15.0);
    }

    #[test]
    fn gradient_shapes_split_into_cells() {
        let paint = Paint::Radial {
            center: Point2d::ORIGIN,
            inner_radius: 0.0,
            outer_radius: 30.0,
            stops: vec![
                GradientStop::new(0.0, Rgba::WHITE.with_alpha(0.3)),
                GradientStop::new(1.0, Rgba::WHITE.with_alpha(0.0)),
            ],
        };
        let cells = shade_disc(Point2d::ORIGIN, 30.0, &paint);
        assert_eq!(cells.len(), SHADE_RINGS * CIRCLE_SEGMENTS);
        assert!(cells.iter().all(|(poly, c)| poly.len() == 4 && c.a > 0.0));

        let solid = Paint::Solid(Rgba::WHITE);
        assert_eq!(shade_disc(Point2d::ORIGIN, 5.0, &solid).len(), 1);
        assert_eq!(shade_rect(Point2d::ORIGIN, 10.0, 10.0, &solid).len(), 1);
    }

    #[test]
    fn empty_dash_keeps_polyline() {
        let line = [Point2d::new(0.0, 0.0), Point2d::new(20.0, 0.0)];
        assert_eq!(dash_polyline(&line, &[]), vec![line.to_vec()]);
    }
}
