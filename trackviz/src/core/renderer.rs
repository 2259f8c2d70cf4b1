use crate::core::camera::{CameraState, Layer};
use crate::core::circuit::{Circuit, Corner, FacilityKind};
use crate::core::style::Theme;
use crate::core::surface::{Font, GradientStop, Paint, Path, StrokeStyle, Surface, TextAlign};
use crate::core::transform::{ViewTransform, Viewport};
use helpers::geometry::{Point2d, Vector2d};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Radius of a corner marker in drawing units, also used for hit-testing.
pub const CORNER_MARKER_RADIUS: f64 = 8.0;
const BANKING_RING_RADIUS: f64 = 12.0;
const SPEED_DOT_RADIUS: f64 = 4.0;
const SPEED_DOT_OFFSET: f64 = 15.0;
const BARRIER_OFFSET: f64 = 15.0;
const LIGHTING_RADIUS: f64 = 400.0;
const GLOW_RADIUS: f64 = 30.0;

/// * `reference_size` - Viewport size (px) at which a zoom of 1.0 maps one drawing unit to one
/// pixel
/// * `world_scale` - Drawing units per track coordinate unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub reference_size: f64,
    pub world_scale: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            reference_size: 1000.0,
            world_scale: 4.0,
        }
    }
}

/// RenderStats is reported per frame for observability only. The background fill is not counted
/// in `elements_drawn`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub fps: u32,
    pub elements_drawn: usize,
    pub corners_drawn: usize,
}

/// Frame wraps the target surface for the duration of one render call and counts the issued
/// drawing elements.
struct Frame<'a, S: Surface> {
    surface: &'a mut S,
    elements: usize,
}

impl<'a, S: Surface> Frame<'a, S> {
    fn fill_rect(&mut self, origin: Point2d, width: f64, height: f64, paint: &Paint) {
        self.surface.fill_rect(origin, width, height, paint);
        self.elements += 1;
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        self.surface.fill_path(path, paint);
        self.elements += 1;
    }

    fn stroke_path(&mut self, path: &Path, style: &StrokeStyle) {
        self.surface.stroke_path(path, style);
        self.elements += 1;
    }

    fn fill_text(&mut self, text: &str, at: Point2d, font: Font, align: TextAlign, paint: &Paint) {
        self.surface.fill_text(text, at, font, align, paint);
        self.elements += 1;
    }
}

/// Renderer draws a circuit onto a `Surface`. It holds no per-frame state, every call fully redraws
/// the surface from the inserted circuit and camera.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    theme: Theme,
}

impl Renderer {
    pub fn new(config: &RenderConfig, theme: Theme) -> Renderer {
        Renderer {
            config: *config,
            theme,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn transform(&self, camera: &CameraState, viewport: &Viewport) -> Option<ViewTransform> {
        ViewTransform::new(camera, viewport, self.config.reference_size)
    }

    fn world(&self, x: f64, y: f64) -> Point2d {
        Point2d::new(x * self.config.world_scale, y * self.config.world_scale)
    }

    /// render clears the surface and draws all visible layers in their fixed order. It returns
    /// None without touching the surface if the viewport is not ready yet.
    pub fn render<S: Surface>(
        &self,
        surface: &mut S,
        circuit: &Circuit,
        camera: &CameraState,
        viewport: &Viewport,
    ) -> Option<RenderStats> {
        let transform = self.transform(camera, viewport)?;
        let mut frame = Frame {
            surface,
            elements: 0,
        };

        self.draw_background(&mut frame, viewport);

        if circuit.corners.is_empty() {
            debug!("Circuit {} has no corners, drawing background only", circuit.id);
            return Some(RenderStats {
                fps: 0,
                elements_drawn: frame.elements,
                corners_drawn: 0,
            });
        }

        frame.surface.set_transform(&transform);

        let mut corners_drawn = 0;
        let layers = &camera.layers;

        // later layers must sit on top of earlier ones
        for layer in [
            Layer::Track,
            Layer::Barriers,
            Layer::Elevation,
            Layer::DrsZones,
            Layer::Sectors,
            Layer::Corners,
            Layer::Facilities,
            Layer::Lighting,
        ] {
            if !layers.is_visible(layer) {
                continue;
            }
            frame.surface.begin_layer(Some(layer));
            match layer {
                Layer::Track => self.draw_track(&mut frame, circuit),
                Layer::Barriers => self.draw_barriers(&mut frame, circuit),
                Layer::Elevation => self.draw_elevation(&mut frame, circuit),
                Layer::DrsZones => self.draw_drs_zones(&mut frame, circuit),
                Layer::Sectors => self.draw_sectors(&mut frame, circuit),
                Layer::Corners => corners_drawn = self.draw_corners(&mut frame, circuit),
                Layer::Facilities => self.draw_facilities(&mut frame, circuit),
                Layer::Lighting => self.draw_lighting(&mut frame, circuit),
            }
            frame.surface.end_layer();
        }

        frame.surface.reset_transform();

        Some(RenderStats {
            fps: 0,
            elements_drawn: frame.elements,
            corners_drawn,
        })
    }

    /// render_placeholder draws the background and a centered message, used while no circuit is
    /// available.
    pub fn render_placeholder<S: Surface>(
        &self,
        surface: &mut S,
        viewport: &Viewport,
        message: &str,
    ) -> Option<RenderStats> {
        if !viewport.is_ready() {
            return None;
        }
        let mut frame = Frame {
            surface,
            elements: 0,
        };
        self.draw_background(&mut frame, viewport);
        frame.fill_text(
            message,
            viewport.center(),
            Font::regular(16.0),
            TextAlign::Center,
            &Paint::Solid(self.theme.label),
        );

        Some(RenderStats {
            fps: 0,
            elements_drawn: frame.elements,
            corners_drawn: 0,
        })
    }

    /// hit_test returns the first corner (in track order) whose marker contains the pointer
    /// position given in surface pixels.
    pub fn hit_test<'a>(
        &self,
        circuit: &'a Circuit,
        camera: &CameraState,
        viewport: &Viewport,
        pointer: &Point2d,
    ) -> Option<&'a Corner> {
        if !camera.layers.is_visible(Layer::Corners) || !pointer.is_finite() {
            return None;
        }
        let transform = self.transform(camera, viewport)?;
        let local = transform.invert(pointer);

        circuit
            .corners
            .iter()
            .find(|c| self.world(c.x, c.y).dist(&local) <= CORNER_MARKER_RADIUS)
    }

    /// screen_position returns the surface pixel position of a corner marker center.
    pub fn screen_position(
        &self,
        corner: &Corner,
        camera: &CameraState,
        viewport: &Viewport,
    ) -> Option<Point2d> {
        let transform = self.transform(camera, viewport)?;
        Some(transform.apply(&self.world(corner.x, corner.y)))
    }

    // LAYERS --------------------------------------------------------------------------------------
    fn draw_background<S: Surface>(&self, frame: &mut Frame<S>, viewport: &Viewport) {
        frame.surface.clear();
        frame.surface.reset_transform();
        frame.surface.begin_layer(None);
        let paint = Paint::Linear {
            from: Point2d::ORIGIN,
            to: Point2d::new(0.0, viewport.height),
            stops: vec![
                GradientStop::new(0.0, self.theme.background_top),
                GradientStop::new(1.0, self.theme.background_bottom),
            ],
        };
        frame
            .surface
            .fill_rect(Point2d::ORIGIN, viewport.width, viewport.height, &paint);
        frame.surface.end_layer();
    }

    /// track_path builds the closed track outline: quadratic curves through all corners with the
    /// midpoint of each segment as control point, then a straight line back to the first corner.
    fn track_path(&self, circuit: &Circuit) -> Option<Path> {
        let points: Vec<Point2d> = circuit
            .corners
            .iter()
            .map(|c| self.world(c.x, c.y))
            .filter(|p| p.is_finite())
            .collect();

        if points.len() < 2 {
            return None;
        }

        let mut path = Path::new().move_to(points[0]);
        for pair in points.windows(2) {
            path = path.quad_to(pair[0].midpoint(&pair[1]), pair[1]);
        }
        Some(path.line_to(points[0]))
    }

    fn draw_track<S: Surface>(&self, frame: &mut Frame<S>, circuit: &Circuit) {
        let path = match self.track_path(circuit) {
            Some(path) => path,
            None => {
                debug!("Circuit {} has fewer than two drawable corners, no track surface", circuit.id);
                return;
            }
        };

        // all four strokes share the same path
        frame.stroke_path(&path, &StrokeStyle::solid(self.theme.track_bed, 12.0));
        frame.stroke_path(&path, &StrokeStyle::solid(self.theme.track_surface, 8.0));
        frame.stroke_path(
            &path,
            &StrokeStyle::solid(self.theme.racing_line, 2.0).dashed(&[5.0, 5.0]),
        );
        frame.stroke_path(&path, &StrokeStyle::solid(self.theme.track_boundary, 1.0));
    }

    fn draw_barriers<S: Surface>(&self, frame: &mut Frame<S>, circuit: &Circuit) {
        let style = StrokeStyle::solid(self.theme.barrier, 3.0);
        let no_corners = circuit.corners.len();

        for (i, corner) in circuit.corners.iter().enumerate() {
            let next = &circuit.corners[(i + 1) % no_corners];
            let a = self.world(corner.x, corner.y);
            let b = self.world(next.x, next.y);

            let normal = match b.as_vector2d().sub(&a.as_vector2d()).normalized() {
                Some(dir) if a.is_finite() && b.is_finite() => dir.perpendicular(),
                _ => {
                    debug!("Skipping barrier after corner {} (degenerate segment)", corner.number);
                    continue;
                }
            };
            let offset = normal.mult(BARRIER_OFFSET);
            let inv_offset = offset.mult(-1.0);

            frame.stroke_path(&Path::segment(a.offset(&offset), b.offset(&offset)), &style);
            frame.stroke_path(&Path::segment(a.offset(&inv_offset), b.offset(&inv_offset)), &style);
        }
    }

    fn draw_elevation<S: Surface>(&self, frame: &mut Frame<S>, circuit: &Circuit) {
        for corner in circuit.corners.iter() {
            let p = self.world(corner.x, corner.y);
            if !p.is_finite() || !corner.z.is_finite() {
                debug!("Skipping elevation marker of corner {}", corner.number);
                continue;
            }
            let z = corner.z;

            frame.fill_path(
                &Path::new().circle(p, z.abs() * 0.5 + 3.0),
                &Paint::Solid(self.theme.elevation_color(z)),
            );

            if z.abs() > 5.0 {
                let text = if z > 0.0 {
                    format!("+{}m", z)
                } else {
                    format!("{}m", z)
                };
                frame.fill_text(
                    &text,
                    p.offset(&Vector2d::new(0.0, -15.0)),
                    Font::regular(10.0),
                    TextAlign::Center,
                    &Paint::Solid(self.theme.label),
                );
            }
        }
    }

    fn draw_drs_zones<S: Surface>(&self, frame: &mut Frame<S>, circuit: &Circuit) {
        for zone in circuit.drs_zones.iter() {
            let (start_idx, end_idx) = match circuit.resolve_drs_zone(zone) {
                Some(idxs) => idxs,
                None => {
                    debug!(
                        "Skipping DRS zone {} of circuit {} (corner reference out of range)",
                        zone.number, circuit.id
                    );
                    continue;
                }
            };
            let start_corner = &circuit.corners[start_idx];
            let end_corner = &circuit.corners[end_idx];
            let start = self.world(start_corner.x, start_corner.y);
            let end = self.world(end_corner.x, end_corner.y);
            if !start.is_finite() || !end.is_finite() {
                continue;
            }

            let style = StrokeStyle {
                paint: Paint::Linear {
                    from: start,
                    to: end,
                    stops: vec![
                        GradientStop::new(0.0, self.theme.drs.with_alpha(0.3)),
                        GradientStop::new(1.0, self.theme.drs.with_alpha(0.7)),
                    ],
                },
                width: 8.0,
                dash: vec![10.0, 5.0],
            };
            frame.stroke_path(&Path::segment(start, end), &style);
            frame.fill_text(
                &format!("DRS {}", zone.number),
                start.midpoint(&end),
                Font::bold(12.0),
                TextAlign::Center,
                &Paint::Solid(self.theme.drs_label),
            );
        }
    }

    /// draw_sectors draws a schematic legend of horizontal lines, not the spatial sector borders.
    fn draw_sectors<S: Surface>(&self, frame: &mut Frame<S>, circuit: &Circuit) {
        for (i, sector) in circuit.sectors.iter().enumerate() {
            let color = self.theme.sector_color(i);
            let y = -200.0 + 60.0 * i as f64;

            frame.stroke_path(
                &Path::segment(Point2d::new(-300.0, y), Point2d::new(300.0, y)),
                &StrokeStyle::solid(color, 3.0).dashed(&[15.0, 10.0]),
            );
            frame.fill_text(
                &format!("Sector {}", sector.number),
                Point2d::new(-290.0, y - 5.0),
                Font::bold(14.0),
                TextAlign::Left,
                &Paint::Solid(color),
            );
            frame.fill_text(
                &sector.length,
                Point2d::new(-290.0, y + 10.0),
                Font::regular(10.0),
                TextAlign::Left,
                &Paint::Solid(color),
            );
        }
    }

    fn draw_corners<S: Surface>(&self, frame: &mut Frame<S>, circuit: &Circuit) -> usize {
        let mut no_drawn = 0;

        for corner in circuit.corners.iter() {
            let p = self.world(corner.x, corner.y);
            if !p.is_finite() {
                debug!("Skipping marker of corner {} (non-finite position)", corner.number);
                continue;
            }

            frame.fill_path(
                &Path::new().circle(p, CORNER_MARKER_RADIUS),
                &Paint::Solid(self.theme.corner_color(corner.kind)),
            );
            frame.fill_text(
                &corner.number.to_string(),
                p.offset(&Vector2d::new(0.0, 4.0)),
                Font::bold(12.0),
                TextAlign::Center,
                &Paint::Solid(self.theme.label),
            );

            if corner.banking != 0.0 && corner.banking.is_finite() {
                frame.stroke_path(
                    &Path::new().circle(p, BANKING_RING_RADIUS),
                    &StrokeStyle::solid(self.theme.banking_color(corner.banking), 2.0),
                );
            }

            frame.fill_path(
                &Path::new().circle(
                    p.offset(&Vector2d::new(SPEED_DOT_OFFSET, -SPEED_DOT_OFFSET)),
                    SPEED_DOT_RADIUS,
                ),
                &Paint::Solid(self.theme.speed_color(corner.speed)),
            );

            no_drawn += 1;
        }

        no_drawn
    }

    fn draw_facilities<S: Surface>(&self, frame: &mut Frame<S>, circuit: &Circuit) {
        for facility in circuit.facilities.iter() {
            let p = self.world(facility.x, facility.y);
            if !p.is_finite() {
                debug!("Skipping facility {} (non-finite position)", facility.name);
                continue;
            }
            let paint = Paint::Solid(self.theme.facility_color(facility.kind));

            match facility.kind {
                FacilityKind::Grandstand => {
                    frame.fill_rect(Point2d::new(p.x - 8.0, p.y - 4.0), 16.0, 8.0, &paint)
                }
                FacilityKind::Pit => frame.fill_path(&Path::new().circle(p, 6.0), &paint),
                _ => frame.fill_rect(Point2d::new(p.x - 4.0, p.y - 4.0), 8.0, 8.0, &paint),
            }

            frame.fill_text(
                &facility.kind.to_string().to_uppercase(),
                p.offset(&Vector2d::new(0.0, 20.0)),
                Font::regular(8.0),
                TextAlign::Center,
                &Paint::Solid(self.theme.label),
            );
        }
    }

    fn draw_lighting<S: Surface>(&self, frame: &mut Frame<S>, circuit: &Circuit) {
        let ambient = Paint::Radial {
            center: Point2d::ORIGIN,
            inner_radius: 0.0,
            outer_radius: LIGHTING_RADIUS,
            stops: vec![
                GradientStop::new(0.0, self.theme.light.with_alpha(0.1)),
                GradientStop::new(1.0, self.theme.light.with_alpha(0.0)),
            ],
        };
        frame.fill_rect(
            Point2d::new(-LIGHTING_RADIUS, -LIGHTING_RADIUS),
            2.0 * LIGHTING_RADIUS,
            2.0 * LIGHTING_RADIUS,
            &ambient,
        );

        for corner in circuit.corners.iter().step_by(3) {
            let p = self.world(corner.x, corner.y);
            if !p.is_finite() {
                continue;
            }
            let glow = Paint::Radial {
                center: p,
                inner_radius: 0.0,
                outer_radius: GLOW_RADIUS,
                stops: vec![
                    GradientStop::new(0.0, self.theme.light.with_alpha(0.3)),
                    GradientStop::new(1.0, self.theme.light.with_alpha(0.0)),
                ],
            };
            frame.fill_path(&Path::new().circle(p, GLOW_RADIUS), &glow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::LayerSet;
    use crate::core::circuit::fixtures::{circuit, corner, monaco_like};
    use crate::core::circuit::DrsZone;
    use crate::post::recording::{DrawCall, RecordingSurface};
    use approx::assert_relative_eq;

    fn renderer() -> Renderer {
        Renderer::new(&RenderConfig::default(), Theme::default())
    }

    fn viewport() -> Viewport {
        Viewport::new(1200.0, 800.0)
    }

    fn render(circuit: &Circuit, camera: &CameraState) -> (RecordingSurface, RenderStats) {
        let mut surface = RecordingSurface::new(viewport());
        let stats = renderer()
            .render(&mut surface, circuit, camera, &viewport())
            .unwrap();
        (surface, stats)
    }

    #[test]
    fn monaco_scenario_draws_expected_layers() {
        let circuit = monaco_like();
        let mut camera = CameraState::default();
        camera.layers = LayerSet::only(&[Layer::Track, Layer::Corners, Layer::DrsZones]);

        let (surface, stats) = render(&circuit, &camera);

        assert_eq!(stats.corners_drawn, 19);
        let markers = surface
            .calls_in(Some(Layer::Corners))
            .filter(|c| {
                matches!(c, DrawCall::FillPath { radius: Some(r), .. } if *r == CORNER_MARKER_RADIUS)
            })
            .count();
        assert_eq!(markers, 19);

        let drs_segments: Vec<&DrawCall> = surface
            .calls_in(Some(Layer::DrsZones))
            .filter(|c| matches!(c, DrawCall::StrokePath { .. }))
            .collect();
        assert_eq!(drs_segments.len(), 1);
        let world = |c: &Corner| Point2d::new(c.x * 4.0, c.y * 4.0);
        match drs_segments[0] {
            DrawCall::StrokePath { points, .. } => {
                assert_eq!(points.first(), Some(&world(&circuit.corners[18])));
                assert_eq!(points.last(), Some(&world(&circuit.corners[0])));
            }
            _ => unreachable!(),
        }

        for layer in [Layer::Facilities, Layer::Elevation, Layer::Sectors, Layer::Barriers, Layer::Lighting] {
            assert_eq!(surface.count_in(Some(layer)), 0, "{}", layer);
        }
        assert_eq!(
            surface
                .calls_in(Some(Layer::Track))
                .filter(|c| matches!(c, DrawCall::StrokePath { .. }))
                .count(),
            4
        );
    }

    #[test]
    fn hiding_facilities_leaves_other_layers_untouched() {
        let circuit = monaco_like();
        let all = CameraState::default();
        let mut no_facilities = CameraState::default();
        no_facilities.toggle_layer(Layer::Facilities);

        let (full, _) = render(&circuit, &all);
        let (reduced, _) = render(&circuit, &no_facilities);

        assert!(full.count_in(Some(Layer::Facilities)) > 0);
        assert_eq!(reduced.count_in(Some(Layer::Facilities)), 0);

        let without = |s: &RecordingSurface| -> Vec<String> {
            s.calls()
                .iter()
                .filter(|c| c.layer != Some(Layer::Facilities))
                .map(|c| serde_json::to_string(c).unwrap())
                .collect()
        };
        assert_eq!(without(&full), without(&reduced));
    }

    fn layer_sequence(surface: &RecordingSurface) -> Vec<Option<Layer>> {
        let mut seq: Vec<Option<Layer>> = Vec::new();
        for c in surface.calls() {
            if seq.last() != Some(&c.layer) {
                seq.push(c.layer);
            }
        }
        seq
    }

    #[test]
    fn hidden_layer_keeps_order_of_the_rest() {
        let circuit = monaco_like();
        let mut camera = CameraState::default();
        camera.toggle_layer(Layer::Sectors);

        let (surface, _) = render(&circuit, &camera);
        assert_eq!(surface.count_in(Some(Layer::Sectors)), 0);
        assert_eq!(
            layer_sequence(&surface),
            vec![
                None,
                Some(Layer::Track),
                Some(Layer::Barriers),
                Some(Layer::Elevation),
                Some(Layer::DrsZones),
                Some(Layer::Corners),
                Some(Layer::Facilities),
                Some(Layer::Lighting),
            ]
        );

        camera.toggle_layer(Layer::Sectors);
        camera.toggle_layer(Layer::Barriers);
        let (surface, _) = render(&circuit, &camera);
        let seq = layer_sequence(&surface);
        assert!(!seq.contains(&Some(Layer::Barriers)));
        let pos = |layer| seq.iter().position(|l| *l == Some(layer)).unwrap();
        assert!(pos(Layer::Track) < pos(Layer::Elevation));
        assert!(pos(Layer::DrsZones) < pos(Layer::Sectors));
        assert!(pos(Layer::Sectors) < pos(Layer::Corners));
    }

    #[test]
    fn single_corner_draws_marker_but_no_track() {
        let circuit = circuit(vec![corner(1, 10.0, 10.0)]);
        let (surface, stats) = render(&circuit, &CameraState::default());

        assert_eq!(stats.corners_drawn, 1);
        assert_eq!(surface.count_in(Some(Layer::Track)), 0);
        assert_eq!(surface.count_in(None), 1);
        // the lone corner's barrier segment has zero length
        assert_eq!(surface.count_in(Some(Layer::Barriers)), 0);
    }

    #[test]
    fn empty_circuit_draws_background_only() {
        let circuit = circuit(Vec::new());
        let (surface, stats) = render(&circuit, &CameraState::default());
        assert_eq!(stats.elements_drawn, 0);
        assert_eq!(stats.corners_drawn, 0);
        assert_eq!(surface.calls().len(), 1);
        assert_eq!(surface.count_in(None), 1);
    }

    #[test]
    fn unready_viewport_skips_the_frame() {
        let circuit = monaco_like();
        let mut surface = RecordingSurface::new(Viewport::new(0.0, 0.0));
        let stats = renderer().render(
            &mut surface,
            &circuit,
            &CameraState::default(),
            &Viewport::new(0.0, 480.0),
        );
        assert!(stats.is_none());
        assert!(surface.calls().is_empty());
        assert_eq!(surface.clears(), 0);
    }

    #[test]
    fn out_of_range_drs_zone_is_skipped() {
        let mut circuit = monaco_like();
        circuit.drs_zones.push(DrsZone {
            number: 2,
            start: 40,
            end: 2,
            length: 300.0,
            detection: 1,
        });
        let mut camera = CameraState::default();
        camera.layers = LayerSet::only(&[Layer::DrsZones, Layer::Corners]);

        let (surface, stats) = render(&circuit, &camera);
        let texts: Vec<&DrawCall> = surface
            .calls_in(Some(Layer::DrsZones))
            .filter(|c| matches!(c, DrawCall::FillText { .. }))
            .collect();
        assert_eq!(texts.len(), 1);
        assert_eq!(stats.corners_drawn, 19);
    }

    #[test]
    fn elements_are_counted_for_every_valid_circuit() {
        for n in 1..6 {
            let corners = (1..=n).map(|i| corner(i, i as f64 * 7.0, -(i as f64) * 3.0)).collect();
            let (surface, stats) = render(&circuit(corners), &CameraState::default());
            // every recorded call except the background fill
            assert_eq!(stats.elements_drawn, surface.calls().len() - 1);
            assert_eq!(stats.corners_drawn, n as usize);
        }
    }

    #[test]
    fn hit_test_round_trips_through_transform() {
        let circuit = monaco_like();
        let renderer = renderer();
        let mut camera = CameraState::default();
        camera.set_rotation(63.5);
        camera.set_zoom_level(2.4);
        camera.pan_by(25.0, -40.0);

        for corner in circuit.corners.iter() {
            let screen = renderer.screen_position(corner, &camera, &viewport()).unwrap();
            let transform = renderer.transform(&camera, &viewport()).unwrap();
            let back = transform.invert(&screen);
            assert_relative_eq!(back.x, corner.x * 4.0, epsilon = 1e-9);
            assert_relative_eq!(back.y, corner.y * 4.0, epsilon = 1e-9);

            let hit = renderer.hit_test(&circuit, &camera, &viewport(), &screen);
            assert_eq!(hit.map(|c| c.number), Some(corner.number));
        }
    }

    #[test]
    fn hit_test_prefers_first_corner_in_track_order() {
        let circuit = circuit(vec![corner(1, 0.0, 0.0), corner(2, 1.0, 0.0), corner(3, 100.0, 0.0)]);
        let renderer = renderer();
        let camera = CameraState::default();
        let pointer = renderer
            .screen_position(&circuit.corners[1], &camera, &viewport())
            .unwrap();
        assert_eq!(
            renderer.hit_test(&circuit, &camera, &viewport(), &pointer).map(|c| c.number),
            Some(1)
        );
    }

    #[test]
    fn hit_test_misses_outside_markers_and_hidden_layer() {
        let circuit = monaco_like();
        let renderer = renderer();
        let mut camera = CameraState::default();
        let far = Point2d::new(1.0, 1.0);
        assert!(renderer.hit_test(&circuit, &camera, &viewport(), &far).is_none());

        let on_marker = renderer
            .screen_position(&circuit.corners[0], &camera, &viewport())
            .unwrap();
        camera.toggle_layer(Layer::Corners);
        assert!(renderer.hit_test(&circuit, &camera, &viewport(), &on_marker).is_none());
    }

    #[test]
    fn placeholder_draws_message() {
        let mut surface = RecordingSurface::new(viewport());
        let stats = renderer()
            .render_placeholder(&mut surface, &viewport(), "Loading circuit...")
            .unwrap();
        assert_eq!(stats.elements_drawn, 1);
        assert!(surface
            .calls()
            .iter()
            .any(|c| matches!(&c.call, DrawCall::FillText { text, .. } if text == "Loading circuit...")));
    }
}
