use eframe::egui;
use helpers::geometry::Point2d;
use trackviz::core::surface::{
    dash_polyline, shade_disc, shade_rect, Font, Paint, Path, PathCmd, Rgba, StrokeStyle, Surface,
    TextAlign,
};
use trackviz::core::transform::{ViewTransform, Viewport};

pub fn to_color32(c: &Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (c.a * 255.0).round() as u8)
}

/// text_style maps a font size in pixels onto the closest egui text style.
fn text_style(size: f64) -> egui::TextStyle {
    if size < 11.0 {
        egui::TextStyle::Small
    } else if size < 18.0 {
        egui::TextStyle::Body
    } else {
        egui::TextStyle::Heading
    }
}

/// EguiSurface collects egui shapes for one frame. Coordinates are surface-local pixels, shifted to
/// the canvas rectangle when converted to shapes.
pub struct EguiSurface<'a> {
    fonts: &'a egui::epaint::text::Fonts,
    rect: egui::Rect,
    transform: Option<ViewTransform>,
    shapes: Vec<egui::Shape>,
}

impl<'a> EguiSurface<'a> {
    pub fn new(fonts: &'a egui::epaint::text::Fonts, rect: egui::Rect) -> EguiSurface<'a> {
        EguiSurface {
            fonts,
            rect,
            transform: None,
            shapes: Vec::new(),
        }
    }

    pub fn into_shapes(self) -> Vec<egui::Shape> {
        self.shapes
    }

    fn pos(&self, p: &Point2d) -> egui::Pos2 {
        let q = match &self.transform {
            Some(t) => t.apply(p),
            None => *p,
        };
        egui::Pos2::new(self.rect.min.x + q.x as f32, self.rect.min.y + q.y as f32)
    }

    fn scale(&self) -> f64 {
        self.transform.as_ref().map_or(1.0, |t| t.scale())
    }

    fn fill_cells(&mut self, cells: Vec<(Vec<Point2d>, Rgba)>) {
        for (poly, color) in cells {
            let points: Vec<egui::Pos2> = poly.iter().map(|p| self.pos(p)).collect();
            self.shapes.push(egui::Shape::convex_polygon(
                points,
                to_color32(&color),
                egui::Stroke::none(),
            ));
        }
    }
}

impl<'a> Surface for EguiSurface<'a> {
    fn size(&self) -> Viewport {
        Viewport::new(self.rect.width() as f64, self.rect.height() as f64)
    }

    fn clear(&mut self) {
        self.shapes.clear();
    }

    fn set_transform(&mut self, transform: &ViewTransform) {
        self.transform = Some(*transform);
    }

    fn reset_transform(&mut self) {
        self.transform = None;
    }

    fn fill_rect(&mut self, origin: Point2d, width: f64, height: f64, paint: &Paint) {
        self.fill_cells(shade_rect(origin, width, height, paint));
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        match (path.cmds(), paint) {
            // rotation keeps circles round, so solid discs map onto the native circle shape
            ([PathCmd::Circle { center, radius }], Paint::Solid(color)) => {
                let radius = (radius * self.scale()) as f32;
                self.shapes
                    .push(egui::Shape::circle_filled(self.pos(center), radius, to_color32(color)));
            }
            ([PathCmd::Circle { center, radius }], _) => {
                self.fill_cells(shade_disc(*center, *radius, paint));
            }
            _ => {
                let color = paint.dominant();
                let cells = path.flatten().into_iter().map(|poly| (poly, color)).collect();
                self.fill_cells(cells);
            }
        }
    }

    fn stroke_path(&mut self, path: &Path, style: &StrokeStyle) {
        let width = (style.width * self.scale()) as f32;

        for polyline in path.flatten() {
            for piece in dash_polyline(&polyline, &style.dash) {
                let color = match (piece.first(), piece.last()) {
                    (Some(a), Some(b)) => style.paint.color_at(&a.midpoint(b)),
                    _ => continue,
                };
                let points: Vec<egui::Pos2> = piece.iter().map(|p| self.pos(p)).collect();
                self.shapes.push(egui::Shape::line(
                    points,
                    egui::Stroke::new(width, to_color32(&color)),
                ));
            }
        }
    }

    fn fill_text(&mut self, text: &str, at: Point2d, font: Font, align: TextAlign, paint: &Paint) {
        let anchor = match align {
            TextAlign::Left => egui::Align2::LEFT_BOTTOM,
            TextAlign::Center => egui::Align2::CENTER_BOTTOM,
            TextAlign::Right => egui::Align2::RIGHT_BOTTOM,
        };
        let style = if font.bold && font.size * self.scale() >= 14.0 {
            egui::TextStyle::Heading
        } else {
            text_style(font.size * self.scale())
        };

        self.shapes.push(egui::Shape::text(
            self.fonts,
            self.pos(&at),
            anchor,
            text,
            style,
            to_color32(&paint.dominant()),
        ));
    }
}
