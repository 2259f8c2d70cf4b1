use crate::core::camera::CameraState;
use crate::core::circuit::Circuit;
use crate::core::renderer::{RenderStats, Renderer};
use crate::core::surface::{
    dash_polyline, shade_disc, shade_rect, Font, Paint, Path, PathCmd, Rgba, StrokeStyle, Surface,
    TextAlign,
};
use crate::core::transform::{ViewTransform, Viewport};
use anyhow::Context;
use helpers::geometry::Point2d;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use tracing::info;

fn to_plotters(c: &Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a)
}

/// PngSurface rasterizes draw calls into a bitmap through plotters. Gradients are approximated by
/// cells of constant color. Drawing errors do not interrupt the frame, the first one is kept and
/// returned by `finish`.
pub struct PngSurface<'a> {
    area: DrawingArea<BitMapBackend<'a>, Shift>,
    size: Viewport,
    transform: Option<ViewTransform>,
    error: Option<anyhow::Error>,
}

impl<'a> PngSurface<'a> {
    pub fn new(filepath: &'a std::path::Path, size: (u32, u32)) -> PngSurface<'a> {
        PngSurface {
            area: BitMapBackend::new(filepath, size).into_drawing_area(),
            size: Viewport::new(size.0 as f64, size.1 as f64),
            transform: None,
            error: None,
        }
    }

    /// finish writes the bitmap to disk.
    pub fn finish(self) -> anyhow::Result<()> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.area
            .present()
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    fn keep_error<E: std::fmt::Display>(&mut self, res: Result<(), E>) {
        if let Err(e) = res {
            if self.error.is_none() {
                self.error = Some(anyhow::anyhow!("{}", e));
            }
        }
    }

    fn px(&self, p: &Point2d) -> (i32, i32) {
        let q = match &self.transform {
            Some(t) => t.apply(p),
            None => *p,
        };
        (q.x.round() as i32, q.y.round() as i32)
    }

    fn scale(&self) -> f64 {
        self.transform.as_ref().map_or(1.0, |t| t.scale())
    }

    fn fill_cells(&mut self, cells: Vec<(Vec<Point2d>, Rgba)>) {
        for (poly, color) in cells {
            let points: Vec<(i32, i32)> = poly.iter().map(|p| self.px(p)).collect();
            let res = self
                .area
                .draw(&Polygon::new(points, to_plotters(&color).filled()));
            self.keep_error(res);
        }
    }
}

impl<'a> Surface for PngSurface<'a> {
    fn size(&self) -> Viewport {
        self.size
    }

    fn clear(&mut self) {
        let res = self.area.fill(&BLACK);
        self.keep_error(res);
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
        if let [PathCmd::Circle { center, radius }] = path.cmds() {
            self.fill_cells(shade_disc(*center, *radius, paint));
            return;
        }
        let color = paint.dominant();
        let cells = path.flatten().into_iter().map(|poly| (poly, color)).collect();
        self.fill_cells(cells);
    }

    fn stroke_path(&mut self, path: &Path, style: &StrokeStyle) {
        let width = (style.width * self.scale()).round().max(1.0) as u32;

        for polyline in path.flatten() {
            for piece in dash_polyline(&polyline, &style.dash) {
                let color = match (piece.first(), piece.last()) {
                    (Some(a), Some(b)) => style.paint.color_at(&a.midpoint(b)),
                    _ => continue,
                };
                let points: Vec<(i32, i32)> = piece.iter().map(|p| self.px(p)).collect();
                let res = self.area.draw(&PathElement::new(
                    points,
                    to_plotters(&color).stroke_width(width),
                ));
                self.keep_error(res);
            }
        }
    }

    fn fill_text(&mut self, text: &str, at: Point2d, font: Font, align: TextAlign, paint: &Paint) {
        let size = (font.size * self.scale()).max(1.0);
        let desc = if font.bold {
            ("sans-serif", size, FontStyle::Bold).into_font()
        } else {
            ("sans-serif", size).into_font()
        };
        let hpos = match align {
            TextAlign::Left => HPos::Left,
            TextAlign::Center => HPos::Center,
            TextAlign::Right => HPos::Right,
        };
        let style = desc
            .color(&to_plotters(&paint.dominant()))
            .pos(Pos::new(hpos, VPos::Bottom));

        let res = self
            .area
            .draw(&Text::new(text.to_owned(), self.px(&at), style));
        self.keep_error(res);
    }
}

/// export_png renders one frame of the circuit into a PNG file.
pub fn export_png(
    filepath: &std::path::Path,
    renderer: &Renderer,
    circuit: &Circuit,
    camera: &CameraState,
    size: (u32, u32),
) -> anyhow::Result<RenderStats> {
    let viewport = Viewport::new(size.0 as f64, size.1 as f64);
    if !viewport.is_ready() {
        anyhow::bail!("Image size {}x{} is empty!", size.0, size.1);
    }

    if let Some(dir) = filepath.parent() {
        std::fs::create_dir_all(dir).context(format!(
            "Failed to create output directory {}!",
            dir.display()
        ))?;
    }

    let mut surface = PngSurface::new(filepath, size);
    let stats = renderer
        .render(&mut surface, circuit, camera, &viewport)
        .ok_or_else(|| anyhow::anyhow!("Viewport {}x{} is not drawable!", size.0, size.1))?;

    surface
        .finish()
        .context(format!("Failed to write image {}!", filepath.display()))?;

    info!(
        "Exported {} to {} ({} elements)",
        circuit.name,
        filepath.display(),
        stats.elements_drawn
    );
    Ok(stats)
}
