use crate::core::egui_surface::{to_color32, EguiSurface};
use crate::interfaces::trackviz_interface::{RepaintScheduler, TrackvizInterface};
use eframe::{egui, epi};
use helpers::buffer::RingBuffer;
use helpers::geometry::Point2d;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use trackviz::core::camera::{Layer, ViewMode};
use trackviz::core::circuit::Circuit;
use trackviz::core::surface::Rgba;
use trackviz::core::transform::Viewport;
use trackviz::interfaces::loader_interface::LoadEvent;
use trackviz::interfaces::view_interface::{CircuitStatus, PerformanceStatus, ViewSession};
use trackviz::pre::catalog::CircuitSource;
use trackviz::pre::image_resolver::ImageResolver;
use trackviz::pre::read_viewer_config::ViewerConfig;

const COLOR_OK: Rgba = Rgba::rgb(0x48, 0xbb, 0x78);
const COLOR_DEGRADED: Rgba = Rgba::rgb(0xf5, 0x65, 0x65);
const COLOR_MEASURING: Rgba = Rgba::rgb(0xa0, 0xae, 0xc0);

pub struct TrackViewer {
    pub session: ViewSession<RepaintScheduler>,
    pub trackviz_interface: TrackvizInterface,
    pub circuit_ids: Vec<String>,
    pub circuit_id: String,
    pub images: ImageResolver,
    pub circuit_image: Option<String>,
    pub t_start: Instant,
    pub prev_update: Instant,
    pub prev_update_durations: RingBuffer<u32>,
}

impl TrackViewer {
    pub fn new(
        config: &ViewerConfig,
        source: Arc<dyn CircuitSource + Send + Sync>,
        circuit_id: &str,
        play: bool,
    ) -> TrackViewer {
        let trackviz_interface = TrackvizInterface::new(source);
        let circuit_ids = trackviz_interface.ids();

        let mut viewer = TrackViewer {
            session: ViewSession::new(config, RepaintScheduler::new()),
            trackviz_interface,
            circuit_ids,
            circuit_id: circuit_id.to_owned(),
            images: ImageResolver::from_config(&config.images),
            circuit_image: None,
            t_start: Instant::now(),
            prev_update: Instant::now(),
            prev_update_durations: RingBuffer::new(30),
        };

        viewer.load(circuit_id);
        if play {
            viewer.session.play();
        }
        viewer
    }

    fn load(&mut self, id: &str) {
        info!("Loading circuit {}", id);
        self.circuit_id = id.to_owned();
        self.circuit_image = None;
        self.session.begin_loading();
        if let Some(event) = self.trackviz_interface.load(id) {
            self.session.apply_load(event);
        }
    }

    fn on_load_event(&mut self, event: LoadEvent) {
        if let LoadEvent::Loaded(circuit) = &event {
            self.circuit_image = Some(self.images.resolve(&circuit.name));
        }
        self.session.apply_load(event);
    }

    // CONTROL PANEL -------------------------------------------------------------------------------
    fn controls_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Circuit");
        let mut requested = None;
        for id in self.circuit_ids.iter() {
            if ui.selectable_label(*id == self.circuit_id, id).clicked() && *id != self.circuit_id {
                requested = Some(id.clone());
            }
        }
        if let Some(id) = requested {
            self.load(&id);
        }

        ui.separator();
        ui.heading("Camera");
        ui.horizontal(|ui| {
            if ui.button("Zoom -").clicked() {
                self.session.zoom_out();
            }
            ui.label(format!("{:.1}x", self.session.camera().zoom()));
            if ui.button("Zoom +").clicked() {
                self.session.zoom_in();
            }
        });
        ui.horizontal(|ui| {
            let play_label = if self.session.is_playing() {
                "Pause"
            } else {
                "Play"
            };
            if ui.button(play_label).clicked() {
                self.session.toggle_rotation();
            }
            if ui.button("Reset").clicked() {
                self.session.reset_camera();
            }
        });
        ui.label(format!("Rotation: {:.1}°", self.session.camera().rotation()));

        ui.separator();
        ui.heading("Presets");
        let mut preset = None;
        for (i, p) in self.session.presets().iter().enumerate() {
            if ui.button(&p.name).clicked() {
                preset = Some(i);
            }
        }
        if let Some(i) = preset {
            self.session.apply_preset(i);
        }

        ui.separator();
        ui.heading("View mode");
        let mut mode = self.session.camera().view_mode;
        for m in ViewMode::ALL {
            ui.radio_value(&mut mode, m, m.to_string());
        }
        if mode != self.session.camera().view_mode {
            self.session.set_view_mode(mode);
        }

        ui.separator();
        ui.heading("Layers");
        for layer in Layer::ALL {
            let mut visible = self.session.camera().layers.is_visible(layer);
            if ui.checkbox(&mut visible, layer.label()).changed() {
                self.session.toggle_layer(layer);
            }
        }

        ui.separator();
        self.performance_ui(ui);
    }

    fn performance_ui(&self, ui: &mut egui::Ui) {
        let (color, text) = match self.session.performance() {
            PerformanceStatus::Measuring => (COLOR_MEASURING, "measuring"),
            PerformanceStatus::Ok => (COLOR_OK, "good"),
            PerformanceStatus::Degraded => (COLOR_DEGRADED, "degraded"),
        };
        ui.horizontal(|ui| {
            if self.session.is_playing() {
                ui.label(format!("FPS: {}", self.session.fps()));
            } else {
                ui.label(format!("FPS: {} (paused)", self.session.fps()));
            }
            ui.colored_label(to_color32(&color), format!("● {}", text));
        });

        if let Some(avg) = self.prev_update_durations.get_avg() {
            if avg > 0.0 {
                ui.add(
                    egui::Label::new(format!("GUI update frequency: {:.0} Hz", 1000.0 / avg))
                        .small(),
                );
            }
        }
        if let Some(stats) = self.session.last_stats() {
            ui.add(
                egui::Label::new(format!(
                    "{} elements, {} corners",
                    stats.elements_drawn, stats.corners_drawn
                ))
                .small(),
            );
        }
    }

    // INFO PANELS ---------------------------------------------------------------------------------
    fn circuit_info_ui(&self, ui: &mut egui::Ui) {
        match self.session.status() {
            CircuitStatus::Loading => {
                ui.label(format!("Loading {}...", self.circuit_id));
            }
            CircuitStatus::Unavailable(reason) => {
                ui.colored_label(to_color32(&COLOR_DEGRADED), format!("Unavailable: {}", reason));
            }
            CircuitStatus::Ready(circuit) => {
                ui.horizontal_wrapped(|ui| {
                    ui.heading(format!("{} {}", circuit.flag, circuit.name));
                    ui.label(&circuit.location);
                    ui.separator();
                    ui.label(format!("Length {}", circuit.length));
                    ui.label(format!("{} corners", circuit.corner_count));
                    ui.label(format!("{} DRS zones", circuit.drs_zone_count));
                    ui.separator();
                    ui.label(format!(
                        "Lap record {} ({})",
                        circuit.lap_record.time, circuit.lap_record.holder
                    ));
                    ui.label(format!("First GP {}", circuit.first_gp));
                    ui.label(circuit.kind.to_string());
                    ui.label(format!("Difficulty: {}", circuit.difficulty));
                    if let Some(url) = &self.circuit_image {
                        ui.hyperlink_to("Photo", url);
                    }
                });
            }
        }
    }

    fn technical_ui(circuit: &Circuit, ui: &mut egui::Ui) {
        ui.heading("Technical specification");

        let mut text = String::new();
        let _ = writeln!(text, "Elevation: {:.0}m - {:.0}m", circuit.elevation.min, circuit.elevation.max);
        let _ = writeln!(text, "Elevation change: {:.0}m", circuit.elevation.change);
        let banked = circuit.corners.iter().filter(|c| c.banking != 0.0).count();
        let _ = writeln!(text, "Banked corners: {}", banked);
        ui.label(text);

        ui.separator();
        ui.add(egui::Label::new("Sectors").strong());
        egui::Grid::new("sectors").striped(true).show(ui, |ui| {
            for sector in circuit.sectors.iter() {
                ui.label(format!("S{}", sector.number));
                ui.label(format!("T{}-T{}", sector.start, sector.end));
                ui.label(&sector.length);
                ui.label(sector.tags.join(", "));
                ui.end_row();
            }
        });

        ui.separator();
        ui.add(egui::Label::new("DRS zones").strong());
        egui::Grid::new("drs_zones").striped(true).show(ui, |ui| {
            for zone in circuit.drs_zones.iter() {
                ui.label(format!("DRS {}", zone.number));
                ui.label(format!("T{} → T{}", zone.start, zone.end));
                ui.label(format!("{:.0}m", zone.length));
                ui.label(format!("detection T{}", zone.detection));
                ui.end_row();
            }
        });

        ui.separator();
        ui.add(egui::Label::new("Facilities").strong());
        for facility in circuit.facilities.iter() {
            match facility.capacity {
                Some(capacity) => ui.label(format!("{} ({}, {} seats)", facility.name, facility.kind, capacity)),
                None => ui.label(format!("{} ({})", facility.name, facility.kind)),
            };
        }
    }

    fn corner_detail_ui(&mut self, ctx: &egui::CtxRef) {
        let corner = match self.session.selected_corner() {
            Some(corner) => corner.clone(),
            None => return,
        };

        let mut open = true;
        egui::Window::new(format!("Corner {}: {}", corner.number, corner.name))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("corner_detail").show(ui, |ui| {
                    ui.label("Type");
                    ui.label(corner.kind.to_string());
                    ui.end_row();
                    ui.label("Angle");
                    ui.label(format!("{:.0}°", corner.angle));
                    ui.end_row();
                    ui.label("Banking");
                    ui.label(format!("{:.1}°", corner.banking));
                    ui.end_row();
                    ui.label("Speed");
                    ui.colored_label(
                        to_color32(&self.session.renderer().theme().speed_color(corner.speed)),
                        corner.speed.to_string(),
                    );
                    ui.end_row();
                    ui.label("Difficulty");
                    ui.label(format!(
                        "{}{}",
                        "●".repeat(corner.difficulty as usize),
                        "○".repeat(5usize.saturating_sub(corner.difficulty as usize))
                    ));
                    ui.end_row();
                    ui.label("Elevation");
                    ui.label(format!("{:+.0}m", corner.z));
                    ui.end_row();
                });
            });

        if !open {
            self.session.close_corner_detail();
        }
    }

    // CANVAS --------------------------------------------------------------------------------------
    pub fn set_ui_content(&mut self, ui: &mut egui::Ui) -> egui::Response {
        // PREPARATIONS ----------------------------------------------------------------------------
        let (response, painter) = ui.allocate_painter(
            ui.available_size_before_wrap_finite(),
            egui::Sense::click_and_drag(),
        );
        let rect = response.rect;
        let viewport = Viewport::new(rect.width() as f64, rect.height() as f64);

        // INPUT -----------------------------------------------------------------------------------
        let drag = response.drag_delta();
        if drag != egui::Vec2::ZERO {
            self.session.pan_by(drag.x as f64, drag.y as f64);
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = pos - rect.min;
                self.session
                    .click(Point2d::new(local.x as f64, local.y as f64), &viewport);
            }
        }

        // DRAWING ---------------------------------------------------------------------------------
        let now_ms = self.t_start.elapsed().as_secs_f64() * 1000.0;
        let mut surface = EguiSurface::new(ui.fonts(), rect);

        let animated = match self.session.scheduler_mut().take_due() {
            Some(handle) => self.session.on_frame(handle, now_ms, &mut surface),
            None => None,
        };
        if animated.is_none() {
            self.session.render_static(&mut surface);
        }

        painter.extend(surface.into_shapes());
        response
    }
}

impl epi::App for TrackViewer {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::CtxRef, _frame: &mut epi::Frame) {
        // update loader interface
        if let Some(event) = self.trackviz_interface.update() {
            self.on_load_event(event);
        }

        // calculate current UI update duration, append it to the buffer, and set update time
        self.prev_update_durations
            .push(self.prev_update.elapsed().as_millis() as u32);
        self.prev_update = Instant::now();

        egui::TopBottomPanel::top("circuit_info").show(ctx, |ui| self.circuit_info_ui(ui));
        egui::SidePanel::left("controls").show(ctx, |ui| self.controls_ui(ui));

        if self.session.camera().view_mode == ViewMode::Technical {
            if let Some(circuit) = self.session.circuit() {
                egui::SidePanel::right("technical")
                    .show(ctx, |ui| TrackViewer::technical_ui(circuit, ui));
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::dark_canvas(ui.style()).show(ui, |ui| {
                self.set_ui_content(ui);
            });
        });

        self.corner_detail_ui(ctx);

        // request repaint while a frame is due or a circuit is still loading
        if self.session.scheduler().has_pending() || self.trackviz_interface.is_loading() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self) {
        self.session.shutdown();
    }

    fn name(&self) -> &str {
        "Track Viewer"
    }
}
