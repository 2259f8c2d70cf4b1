use crate::core::animation::{AnimationDriver, FrameHandle, FrameScheduler};
use crate::core::camera::{CameraState, Layer, ViewMode, ViewPreset};
use crate::core::circuit::{Circuit, Corner};
use crate::core::renderer::{RenderStats, Renderer};
use crate::core::surface::Surface;
use crate::core::transform::Viewport;
use crate::interfaces::loader_interface::LoadEvent;
use crate::pre::read_viewer_config::ViewerConfig;
use helpers::geometry::Point2d;
use tracing::{debug, info, warn};

/// Frame rates above this value are reported as good performance.
pub const FPS_THRESHOLD: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitStatus {
    Loading,
    Ready(Box<Circuit>),
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceStatus {
    /// No frame rate has been measured yet.
    Measuring,
    Ok,
    Degraded,
}

impl PerformanceStatus {
    pub fn from_fps(fps: u32) -> PerformanceStatus {
        if fps == 0 {
            PerformanceStatus::Measuring
        } else if fps > FPS_THRESHOLD {
            PerformanceStatus::Ok
        } else {
            PerformanceStatus::Degraded
        }
    }
}

/// ViewSession is the state of one open viewer, independent of the window toolkit: camera,
/// animation, loaded circuit and the corner selection. Dropping the session stops the animation.
pub struct ViewSession<F: FrameScheduler> {
    camera: CameraState,
    driver: AnimationDriver,
    scheduler: F,
    renderer: Renderer,
    status: CircuitStatus,
    selected: Option<usize>,
    last_stats: Option<RenderStats>,
    presets: Vec<ViewPreset>,
}

fn draw_status<S: Surface>(
    renderer: &Renderer,
    status: &CircuitStatus,
    surface: &mut S,
    camera: &CameraState,
) -> Option<RenderStats> {
    let viewport = surface.size();
    match status {
        CircuitStatus::Ready(circuit) => renderer.render(surface, circuit, camera, &viewport),
        CircuitStatus::Loading => renderer.render_placeholder(surface, &viewport, "Loading circuit..."),
        CircuitStatus::Unavailable(reason) => renderer.render_placeholder(
            surface,
            &viewport,
            &format!("Circuit unavailable: {}", reason),
        ),
    }
}

impl<F: FrameScheduler> ViewSession<F> {
    pub fn new(config: &ViewerConfig, scheduler: F) -> ViewSession<F> {
        ViewSession {
            camera: CameraState::new(config.camera),
            driver: AnimationDriver::new(),
            scheduler,
            renderer: Renderer::new(&config.render, config.theme.clone()),
            status: CircuitStatus::Loading,
            selected: None,
            last_stats: None,
            presets: config.presets.clone(),
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    pub fn status(&self) -> &CircuitStatus {
        &self.status
    }

    pub fn circuit(&self) -> Option<&Circuit> {
        match &self.status {
            CircuitStatus::Ready(circuit) => Some(circuit.as_ref()),
            _ => None,
        }
    }

    pub fn presets(&self) -> &[ViewPreset] {
        &self.presets
    }

    pub fn last_stats(&self) -> Option<RenderStats> {
        self.last_stats
    }

    // LOADING -------------------------------------------------------------------------------------
    /// begin_loading drops the current circuit and shows the placeholder until `apply_load`.
    pub fn begin_loading(&mut self) {
        self.status = CircuitStatus::Loading;
        self.selected = None;
    }

    pub fn apply_load(&mut self, event: LoadEvent) {
        self.selected = None;
        self.status = match event {
            LoadEvent::Loaded(circuit) => {
                info!("Showing circuit {}", circuit.name);
                CircuitStatus::Ready(circuit)
            }
            LoadEvent::Failed { id, reason } => {
                warn!("Circuit {} is unavailable: {}", id, reason);
                CircuitStatus::Unavailable(reason)
            }
        };
    }

    // CONTROLS ------------------------------------------------------------------------------------
    pub fn zoom_in(&mut self) {
        self.camera.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out();
    }

    pub fn set_zoom_level(&mut self, zoom: f64) {
        self.camera.set_zoom_level(zoom);
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.camera.set_rotation(degrees);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.camera.pan_by(dx, dy);
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    pub fn toggle_layer(&mut self, layer: Layer) {
        self.camera.toggle_layer(layer);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.camera.view_mode = mode;
    }

    /// apply_preset applies the preset with the given index, false if there is none.
    pub fn apply_preset(&mut self, idx: usize) -> bool {
        match self.presets.get(idx) {
            Some(preset) => {
                debug!("Applying view preset {}", preset.name);
                self.camera.apply_preset(preset);
                true
            }
            None => false,
        }
    }

    // ANIMATION -----------------------------------------------------------------------------------
    pub fn is_playing(&self) -> bool {
        self.driver.is_running()
    }

    pub fn play(&mut self) {
        self.driver.start(&mut self.scheduler);
    }

    pub fn pause(&mut self) {
        self.driver.stop(&mut self.scheduler);
    }

    pub fn toggle_rotation(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// fps is the frame rate of the rotation loop. Static repaints are not measured, so the value
    /// holds at its last measurement while paused and is reset when playback starts again.
    pub fn fps(&self) -> u32 {
        self.driver.fps()
    }

    pub fn performance(&self) -> PerformanceStatus {
        PerformanceStatus::from_fps(self.driver.fps())
    }

    // RENDERING -----------------------------------------------------------------------------------
    /// render_static draws the current state without advancing the animation, e.g. after a
    /// control changed while paused. It reports the held fps value of the rotation loop.
    pub fn render_static<S: Surface>(&mut self, surface: &mut S) -> Option<RenderStats> {
        let stats = draw_status(&self.renderer, &self.status, surface, &self.camera)?;
        let stats = RenderStats {
            fps: self.driver.fps(),
            ..stats
        };
        self.last_stats = Some(stats);
        Some(stats)
    }

    /// on_frame forwards a fired frame callback to the animation driver.
    pub fn on_frame<S: Surface>(
        &mut self,
        handle: FrameHandle,
        now_ms: f64,
        surface: &mut S,
    ) -> Option<RenderStats> {
        let renderer = &self.renderer;
        let status = &self.status;
        let stats = self.driver.on_frame(
            handle,
            now_ms,
            &mut self.camera,
            &mut self.scheduler,
            |camera| draw_status(renderer, status, surface, camera),
        )?;
        self.last_stats = Some(stats);
        Some(stats)
    }

    // SELECTION -----------------------------------------------------------------------------------
    /// click selects the corner under the pointer. A click that hits no corner keeps the current
    /// selection.
    pub fn click(&mut self, pointer: Point2d, viewport: &Viewport) -> Option<&Corner> {
        let circuit = match &self.status {
            CircuitStatus::Ready(circuit) => circuit,
            _ => return None,
        };
        let hit = self
            .renderer
            .hit_test(circuit, &self.camera, viewport, &pointer)?;
        let idx = circuit.corners.iter().position(|c| std::ptr::eq(c, hit))?;
        debug!("Selected corner {} ({})", hit.number, hit.name);
        self.selected = Some(idx);
        circuit.corners.get(idx)
    }

    pub fn selected_corner(&self) -> Option<&Corner> {
        let idx = self.selected?;
        self.circuit()?.corners.get(idx)
    }

    pub fn close_corner_detail(&mut self) {
        self.selected = None;
    }

    /// shutdown stops the animation, leaving no frame callback pending.
    pub fn shutdown(&mut self) {
        self.driver.stop(&mut self.scheduler);
    }
}

impl<F: FrameScheduler> Drop for ViewSession<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::animation::ManualScheduler;
    use crate::core::circuit::fixtures::monaco_like;
    use crate::post::recording::RecordingSurface;
    use approx::assert_relative_eq;

    fn ready_session() -> ViewSession<ManualScheduler> {
        let mut session = ViewSession::new(&ViewerConfig::default(), ManualScheduler::new());
        session.apply_load(LoadEvent::Loaded(Box::new(monaco_like())));
        session
    }

    #[test]
    fn placeholder_while_loading_and_after_failure() {
        let mut session = ViewSession::new(&ViewerConfig::default(), ManualScheduler::new());
        let mut surface = RecordingSurface::new(Viewport::new(400.0, 300.0));

        let stats = session.render_static(&mut surface).unwrap();
        assert_eq!(stats.corners_drawn, 0);
        assert_eq!(stats.elements_drawn, 1);

        session.apply_load(LoadEvent::Failed {
            id: "monaco".to_owned(),
            reason: "timeout".to_owned(),
        });
        assert_eq!(session.status(), &CircuitStatus::Unavailable("timeout".to_owned()));
        assert!(session.render_static(&mut surface).is_some());
        assert!(session.circuit().is_none());
    }

    #[test]
    fn play_renders_frames_and_pause_cancels() {
        let mut session = ready_session();
        let mut surface = RecordingSurface::new(Viewport::new(800.0, 600.0));

        session.toggle_rotation();
        assert!(session.is_playing());
        for i in 0..3 {
            let handle = session.scheduler_mut().fire_next().unwrap();
            let stats = session.on_frame(handle, i as f64 * 16.0, &mut surface).unwrap();
            assert_eq!(stats.corners_drawn, 19);
        }
        assert_relative_eq!(session.camera().rotation(), 1.5);

        session.toggle_rotation();
        assert!(!session.is_playing());
        assert!(session.scheduler().pending().is_empty());
    }

    #[test]
    fn shutdown_leaves_no_pending_frame() {
        let mut session = ready_session();
        session.play();
        assert_eq!(session.scheduler().pending().len(), 1);
        session.shutdown();
        assert!(session.scheduler().pending().is_empty());
    }

    #[test]
    fn click_selects_corner_and_miss_keeps_it() {
        let mut session = ready_session();
        let viewport = Viewport::new(800.0, 600.0);
        let circuit = monaco_like();
        let target = session
            .renderer()
            .screen_position(&circuit.corners[4], session.camera(), &viewport)
            .unwrap();

        assert_eq!(session.click(target, &viewport).map(|c| c.number), Some(5));
        assert!(session.click(Point2d::new(1.0, 1.0), &viewport).is_none());
        assert_eq!(session.selected_corner().map(|c| c.number), Some(5));

        session.close_corner_detail();
        assert!(session.selected_corner().is_none());
    }

    #[test]
    fn presets_and_reset() {
        let mut session = ready_session();
        assert!(session.apply_preset(2));
        assert_relative_eq!(session.camera().rotation(), 45.0);
        assert_relative_eq!(session.camera().zoom(), 2.0);
        assert!(!session.apply_preset(99));

        session.toggle_layer(Layer::Lighting);
        session.set_view_mode(ViewMode::Technical);
        session.reset_camera();
        assert_relative_eq!(session.camera().zoom(), 1.0);
        assert_relative_eq!(session.camera().rotation(), 0.0);
        assert!(!session.camera().layers.is_visible(Layer::Lighting));
        assert_eq!(session.camera().view_mode, ViewMode::Technical);
    }

    #[test]
    fn performance_threshold() {
        assert_eq!(PerformanceStatus::from_fps(0), PerformanceStatus::Measuring);
        assert_eq!(PerformanceStatus::from_fps(30), PerformanceStatus::Degraded);
        assert_eq!(PerformanceStatus::from_fps(31), PerformanceStatus::Ok);
        assert_eq!(ready_session().performance(), PerformanceStatus::Measuring);
    }

    #[test]
    fn fps_holds_while_paused() {
        let mut session = ready_session();
        let mut surface = RecordingSurface::new(Viewport::new(800.0, 600.0));

        session.play();
        for i in 0..70 {
            let handle = session.scheduler_mut().fire_next().unwrap();
            session.on_frame(handle, i as f64 * 16.0, &mut surface);
        }
        let fps = session.fps();
        assert!(fps > FPS_THRESHOLD);

        session.pause();
        for _ in 0..5 {
            let stats = session.render_static(&mut surface).unwrap();
            assert_eq!(stats.fps, fps);
        }
        assert_eq!(session.fps(), fps);
        assert_eq!(session.performance(), PerformanceStatus::Ok);

        session.play();
        assert_eq!(session.performance(), PerformanceStatus::Measuring);
    }
}
