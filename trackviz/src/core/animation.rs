use crate::core::camera::CameraState;
use crate::core::renderer::RenderStats;
use tracing::{debug, trace};

/// FrameHandle identifies one requested display-refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// FrameScheduler is the host's display-refresh primitive: every requested frame results in at most
/// one `on_frame` call unless it is cancelled before.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running { pending: FrameHandle },
}

/// FpsMeter counts frames and recomputes the frame rate once at least a second has elapsed since
/// the last update.
#[derive(Debug, Default, Clone)]
pub struct FpsMeter {
    window_start_ms: Option<f64>,
    frames: u32,
    fps: u32,
}

impl FpsMeter {
    pub const UPDATE_INTERVAL_MS: f64 = 1000.0;

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// record registers one displayed frame at time `now_ms` and returns the current estimate.
    pub fn record(&mut self, now_ms: f64) -> u32 {
        let start = match self.window_start_ms {
            Some(start) => start,
            None => {
                self.window_start_ms = Some(now_ms);
                now_ms
            }
        };
        self.frames += 1;

        let elapsed = now_ms - start;
        if elapsed >= FpsMeter::UPDATE_INTERVAL_MS {
            self.fps = (self.frames as f64 * 1000.0 / elapsed).round() as u32;
            self.frames = 0;
            self.window_start_ms = Some(now_ms);
        }
        self.fps
    }

    pub fn reset(&mut self) {
        *self = FpsMeter::default();
    }
}

/// AnimationDriver is the Idle/Running state machine of the auto-rotation loop. It guarantees at
/// most one pending frame callback: starting while running does nothing and stopping always cancels
/// the pending callback.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    state: DriverState,
    fps_meter: FpsMeter,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        AnimationDriver::new()
    }
}

impl AnimationDriver {
    pub fn new() -> AnimationDriver {
        AnimationDriver {
            state: DriverState::Idle,
            fps_meter: FpsMeter::default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Running { .. })
    }

    pub fn fps(&self) -> u32 {
        self.fps_meter.fps()
    }

    pub fn start<F: FrameScheduler + ?Sized>(&mut self, scheduler: &mut F) {
        if self.is_running() {
            return;
        }
        let pending = scheduler.request_frame();
        self.fps_meter.reset();
        self.state = DriverState::Running { pending };
        debug!("Animation started");
    }

    pub fn stop<F: FrameScheduler + ?Sized>(&mut self, scheduler: &mut F) {
        if let DriverState::Running { pending } = self.state {
            scheduler.cancel_frame(pending);
            self.state = DriverState::Idle;
            debug!("Animation stopped");
        }
    }

    /// on_frame handles a fired frame callback. Stale handles and callbacks arriving while idle are
    /// ignored. Otherwise the rotation advances by one step, the frame is rendered through `render`
    /// and the next callback is requested.
    pub fn on_frame<F, R>(
        &mut self,
        handle: FrameHandle,
        now_ms: f64,
        camera: &mut CameraState,
        scheduler: &mut F,
        render: R,
    ) -> Option<RenderStats>
    where
        F: FrameScheduler + ?Sized,
        R: FnOnce(&CameraState) -> Option<RenderStats>,
    {
        match self.state {
            DriverState::Running { pending } if pending == handle => {}
            _ => {
                trace!("Ignoring stale frame callback {:?}", handle);
                return None;
            }
        }

        camera.advance_rotation();
        let stats = render(camera);
        let fps = self.fps_meter.record(now_ms);

        let next = scheduler.request_frame();
        self.state = DriverState::Running { pending: next };

        stats.map(|s| RenderStats { fps, ..s })
    }
}

/// ManualScheduler is a headless scheduler: frames fire only when the owner pops them. It is used
/// for offline frame stepping and in tests.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> ManualScheduler {
        ManualScheduler::default()
    }

    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    /// fire_next removes and returns the oldest pending frame.
    pub fn fire_next(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|&h| h != handle);
    }
}
