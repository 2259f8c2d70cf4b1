use std::sync::Arc;
use tracing::warn;
use trackviz::core::animation::{FrameHandle, FrameScheduler};
use trackviz::interfaces::loader_interface::{spawn_loader, CircuitFeed, LoadEvent};
use trackviz::pre::catalog::CircuitSource;

/// RepaintScheduler hands frame callbacks to the egui update loop: a requested frame is due on the
/// next repaint, the app asks egui for that repaint while a frame is pending.
#[derive(Debug, Default)]
pub struct RepaintScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl RepaintScheduler {
    pub fn new() -> RepaintScheduler {
        RepaintScheduler::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// take_due removes and returns the pending frame.
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for RepaintScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

/// TrackvizInterface owns the data source and the circuit load in flight.
pub struct TrackvizInterface {
    pub source: Arc<dyn CircuitSource + Send + Sync>,
    pub feed: Option<CircuitFeed>,
}

impl TrackvizInterface {
    pub fn new(source: Arc<dyn CircuitSource + Send + Sync>) -> TrackvizInterface {
        TrackvizInterface { source, feed: None }
    }

    pub fn ids(&self) -> Vec<String> {
        self.source.ids()
    }

    pub fn is_loading(&self) -> bool {
        self.feed.is_some()
    }

    /// load starts fetching a circuit, replacing a load still in flight. A loader that cannot be
    /// started is reported as a failed load.
    pub fn load(&mut self, id: &str) -> Option<LoadEvent> {
        match spawn_loader(self.source.clone(), id) {
            Ok(feed) => {
                self.feed = Some(feed);
                None
            }
            Err(e) => {
                warn!("{:#}", e);
                self.feed = None;
                Some(LoadEvent::Failed {
                    id: id.to_owned(),
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    /// update returns the load result once it has arrived.
    pub fn update(&mut self) -> Option<LoadEvent> {
        let event = self.feed.as_mut()?.poll()?;
        self.feed = None;
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use trackviz::pre::catalog::Catalog;

    #[test]
    fn scheduler_keeps_one_pending_frame() {
        let mut scheduler = RepaintScheduler::new();
        let first = scheduler.request_frame();
        let second = scheduler.request_frame();
        assert_ne!(first, second);

        scheduler.cancel_frame(first);
        assert!(scheduler.has_pending());
        assert_eq!(scheduler.take_due(), Some(second));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn loads_builtin_circuit() {
        let catalog = Catalog::builtin().unwrap();
        let mut interface = TrackvizInterface::new(Arc::new(catalog));
        assert!(interface.load("suzuka").is_none());

        let t_start = Instant::now();
        let event = loop {
            if let Some(event) = interface.update() {
                break event;
            }
            assert!(t_start.elapsed() < Duration::from_secs(5));
            std::thread::sleep(Duration::from_millis(5));
        };

        match event {
            LoadEvent::Loaded(circuit) => assert_eq!(circuit.corners.len(), 18),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(!interface.is_loading());
    }
}
