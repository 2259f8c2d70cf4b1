use crate::core::circuit::Circuit;
use crate::pre::catalog::CircuitSource;
use anyhow::Context;
use flume::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// LoadEvent is sent once by the loader thread when the fetch has finished.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Loaded(Box<Circuit>),
    Failed { id: String, reason: String },
}

/// CircuitFeed is the receiving end of one circuit load.
pub struct CircuitFeed {
    id: String,
    rx: Receiver<LoadEvent>,
    done: bool,
}

impl CircuitFeed {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// poll returns the load result once it is available, without blocking. A loader thread that
    /// died without reporting is turned into a failure.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => {
                self.done = true;
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(LoadEvent::Failed {
                    id: self.id.clone(),
                    reason: "loader stopped without a result".to_owned(),
                })
            }
        }
    }

    /// wait blocks until the result arrives or the timeout expires.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadEvent> {
        if self.done {
            return None;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.done = true;
                Some(event)
            }
            Err(_) => self.poll(),
        }
    }
}

/// spawn_loader fetches and validates the circuit on a worker thread so the caller can keep drawing
/// while the data source answers. A circuit that fails validation is reported as a failed load.
pub fn spawn_loader(
    source: Arc<dyn CircuitSource + Send + Sync>,
    id: &str,
) -> anyhow::Result<CircuitFeed> {
    let (tx, rx) = flume::bounded(1);
    let thread_id = id.to_owned();

    thread::Builder::new()
        .name(format!("load-{}", id))
        .spawn(move || {
            let fetched = source.fetch(&thread_id).and_then(|circuit| {
                circuit
                    .validate()
                    .context(format!("Circuit {} is invalid!", circuit.id))?;
                Ok(circuit)
            });
            let event = match fetched {
                Ok(circuit) => {
                    info!("Loaded circuit {} ({} corners)", circuit.id, circuit.corners.len());
                    LoadEvent::Loaded(Box::new(circuit))
                }
                Err(e) => {
                    warn!("Failed to load circuit {}: {:#}", thread_id, e);
                    LoadEvent::Failed {
                        id: thread_id,
                        reason: format!("{:#}", e),
                    }
                }
            };
            // the receiver is gone if the viewer switched to another circuit meanwhile
            let _ = tx.send(event);
        })
        .context(format!("Failed to start loader thread for circuit {}!", id))?;

    Ok(CircuitFeed {
        id: id.to_owned(),
        rx,
        done: false,
    })
}
