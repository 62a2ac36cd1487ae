//! Fixed-cadence background loops.
//!
//! A [`TickLoop`] owns one worker thread that calls a closure every period
//! until the closure asks to stop or the handle is stopped or dropped. The
//! handle is the only way to reach the thread, so replacing a loop always
//! stops the previous one first.

use std::sync::mpsc::{RecvTimeoutError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Frame period of the animation and scroll loops (~60 Hz).
pub const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Ticks per second at [`FRAME_PERIOD`].
pub const TICKS_PER_SECOND: f64 = 1000.0 / 16.0;

/// Whether a loop should keep running after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Stop,
}

/// Handle to a running background loop.
#[derive(Debug)]
pub struct TickLoop {
    name: &'static str,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TickLoop {
    /// Spawn a loop calling `tick` every `period`.
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> TickFlow + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::<()>();
        let thread = thread::Builder::new()
            .name(format!("cardflow-{name}"))
            .spawn(move || {
                log::trace!("{} loop started", name);
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {
                            if tick() == TickFlow::Stop {
                                log::trace!("{} loop finished", name);
                                break;
                            }
                        }
                        // Explicit stop, or the handle went away.
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                            log::trace!("{} loop cancelled", name);
                            break;
                        }
                    }
                }
            });

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn {} loop: {}", name, e);
                None
            }
        };

        Self {
            name,
            stop_tx: Some(stop_tx),
            thread,
        }
    }

    /// Whether the worker thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the loop and wait for the worker to exit. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::warn!("{} loop panicked", self.name);
            }
        }
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
