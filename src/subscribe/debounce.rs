/**
 * Debounce Timer
 *
 * A cancellable timer that coalesces bursts of triggers into a single
 * callback invocation: the first trigger opens a window of the configured
 * delay, further triggers inside the window fold into the same firing, and
 * the callback runs once when the window closes.
 *
 * The timer is owned by its component and stopped deterministically on
 * shutdown; a stopped timer never fires again, and a pending window is
 * discarded rather than flushed.
 */

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

enum Signal {
    Trigger,
    Stop,
}

/// Coalescing timer with deterministic shutdown
pub struct Debouncer {
    tx: mpsc::UnboundedSender<Signal>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer firing `callback` once per trigger window
    pub fn new(delay: Duration, callback: impl Fn() + Send + Sync + 'static) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Signal>();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Some(Signal::Trigger) => {}
                    Some(Signal::Stop) | None => break,
                }

                // Window open: absorb further triggers until the deadline
                let deadline = Instant::now() + delay;
                loop {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match timeout(remaining, rx.recv()).await {
                        Err(_) => {
                            callback();
                            break;
                        }
                        Ok(Some(Signal::Trigger)) => continue,
                        Ok(Some(Signal::Stop)) | Ok(None) => return,
                    }
                }
            }
        });

        Self {
            tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Request a firing; folds into an open window if one exists
    pub fn trigger(&self) {
        let _ = self.tx.send(Signal::Trigger);
    }

    /// Stop the timer, discarding any pending window
    pub async fn stop(&self) {
        let _ = self.tx.send(Signal::Stop);
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
    }
}
