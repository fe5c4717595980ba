use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

/// Callback invoked with the owning video id when the delay elapses
type TimerCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// One-shot delayed callback that survives pause/resume churn.
///
/// The timer is created running and fires `callback(id)` once the requested
/// delay of *actual running time* has elapsed. Pausing consumes the elapsed
/// portion of the delay; resuming schedules only the remainder. A generic
/// media "pause" and a seek can both pause in the same tick, so consecutive
/// pauses without an intervening resume must not subtract elapsed time twice.
///
/// Scheduling runs on a spawned tokio task; cancelling is a task abort.
/// Once fired the timer is inert: the owner creates a new one per cycle.
pub struct ResumableTimer {
    callback: TimerCallback,
    id: String,
    total_delay: Duration,
    remaining: Duration,
    started_at: Instant,
    paused: bool,
    fired: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ResumableTimer {
    /// Create a timer that fires `callback(id)` after `delay` of running time.
    ///
    /// Must be called from within a tokio runtime; the timer starts running
    /// immediately.
    pub fn new<F>(callback: F, delay: Duration, id: impl Into<String>) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut timer = Self {
            callback: Arc::new(callback),
            id: id.into(),
            total_delay: delay,
            remaining: delay,
            started_at: Instant::now(),
            paused: false,
            fired: Arc::new(AtomicBool::new(false)),
            handle: None,
        };
        timer.resume();
        timer
    }

    /// Cancel the pending firing and bank the elapsed running time.
    ///
    /// Idempotent: a second pause without an intervening resume cancels any
    /// scheduling but leaves `remaining` untouched.
    pub fn pause(&mut self) {
        self.cancel();
        if self.fired.load(Ordering::SeqCst) {
            return;
        }
        if !self.paused {
            self.remaining = self.remaining.saturating_sub(self.started_at.elapsed());
            debug!(
                "timer {} paused with {}ms remaining",
                self.id,
                self.remaining.as_millis()
            );
        }
        self.paused = true;
    }

    /// Schedule the callback to fire after the remaining delay.
    pub fn resume(&mut self) {
        self.cancel();
        if self.fired.load(Ordering::SeqCst) {
            return;
        }
        self.started_at = Instant::now();

        let callback = Arc::clone(&self.callback);
        let fired = Arc::clone(&self.fired);
        let id = self.id.clone();
        let delay = self.remaining;
        self.handle = Some(tokio::spawn(async move {
            sleep(delay).await;
            if !fired.swap(true, Ordering::SeqCst) {
                callback(&id);
            }
        }));
        self.paused = false;
    }

    /// Abort any pending scheduled firing
    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// The id passed through to the callback
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The originally requested delay
    pub fn total_delay(&self) -> Duration {
        self.total_delay
    }

    /// Remaining delay as of the last pause
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whether the timer is currently paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the callback has fired; a fired timer accepts no transitions
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Drop for ResumableTimer {
    fn drop(&mut self) {
        // Discarding an unfired timer must not leave a task behind
        self.cancel();
    }
}
