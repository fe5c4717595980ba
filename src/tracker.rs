use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};

use crate::{PingRegistry, ResumableTimer};

/// Wires playback transitions to the view-count ping, one timer per video id.
///
/// A video's first `playing` transition starts its ping timer; `paused`
/// suspends it; further `playing` transitions resume it. The timer fires once
/// per cycle, after the configured delay of actual playback time, and the
/// registry dedupes across cycles. `ended` drops the timer so a replay starts
/// a fresh cycle.
pub struct ViewTracker {
    registry: Arc<Mutex<PingRegistry>>,
    timers: HashMap<String, ResumableTimer>,
    ping_delay: Duration,
}

impl ViewTracker {
    pub fn new(registry: PingRegistry, ping_delay: Duration) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            timers: HashMap::new(),
            ping_delay,
        }
    }

    /// Shared handle to the session's ping registry
    pub fn registry(&self) -> Arc<Mutex<PingRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Handle a `playing` transition for `id`
    pub fn on_playing(&mut self, id: &str) {
        if let Some(timer) = self.timers.get_mut(id) {
            timer.resume();
            return;
        }

        debug!(
            "starting view-count timer for {} ({}ms)",
            id,
            self.ping_delay.as_millis()
        );
        let registry = Arc::clone(&self.registry);
        let timer = ResumableTimer::new(
            move |id| match registry.lock() {
                Ok(mut registry) => match registry.ping(Some(id)) {
                    Ok(true) => debug!("view-count ping sent for {}", id),
                    Ok(false) => debug!("view-count ping for {} already sent", id),
                    Err(e) => warn!("view-count ping skipped for {}: {}", id, e),
                },
                Err(_) => warn!("ping registry poisoned, skipping ping for {}", id),
            },
            self.ping_delay,
            id,
        );
        self.timers.insert(id.to_string(), timer);
    }

    /// Handle a `paused` transition for `id` (no-op for untracked ids)
    pub fn on_paused(&mut self, id: &str) {
        if let Some(timer) = self.timers.get_mut(id) {
            timer.pause();
        }
    }

    /// Handle an `ended` transition: drop the cycle's timer
    pub fn on_ended(&mut self, id: &str) {
        if self.timers.remove(id).is_some() {
            debug!("view-count timer for {} dropped", id);
        }
    }

    /// Whether a timer exists for `id` in the current cycle
    pub fn is_tracking(&self, id: &str) -> bool {
        self.timers.contains_key(id)
    }

    /// Whether any view-count ping has gone out this session
    pub fn has_pinged(&self) -> bool {
        self.registry
            .lock()
            .map(|registry| registry.has_pinged())
            .unwrap_or(false)
    }
}
