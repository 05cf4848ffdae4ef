use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Fixed-window rate limiter. Clones share the window, so every service
/// built from one layer draws on a single request budget.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    window: Arc<Mutex<Window>>,
    capacity: u64,
    period: Duration,
}

#[derive(Debug)]
struct Window {
    used: u64,
    ends_at: Instant,
}

impl RateLimiter {
    /// Allow up to `capacity` permits per `period`.
    pub fn new(capacity: u64, period: Duration) -> Self {
        let window = Window { used: 0, ends_at: Instant::now() + period };
        Self { window: Arc::new(Mutex::new(window)), capacity, period }
    }

    /// Take one permit from the current window. An expired window is
    /// replaced, not extended: unused budget never carries over.
    pub fn try_acquire(&self) -> bool {
        let mut window = self.window.lock().expect("lock poisoned");
        let now = Instant::now();
        if now >= window.ends_at {
            window.used = 1;
            window.ends_at = now + self.period;
            return true;
        }
        if window.used >= self.capacity {
            return false;
        }
        window.used += 1;
        true
    }
}
