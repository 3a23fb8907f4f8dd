use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Per-key emission window for noisy log lines.
#[derive(Debug)]
struct Window {
    opened_at: Instant,
    suppressed: u64,
}

/// Rate limiter for log events: at most one emission per key per interval.
#[derive(Debug, Default)]
pub struct LogThrottle {
    windows: Mutex<HashMap<String, Window>>,
}

impl LogThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(suppressed_count)` when the event for `key` should be
    /// logged now, `None` when it is swallowed into the current window.
    pub fn check(&self, key: &str, interval: Duration) -> Option<u64> {
        let mut windows = self.windows.lock().expect("log throttle mutex poisoned");
        let now = Instant::now();

        let Some(window) = windows.get_mut(key) else {
            windows.insert(
                key.to_string(),
                Window {
                    opened_at: now,
                    suppressed: 0,
                },
            );
            return Some(0);
        };

        if now.duration_since(window.opened_at) < interval {
            window.suppressed += 1;
            return None;
        }
        let suppressed = std::mem::take(&mut window.suppressed);
        window.opened_at = now;
        Some(suppressed)
    }
}

static GLOBAL: OnceLock<LogThrottle> = OnceLock::new();

/// [`LogThrottle::check`] against the process-wide throttle.
pub fn should_emit(key: &str, interval: Duration) -> Option<u64> {
    GLOBAL.get_or_init(LogThrottle::new).check(key, interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_emits_then_suppresses_then_reports_count() {
        let throttle = LogThrottle::new();
        let interval = Duration::from_millis(20);

        assert_eq!(throttle.check("cache.static.hit", interval), Some(0));
        assert_eq!(throttle.check("cache.static.hit", interval), None);
        assert_eq!(throttle.check("cache.static.hit", interval), None);
        assert_eq!(throttle.check("cache.api.stale", interval), Some(0));

        sleep(Duration::from_millis(30));
        assert_eq!(throttle.check("cache.static.hit", interval), Some(2));
    }
}
