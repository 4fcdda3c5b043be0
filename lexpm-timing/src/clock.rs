use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Time source for the trial engine and its host loop.
///
/// `now_ns` is the monotonic clock reaction times are measured against;
/// `epoch_ms` is wall-clock and only stamps stored records.
pub trait Clock: Clone + Send + Sync {
    /// Monotonic nanoseconds since an arbitrary origin.
    fn now_ns(&self) -> u64;
    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64;
    fn sleep(&self, duration: Duration);
}

/// Production clock backed by `Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn sleep(&self, duration: Duration) {
        precision_sleep(duration);
    }
}

#[cfg(target_os = "linux")]
fn precision_sleep(duration: Duration) {
    use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

    let req = timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };

    unsafe {
        clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
    }
}

#[cfg(not(target_os = "linux"))]
fn precision_sleep(duration: Duration) {
    std::thread::sleep(duration);
}

/// Test clock advanced by hand. Clones share the same underlying time,
/// so a test can hold one handle while the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    ns: Arc<AtomicU64>,
    epoch_base_ms: u64,
}

impl ManualClock {
    pub fn new(epoch_base_ms: u64) -> Self {
        Self {
            ns: Arc::new(AtomicU64::new(0)),
            epoch_base_ms,
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.ns.load(Ordering::SeqCst)
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_base_ms + self.now_ns() / 1_000_000
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_700_000_000_000);
        let engine_handle = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(engine_handle.now_ns(), 250_000_000);
        assert_eq!(engine_handle.epoch_ms(), 1_700_000_000_250);
    }

    #[test]
    fn manual_clock_sleep_advances_time() {
        let clock = ManualClock::new(0);
        clock.sleep(Duration::from_millis(5));
        assert_eq!(clock.now_ns(), 5_000_000);
    }
}
