//! Per-provider circuit breaker (C1): Closed/Open/HalfOpen with single
//! in-flight probe admission.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    consecutive_fails: u32,
    next_try_at: Instant,
    probe_in_flight: bool,
}

/// Thread-safe breaker guarding one provider's admission decisions. All
/// transitions happen under the same mutex; `Ready` is a best-effort fast
/// path for filtering candidates, `TryAcquire` is the actual admission
/// gate (see dispatcher::select).
pub struct Breaker {
    fail_threshold: u32,
    open_for: Duration,
    inner: Mutex<Inner>,
}

impl Breaker {
    pub fn new(fail_threshold: u32, open_for: Duration) -> Self {
        Self {
            fail_threshold,
            open_for,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_fails: 0,
                next_try_at: Instant::now(),
                probe_in_flight: false,
            }),
        }
    }

    /// Lock-free-in-spirit hint used for candidate filtering. Does not
    /// mutate state or admit anything by itself.
    pub fn ready(&self) -> bool {
        let inner = self.inner.lock().expect("breaker mutex poisoned");
        match inner.state {
            State::Closed => true,
            State::Open => Instant::now() > inner.next_try_at && !inner.probe_in_flight,
            State::HalfOpen => !inner.probe_in_flight,
        }
    }

    /// Atomic admission: at most one probe in flight per breaker.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        let now = Instant::now();
        match inner.state {
            State::Closed => true,
            State::Open => {
                if now > inner.next_try_at && !inner.probe_in_flight {
                    inner.state = State::HalfOpen;
                    inner.probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
            State::HalfOpen => {
                if !inner.probe_in_flight {
                    inner.probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn on_success(&self) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        inner.consecutive_fails = 0;
        inner.state = State::Closed;
        inner.probe_in_flight = false;
    }

    pub fn on_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        if inner.state == State::HalfOpen {
            inner.state = State::Open;
            inner.next_try_at = Instant::now() + self.open_for;
            inner.probe_in_flight = false;
            return;
        }

        inner.consecutive_fails += 1;
        if inner.consecutive_fails >= self.fail_threshold {
            inner.state = State::Open;
            inner.next_try_at = Instant::now() + self.open_for;
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        self.inner.lock().expect("breaker mutex poisoned").state == State::Open
    }

    #[cfg(test)]
    fn is_closed(&self) -> bool {
        self.inner.lock().expect("breaker mutex poisoned").state == State::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let b = Breaker::new(3, Duration::from_millis(50));
        assert!(b.ready());
        b.on_failure();
        b.on_failure();
        assert!(b.is_closed());
        b.on_failure();
        assert!(b.is_open());
        assert!(!b.ready());
    }

    #[test]
    fn admits_single_probe_after_open_for_elapses() {
        let b = Breaker::new(1, Duration::from_millis(10));
        b.on_failure();
        assert!(b.is_open());
        std::thread::sleep(Duration::from_millis(15));
        assert!(b.ready());
        assert!(b.try_acquire());
        // A second concurrent acquire attempt must be refused: only one
        // probe may be in flight.
        assert!(!b.try_acquire());
    }

    #[test]
    fn probe_success_closes_breaker() {
        let b = Breaker::new(1, Duration::from_millis(10));
        b.on_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(b.try_acquire());
        b.on_success();
        assert!(b.is_closed());
        assert!(b.ready());
    }

    #[test]
    fn probe_failure_reopens_breaker() {
        let b = Breaker::new(1, Duration::from_millis(10));
        b.on_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(b.try_acquire());
        b.on_failure();
        assert!(b.is_open());
    }

    #[test]
    fn reset_on_success_clears_consecutive_fails() {
        let b = Breaker::new(3, Duration::from_millis(50));
        b.on_failure();
        b.on_failure();
        b.on_success();
        b.on_failure();
        b.on_failure();
        // Only 2 consecutive fails since the reset; threshold is 3.
        assert!(b.is_closed());
    }
}
