use std::time::{Duration, Instant};

/// Poll interval for condition waits.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Default deadline for operations expected to complete quickly.
#[allow(dead_code)]
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Poll `cond` until it holds or `timeout` elapses. Returns the final
/// evaluation, so callers can assert on it directly.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    cond()
}
