//! Bounded polling.
//!
//! Repeatedly runs a status check until it yields a value or the attempt
//! budget (`timeout / interval`, integer division) is spent.

use crate::error::{Error, Result};
use std::thread;
use std::time::Duration;

/// Number of retries allowed after the first attempt.
fn allowed_attempts(timeout: Duration, interval: Duration) -> u64 {
    let allowed = timeout.as_millis() / interval.as_millis().max(1);
    u64::try_from(allowed).unwrap_or(u64::MAX)
}

/// Runs `check` until it returns `Some`, sleeping `interval` between attempts.
///
/// Blocks the calling thread. Errors from `check` are returned immediately.
/// A `timeout` shorter than `interval` still gets one attempt. Once the
/// attempt count reaches `timeout / interval` without a value, fails with
/// `poll.timeout` naming `operation`. A zero `interval` is rejected before
/// the first check.
pub fn poll<T, F>(operation: &str, timeout: Duration, interval: Duration, mut check: F) -> Result<T>
where
    F: FnMut() -> Result<Option<T>>,
{
    if interval.is_zero() {
        return Err(Error::validation_invalid_argument(
            "interval",
            "Poll interval must be greater than zero",
            Some(operation.to_string()),
        ));
    }

    let allowed = allowed_attempts(timeout, interval);
    let mut attempts: u64 = 0;

    loop {
        if let Some(value) = check()? {
            return Ok(value);
        }
        if attempts >= allowed {
            return Err(Error::poll_timeout(operation, timeout.as_secs()));
        }
        attempts += 1;
        tracing::trace!(operation, attempts, "still waiting");
        thread::sleep(interval);
    }
}
