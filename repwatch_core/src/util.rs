//! Pacing helpers for the polling loop.

use std::time::Duration;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Polling period for a rate in Hz, never shorter than 1 µs. A rate of 0 is
/// treated as 1 Hz.
#[inline]
pub fn period(hz: u32) -> Duration {
    Duration::from_micros((MICROS_PER_SEC / u64::from(hz.max(1))).max(1))
}

/// Time left in the current period after `busy` was spent working.
#[inline]
pub fn remaining(period: Duration, busy: Duration) -> Duration {
    period.saturating_sub(busy)
}
