//! Paced polling loop for a single channel.
//!
//! The loop is synchronous: each cycle reads, steps the detector, hands the
//! outcome to the caller and sleeps out the rest of the period. The caller
//! stops it through the shutdown flag, a cycle cap, or by breaking from the
//! callback.
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use repwatch_traits::RangingSource;
use repwatch_traits::clock::Clock;

use crate::channel::{ChannelStats, SensingChannel};
use crate::config::ChannelCfg;
use crate::status::Cycle;

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Target time between the start of two cycles.
    pub period: Duration,
    /// Stop after this many cycles.
    pub max_cycles: Option<u64>,
}

impl RunParams {
    pub fn at_hz(hz: u32) -> Self {
        Self {
            period: crate::util::period(hz),
            max_cycles: None,
        }
    }

    pub fn with_max_cycles(mut self, n: u64) -> Self {
        self.max_cycles = Some(n);
        self
    }
}

impl From<&ChannelCfg> for RunParams {
    /// Pace at the channel's configured `poll_hz`, no cycle cap.
    fn from(cfg: &ChannelCfg) -> Self {
        Self::at_hz(cfg.poll_hz)
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    MaxCycles,
    Callback,
}

/// Run `channel` until stopped. `pacer` provides the period sleeps.
pub fn run_cycles<R, C, K, F>(
    channel: &mut SensingChannel<R, C>,
    pacer: &K,
    params: RunParams,
    shutdown: &AtomicBool,
    mut on_cycle: F,
) -> (StopReason, ChannelStats)
where
    R: RangingSource,
    C: Clock,
    K: Clock,
    F: FnMut(&SensingChannel<R, C>, &Cycle) -> ControlFlow<()>,
{
    let mut done: u64 = 0;
    let reason = loop {
        if shutdown.load(Ordering::Relaxed) {
            break StopReason::Shutdown;
        }
        if params.max_cycles.is_some_and(|max| done >= max) {
            break StopReason::MaxCycles;
        }

        let started = pacer.now();
        let cycle = channel.poll();
        done += 1;
        if on_cycle(channel, &cycle).is_break() {
            break StopReason::Callback;
        }

        let busy = pacer.now().saturating_duration_since(started);
        pacer.sleep(crate::util::remaining(params.period, busy));
    };
    tracing::debug!(?reason, cycles = done, "run loop finished");
    (reason, channel.stats())
}
