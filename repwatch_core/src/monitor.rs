//! Background channel monitor.
//!
//! Spawns a thread that owns a `SensingChannel`, polls it at a fixed rate,
//! pushes completed excursions via a bounded channel, and tracks the
//! last-ok timestamp for stall detection.
//!
//! Each `Monitor` owns exactly one thread, shut down and joined when the
//! `Monitor` is stopped or dropped.
use crossbeam_channel as xch;
use repwatch_traits::RangingSource;
use repwatch_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::channel::{ChannelStats, SensingChannel};
use crate::status::Cycle;

/// Pending events the consumer may leave undrained before new ones drop.
pub const EVENT_BACKLOG: usize = 64;

/// One completed excursion as reported by the monitor thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepEvent {
    /// 1-based event counter for this monitor.
    pub seq: u64,
    /// Distance of the sample that completed the excursion.
    pub mm: u16,
    /// Milliseconds since the monitor started.
    pub at_ms: u64,
}

pub struct Monitor {
    rx: xch::Receiver<RepEvent>,
    last_ok: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<ChannelStats>>,
}

impl Monitor {
    /// Poll `channel` at its configured `poll_hz` on a new thread. The
    /// channel must already be initialized (`begin()`); `clock` paces the
    /// loop.
    pub fn spawn<R, K, C>(mut channel: SensingChannel<R, K>, clock: C) -> Self
    where
        R: RangingSource + Send + 'static,
        K: Clock + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(EVENT_BACKLOG);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let dropped = Arc::new(AtomicU64::new(0));
        let dropped_clone = dropped.clone();
        let period = crate::util::period(channel.cfg().poll_hz);
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            let mut seq = 0u64;
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("monitor thread received shutdown signal");
                    break;
                }

                let started = clock.now();
                match channel.poll() {
                    Cycle::Reading { mm, event } => {
                        let now = clock.ms_since(epoch);
                        last_ok_clone.store(now, Ordering::Relaxed);
                        if event {
                            seq += 1;
                            let ev = RepEvent {
                                seq,
                                mm,
                                at_ms: now,
                            };
                            match tx.try_send(ev) {
                                Ok(()) => {}
                                Err(xch::TrySendError::Full(_)) => {
                                    dropped_clone.fetch_add(1, Ordering::Relaxed);
                                    tracing::warn!(seq, "event backlog full, dropping event");
                                }
                                Err(xch::TrySendError::Disconnected(_)) => {
                                    tracing::debug!("monitor consumer disconnected, exiting thread");
                                    break;
                                }
                            }
                        }
                    }
                    Cycle::NoReading => {
                        // stall shows up through last_ok
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                let busy = clock.now().saturating_duration_since(started);
                clock.sleep(crate::util::remaining(period, busy));
            }
            tracing::trace!("monitor thread exiting cleanly");
            channel.stats()
        });

        Self {
            rx,
            last_ok,
            dropped,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Drain every event received so far.
    pub fn try_events(&self) -> Vec<RepEvent> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RepEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Events lost because the backlog was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Milliseconds since the last successful read, given `now_ms` on the
    /// monitor's timeline (milliseconds since `epoch()`).
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Stop the thread and return the channel's final counters.
    pub fn stop(mut self) -> Option<ChannelStats> {
        self.shutdown.store(true, Ordering::Relaxed);
        self.join_handle.take().and_then(|h| h.join().ok())
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits after the current poll completes (bounded by the
        // read burst) or immediately if it is between polls.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(_) => {
                    tracing::trace!("monitor thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "monitor thread panicked during shutdown");
                }
            }
        }
    }
}
