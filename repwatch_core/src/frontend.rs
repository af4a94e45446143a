//! Sampling front-end: one denoised distance per call.
//!
//! Wraps a `RangingSource` and reduces up to `K_MAX` raw acquisitions to a
//! single value with a median. Transient acquisition failures only shrink
//! the sample count; a read fails only when every attempt failed.
use eyre::WrapErr;
use repwatch_traits::clock::{Clock, MonotonicClock};
use repwatch_traits::RangingSource;
use tracing::{debug, trace, warn};

use crate::config::FilterCfg;
use crate::error::{Result, SenseError};
use crate::filter::{FilterBuffer, effective_count};
use crate::hw_error::map_hw_error;

/// Result of one filtered read, with the bookkeeping behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Denoised distance, `None` when the read failed.
    pub value: Option<u16>,
    /// Acquisitions attempted.
    pub attempts: usize,
    /// Acquisitions that produced a valid sample.
    pub got: usize,
    /// Last acquisition failure seen during the read, if any.
    pub last_error: Option<SenseError>,
}

impl ReadOutcome {
    fn not_initialized() -> Self {
        Self {
            value: None,
            attempts: 0,
            got: 0,
            last_error: Some(SenseError::NotInitialized),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.value.is_some()
    }
}

pub struct SamplingFrontEnd<R, C = MonotonicClock> {
    source: R,
    clock: C,
    cfg: FilterCfg,
    count: usize,
    initialized: bool,
}

impl<R: RangingSource> SamplingFrontEnd<R, MonotonicClock> {
    /// Front-end pausing on the real monotonic clock.
    pub fn new(source: R, cfg: FilterCfg) -> Self {
        Self::with_clock(source, cfg, MonotonicClock::new())
    }
}

impl<R: RangingSource, C: Clock> SamplingFrontEnd<R, C> {
    pub fn with_clock(source: R, cfg: FilterCfg, clock: C) -> Self {
        Self {
            source,
            clock,
            count: effective_count(cfg.median_count),
            cfg,
            initialized: false,
        }
    }

    /// Bring the ranging source up. Reads fail until this succeeds.
    pub fn begin(&mut self) -> Result<()> {
        match self.source.begin() {
            Ok(()) => {
                self.initialized = true;
                debug!(acquisitions_per_read = self.count, "ranging source ready");
                Ok(())
            }
            Err(e) => {
                self.initialized = false;
                let mapped = map_hw_error(&*e);
                warn!(error = %mapped, "ranging source bring-up failed");
                Err(eyre::Report::new(mapped)).wrap_err("ranging source begin")
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Acquisitions each read will attempt (1 means passthrough).
    pub fn effective_count(&self) -> usize {
        self.count
    }

    pub fn cfg(&self) -> &FilterCfg {
        &self.cfg
    }

    /// One denoised distance in millimeters, or `None` on failure.
    pub fn read(&mut self) -> Option<u16> {
        self.read_detailed().value
    }

    pub fn read_detailed(&mut self) -> ReadOutcome {
        if !self.initialized {
            return ReadOutcome::not_initialized();
        }

        if self.count == 1 {
            return match self.source.acquire_once() {
                Ok(mm) => ReadOutcome {
                    value: Some(mm),
                    attempts: 1,
                    got: 1,
                    last_error: None,
                },
                Err(e) => ReadOutcome {
                    value: None,
                    attempts: 1,
                    got: 0,
                    last_error: Some(map_hw_error(&*e)),
                },
            };
        }

        let mut buf = FilterBuffer::new();
        let mut last_error = None;
        for attempt in 0..self.count {
            match self.source.acquire_once() {
                Ok(mm) => {
                    let kept = buf.push(mm);
                    debug_assert!(kept, "read burst exceeded K_MAX");
                }
                Err(e) => {
                    let mapped = map_hw_error(&*e);
                    trace!(attempt, error = %mapped, "acquisition failed");
                    last_error = Some(mapped);
                    self.clock.sleep(self.cfg.retry_pause);
                }
            }
            self.clock.sleep(self.cfg.settle_pause);
        }

        let got = buf.len();
        let value = buf.median();
        trace!(got, attempts = self.count, ?value, "filtered read");
        ReadOutcome {
            value,
            attempts: self.count,
            got,
            last_error,
        }
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_source(self) -> R {
        self.source
    }
}
