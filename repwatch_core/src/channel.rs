//! One physical sensing channel: front-end feeding a trend detector.
//!
//! A channel owns its front-end and detector outright. Several sensors mean
//! several channels; nothing is shared between them.
use repwatch_traits::RangingSource;
use repwatch_traits::clock::{Clock, MonotonicClock};
use tracing::{debug, info, trace};

use crate::config::{ChannelCfg, DetectorParams};
use crate::detector::{Snapshot, TrendDetector};
use crate::error::Result;
use crate::frontend::SamplingFrontEnd;
use crate::status::Cycle;

/// Running counters of a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// `poll()` calls.
    pub cycles: u64,
    /// Reads where every acquisition failed.
    pub failed_reads: u64,
    /// Readings the detector dropped as out of range.
    pub rejected: u64,
    /// Completed excursions.
    pub events: u64,
}

pub struct SensingChannel<R, C = MonotonicClock> {
    frontend: SamplingFrontEnd<R, C>,
    detector: TrendDetector,
    cfg: ChannelCfg,
    stats: ChannelStats,
    last_mm: Option<u16>,
}

impl<R: RangingSource, C: Clock> SensingChannel<R, C> {
    /// Assemble a channel from already-built parts. Prefer
    /// `ChannelBuilder` which validates the parameters first.
    pub fn from_parts(
        frontend: SamplingFrontEnd<R, C>,
        detector: TrendDetector,
        cfg: ChannelCfg,
    ) -> Self {
        Self {
            frontend,
            detector,
            cfg,
            stats: ChannelStats::default(),
            last_mm: None,
        }
    }

    /// Bring up the ranging source.
    pub fn begin(&mut self) -> Result<()> {
        self.frontend.begin()
    }

    /// One read → step cycle.
    pub fn poll(&mut self) -> Cycle {
        self.stats.cycles += 1;
        let outcome = self.frontend.read_detailed();
        let Some(mm) = outcome.value else {
            self.stats.failed_reads += 1;
            debug!(
                cycle = self.stats.cycles,
                attempts = outcome.attempts,
                error = ?outcome.last_error,
                "no reading"
            );
            return Cycle::NoReading;
        };

        self.last_mm = Some(mm);
        if !self.detector.accepts(mm) {
            self.stats.rejected += 1;
            trace!(mm, "reading out of range, dropped");
        }
        let event = self.detector.step(mm);
        if event {
            self.stats.events += 1;
            let snap = self.detector.state();
            info!(
                mm,
                trough_mm = snap.minv,
                events = self.stats.events,
                "excursion complete"
            );
        } else {
            trace!(mm, phase = ?self.detector.phase(), got = outcome.got, "cycle");
        }
        Cycle::Reading { mm, event }
    }

    /// Reset detector state and counters; the source stays initialized.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.stats = ChannelStats::default();
        self.last_mm = None;
    }

    /// Whether a distance counts as a touch (at or below the threshold).
    pub fn is_touch(&self, mm: u16) -> bool {
        mm != 0 && mm <= self.cfg.touch_threshold_mm
    }

    /// Last denoised distance, valid or not for the detector.
    pub fn last_distance(&self) -> Option<u16> {
        self.last_mm
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.detector.state()
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    pub fn params(&self) -> DetectorParams {
        self.detector.params()
    }

    pub fn cfg(&self) -> &ChannelCfg {
        &self.cfg
    }

    pub fn frontend(&self) -> &SamplingFrontEnd<R, C> {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut SamplingFrontEnd<R, C> {
        &mut self.frontend
    }

    pub fn detector(&self) -> &TrendDetector {
        &self.detector
    }
}
