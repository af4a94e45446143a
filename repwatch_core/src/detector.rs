//! Hysteresis trend detector.
//!
//! Turns a stream of denoised distances into discrete "excursion complete"
//! events. The machine runs Idle → Down → Up → Down → … and fires exactly on
//! each Down → Up transition whose rebound from the trough is at least
//! `noise_threshold_mm`. The same threshold gates phase entry and suppresses
//! chatter on small reversals.
//!
//! ```text
//!   Idle --(fell >= noise)--> Down --(rose >= noise from trough)--> Up [event]
//!                              ^                                    |
//!                              +------(fell >= noise from peak)-----+
//! ```

use crate::config::DetectorParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Down,
    Up,
}

/// Read-only view of the detector state, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub phase: Phase,
    /// Last accepted distance.
    pub last: u16,
    /// Trough of the current excursion.
    pub minv: u16,
    /// Peak of the current excursion.
    pub maxv: u16,
}

#[derive(Debug, Clone, Default)]
pub struct TrendDetector {
    params: DetectorParams,
    snap: Snapshot,
    seeded: bool,
}

impl TrendDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self {
            params,
            snap: Snapshot::default(),
            seeded: false,
        }
    }

    /// Back to the construction state; the next accepted sample seeds.
    pub fn reset(&mut self) {
        self.snap = Snapshot::default();
        self.seeded = false;
    }

    pub fn params(&self) -> DetectorParams {
        self.params
    }

    pub fn state(&self) -> &Snapshot {
        &self.snap
    }

    pub fn phase(&self) -> Phase {
        self.snap.phase
    }

    /// Whether a first sample has been accepted since construction/reset.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Whether `d` would be processed rather than dropped as out of range.
    #[inline]
    pub fn accepts(&self, d: u16) -> bool {
        d != 0 && d <= self.params.max_range_mm
    }

    /// Feed one denoised distance. Returns true exactly when a Down → Up
    /// transition completes an excursion.
    pub fn step(&mut self, d: u16) -> bool {
        if !self.accepts(d) {
            return false;
        }

        if !self.seeded {
            self.snap = Snapshot {
                phase: Phase::Idle,
                last: d,
                minv: d,
                maxv: d,
            };
            self.seeded = true;
            return false;
        }

        // widened so `x + noise` cannot wrap near u16::MAX
        let noise = u32::from(self.params.noise_threshold_mm);
        let dw = u32::from(d);

        match self.snap.phase {
            Phase::Idle => {
                let last = u32::from(self.snap.last);
                if last >= dw && last - dw >= noise {
                    self.snap.phase = Phase::Down;
                    self.snap.minv = d;
                    self.snap.maxv = d;
                }
            }
            Phase::Down => {
                let minv = u32::from(self.snap.minv);
                if dw + noise < minv {
                    self.snap.minv = d;
                } else if dw >= minv + noise {
                    self.snap.phase = Phase::Up;
                    self.snap.maxv = d;
                    self.snap.last = d;
                    return true;
                }
            }
            Phase::Up => {
                let maxv = u32::from(self.snap.maxv);
                if dw > maxv {
                    self.snap.maxv = d;
                } else if maxv - dw >= noise {
                    self.snap.phase = Phase::Down;
                    self.snap.minv = d;
                }
            }
        }

        self.snap.last = d;
        false
    }
}
