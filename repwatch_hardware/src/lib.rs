//! Ranging sources for the repwatch channel.
//!
//! The bench and CI builds have no sensor attached, so this crate provides
//! simulated sources implementing `repwatch_traits::RangingSource`:
//!
//! - `ScriptedRanging` replays a fixed list of acquisitions (traces, tests)
//! - `SyntheticReps` generates noisy down-then-up excursions
//! - `ReadyGated` waits on an active-low data-ready line before each read
//! - `simulated_ready_line` stands in for that line, optionally going dead
pub mod error;
pub mod util;

use std::time::Duration;

use repwatch_traits::{BoxError, RangingSource};
use tracing::trace;

use crate::error::HwError;

/// Replays a scripted sequence of acquisitions.
///
/// `None` entries report "no target". Once the script is exhausted every
/// further acquisition reports `OutOfRange`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRanging {
    script: Vec<Option<u16>>,
    idx: usize,
    fail_begin: bool,
    begun: bool,
}

impl ScriptedRanging {
    pub fn new(script: impl IntoIterator<Item = Option<u16>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Script made only of valid readings.
    pub fn from_mm(values: impl IntoIterator<Item = u16>) -> Self {
        Self::new(values.into_iter().map(Some))
    }

    /// Make `begin()` fail, as a sensor that never answers on the bus would.
    pub fn failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    /// Number of acquisitions performed so far.
    pub fn acquisitions(&self) -> usize {
        self.idx
    }

    pub fn remaining(&self) -> usize {
        self.script.len().saturating_sub(self.idx)
    }

    pub fn begun(&self) -> bool {
        self.begun
    }
}

impl RangingSource for ScriptedRanging {
    fn begin(&mut self) -> Result<(), BoxError> {
        if self.fail_begin {
            return Err(Box::new(HwError::Boot("sensor did not answer".into())));
        }
        self.begun = true;
        Ok(())
    }

    fn acquire_once(&mut self) -> Result<u16, BoxError> {
        let slot = self.script.get(self.idx).copied();
        self.idx = self.idx.saturating_add(1);
        match slot.flatten() {
            Some(mm) => {
                trace!(mm, "scripted acquisition");
                Ok(mm)
            }
            None => Err(Box::new(HwError::OutOfRange)),
        }
    }
}

/// Shape of the simulated movement.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticRepsCfg {
    /// Resting distance between repetitions.
    pub baseline_mm: u16,
    /// How far each repetition travels towards the sensor.
    pub depth_mm: u16,
    /// Distance covered per acquisition while moving.
    pub step_mm: u16,
    /// Acquisitions spent at rest before each repetition.
    pub rest_samples: u32,
    /// Number of repetitions; afterwards the target stays at rest.
    pub reps: u32,
    /// Uniform noise amplitude added to every reading.
    pub jitter_mm: u16,
    /// Every n-th acquisition reports no target (0 disables).
    pub glitch_every: u32,
    pub seed: u32,
}

impl Default for SyntheticRepsCfg {
    fn default() -> Self {
        Self {
            baseline_mm: 800,
            depth_mm: 300,
            step_mm: 25,
            rest_samples: 6,
            reps: 5,
            jitter_mm: 4,
            glitch_every: 0,
            seed: 0xC0FFEE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Rest(u32),
    Down,
    Up,
    Done,
}

/// Deterministic generator of noisy repetitions.
#[derive(Debug, Clone)]
pub struct SyntheticReps {
    cfg: SyntheticRepsCfg,
    leg: Leg,
    pos: u16,
    reps_done: u32,
    acquisitions: u32,
    rng: u32,
}

impl SyntheticReps {
    pub fn new(cfg: SyntheticRepsCfg) -> Self {
        Self {
            leg: Leg::Rest(cfg.rest_samples),
            pos: cfg.baseline_mm,
            reps_done: 0,
            acquisitions: 0,
            rng: cfg.seed.max(1),
            cfg,
        }
    }

    /// Repetitions whose up-leg has fully returned to the baseline.
    pub fn reps_done(&self) -> u32 {
        self.reps_done
    }

    pub fn finished(&self) -> bool {
        self.leg == Leg::Done
    }

    fn bottom(&self) -> u16 {
        self.cfg
            .baseline_mm
            .saturating_sub(self.cfg.depth_mm)
            .max(1)
    }

    fn next_position(&mut self) -> u16 {
        let step = self.cfg.step_mm.max(1);
        loop {
            match self.leg {
                Leg::Rest(0) => {
                    self.leg = if self.reps_done < self.cfg.reps {
                        Leg::Down
                    } else {
                        Leg::Done
                    };
                }
                Leg::Rest(n) => {
                    self.leg = Leg::Rest(n - 1);
                    return self.cfg.baseline_mm;
                }
                Leg::Down => {
                    let bottom = self.bottom();
                    self.pos = self.pos.saturating_sub(step).max(bottom);
                    if self.pos == bottom {
                        self.leg = Leg::Up;
                    }
                    return self.pos;
                }
                Leg::Up => {
                    self.pos = self.pos.saturating_add(step).min(self.cfg.baseline_mm);
                    if self.pos == self.cfg.baseline_mm {
                        self.reps_done += 1;
                        self.leg = Leg::Rest(self.cfg.rest_samples);
                    }
                    return self.pos;
                }
                Leg::Done => return self.cfg.baseline_mm,
            }
        }
    }

    // xorshift32
    fn next_noise(&mut self) -> i32 {
        let amp = i32::from(self.cfg.jitter_mm);
        if amp == 0 {
            return 0;
        }
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        let span = u32::try_from(2 * amp + 1).unwrap_or(1);
        i32::try_from(x % span).unwrap_or(0) - amp
    }
}

impl RangingSource for SyntheticReps {
    fn acquire_once(&mut self) -> Result<u16, BoxError> {
        self.acquisitions = self.acquisitions.wrapping_add(1);
        let pos = self.next_position();
        let noise = self.next_noise();
        if self.cfg.glitch_every > 0 && self.acquisitions % self.cfg.glitch_every == 0 {
            trace!(pos, "synthetic glitch");
            return Err(Box::new(HwError::OutOfRange));
        }
        let mm = (i32::from(pos) + noise).clamp(1, i32::from(u16::MAX));
        let mm = u16::try_from(mm).unwrap_or(pos);
        trace!(mm, pos, "synthetic acquisition");
        Ok(mm)
    }
}

/// Gates each acquisition on an active-low data-ready line (the sensor's
/// GPIO1 interrupt output).
pub struct ReadyGated<R, F> {
    inner: R,
    is_high: F,
    timeout: Duration,
    poll_interval: Duration,
}

impl<R, F> ReadyGated<R, F>
where
    R: RangingSource,
    F: FnMut() -> bool,
{
    pub fn new(inner: R, is_high: F, timeout: Duration) -> Self {
        Self {
            inner,
            is_high,
            timeout,
            poll_interval: Duration::from_micros(200),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Level reader for a simulated data-ready line, for use with `ReadyGated`.
///
/// The line reports ready (low) on every check until `stall_after` checks
/// have been answered; after that it stays high for good, like a sensor that
/// stopped converting. `None` never stalls.
pub fn simulated_ready_line(stall_after: Option<u32>) -> impl FnMut() -> bool {
    let mut answered: u32 = 0;
    move || match stall_after {
        Some(limit) if answered >= limit => true,
        _ => {
            answered = answered.saturating_add(1);
            false
        }
    }
}

impl<R, F> RangingSource for ReadyGated<R, F>
where
    R: RangingSource,
    F: FnMut() -> bool,
{
    fn begin(&mut self) -> Result<(), BoxError> {
        self.inner.begin()
    }

    fn acquire_once(&mut self) -> Result<u16, BoxError> {
        util::wait_until_low_with_timeout(&mut self.is_high, self.timeout, self.poll_interval)?;
        self.inner.acquire_once()
    }
}
