//! Outcome of one sensing cycle.

/// Public status of a single `poll()` of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// Every acquisition of the read failed; the detector was not stepped.
    NoReading,
    /// A denoised distance was fed to the detector.
    Reading {
        mm: u16,
        /// An excursion completed on this cycle.
        event: bool,
    },
}

impl Cycle {
    pub fn fired(&self) -> bool {
        matches!(self, Cycle::Reading { event: true, .. })
    }

    pub fn distance(&self) -> Option<u16> {
        match self {
            Cycle::Reading { mm, .. } => Some(*mm),
            Cycle::NoReading => None,
        }
    }
}
