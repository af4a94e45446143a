//! Hardware seams for the ranging channel.
//!
//! Everything that touches a physical sensor or the passage of time goes
//! through the traits in this crate, so the filtering and detection logic in
//! `repwatch_core` can be driven by scripted sources and a manual clock.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Boxed error used at the trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A time-of-flight style distance sensor.
pub trait RangingSource {
    /// Bring the sensor up (reset line, bus, firmware boot).
    ///
    /// Sources that need no bring-up keep the default.
    fn begin(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Perform exactly one physical measurement in millimeters.
    ///
    /// Returns an error for "no target", out-of-range and sensor faults. Must
    /// not block indefinitely.
    fn acquire_once(&mut self) -> Result<u16, BoxError>;
}

impl<T: RangingSource + ?Sized> RangingSource for Box<T> {
    fn begin(&mut self) -> Result<(), BoxError> {
        (**self).begin()
    }

    fn acquire_once(&mut self) -> Result<u16, BoxError> {
        (**self).acquire_once()
    }
}
