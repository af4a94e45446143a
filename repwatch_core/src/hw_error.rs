//! Maps `Box<dyn Error>` from trait boundaries to typed `SenseError`.
//!
//! `RangingSource` uses `Box<dyn Error + Send + Sync>` so any driver can sit
//! behind it; this module converts those to our typed error enum, with an
//! optional feature-gated path for `repwatch_hardware::HwError` downcasting.

use crate::error::SenseError;

/// Map a trait-boundary error to a typed `SenseError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SenseError {
    #[cfg(feature = "hardware-errors")]
    {
        use repwatch_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Boot(msg) => SenseError::Boot(msg.clone()),
                HwError::OutOfRange => SenseError::NoTarget,
                HwError::DataReadyTimeout => SenseError::Timeout,
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") {
        SenseError::Timeout
    } else if lower.contains("out of range") || lower.contains("no target") {
        SenseError::NoTarget
    } else {
        SenseError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_errors_fall_back_to_heuristics() {
        let e: Box<dyn std::error::Error + Send + Sync> = "i2c timeout".into();
        assert_eq!(map_hw_error(&*e), SenseError::Timeout);
        let e: Box<dyn std::error::Error + Send + Sync> = "target out of range".into();
        assert_eq!(map_hw_error(&*e), SenseError::NoTarget);
        let e: Box<dyn std::error::Error + Send + Sync> = "bus arbitration lost".into();
        assert_eq!(
            map_hw_error(&*e),
            SenseError::Hardware("bus arbitration lost".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hardware_errors_map_precisely() {
        use repwatch_hardware::error::HwError;
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::Boot("nack".into()));
        assert_eq!(map_hw_error(&*e), SenseError::Boot("nack".into()));
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::OutOfRange);
        assert_eq!(map_hw_error(&*e), SenseError::NoTarget);
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::DataReadyTimeout);
        assert_eq!(map_hw_error(&*e), SenseError::Timeout);
    }
}
