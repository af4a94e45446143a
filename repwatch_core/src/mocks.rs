//! Test and helper mocks for repwatch_core

/// A ranging source whose every acquisition fails with "no target in range".
pub struct NoTargetSource;

impl repwatch_traits::RangingSource for NoTargetSource {
    fn acquire_once(&mut self) -> Result<u16, repwatch_traits::BoxError> {
        Err(Box::new(std::io::Error::other("no target in range")))
    }
}
