//! Runtime configuration types for the sensing channel.
//!
//! These are the structs the front-end, detector and channel are built from.
//! They are separate from the TOML-deserialized config in `repwatch_config`.

use std::time::Duration;

/// Sampling front-end configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCfg {
    /// Requested acquisitions per read. Only odd values >= 3 enable the
    /// median; see `filter::effective_count`.
    pub median_count: u8,
    /// Pause after a failed acquisition.
    pub retry_pause: Duration,
    /// Pause after every acquisition of a multi-sample read.
    pub settle_pause: Duration,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            median_count: 3,
            retry_pause: Duration::from_millis(5),
            settle_pause: Duration::from_millis(2),
        }
    }
}

/// Trend detector parameters. Immutable once the detector is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorParams {
    /// Minimum reversal counted as movement; also the hysteresis band.
    pub noise_threshold_mm: u16,
    /// Readings above this are treated as out of range and dropped.
    pub max_range_mm: u16,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            noise_threshold_mm: 20,
            max_range_mm: 2000,
        }
    }
}

/// Channel-level settings that sit around the two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCfg {
    /// Readings at or below this distance count as a touch.
    pub touch_threshold_mm: u16,
    /// Polling rate used by the runner and the monitor.
    pub poll_hz: u32,
    /// Longest a single acquisition may wait for the sensor's data-ready
    /// line before it counts as failed.
    pub measure_timeout: Duration,
}

impl Default for ChannelCfg {
    fn default() -> Self {
        Self {
            touch_threshold_mm: 40,
            poll_hz: 20,
            measure_timeout: Duration::from_millis(200),
        }
    }
}
