//! `From` implementations bridging `repwatch_config` types to core types.

use std::time::Duration;

use crate::config::{ChannelCfg, DetectorParams, FilterCfg};

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&repwatch_config::Config> for FilterCfg {
    fn from(c: &repwatch_config::Config) -> Self {
        Self {
            median_count: c.sensor.median_count,
            retry_pause: Duration::from_millis(c.sampling.retry_pause_ms),
            settle_pause: Duration::from_millis(c.sampling.settle_pause_ms),
        }
    }
}

// ── DetectorParams ───────────────────────────────────────────────────────────

impl From<&repwatch_config::DetectorCfg> for DetectorParams {
    fn from(c: &repwatch_config::DetectorCfg) -> Self {
        Self {
            noise_threshold_mm: c.noise_threshold_mm,
            max_range_mm: c.max_range_mm,
        }
    }
}

// ── ChannelCfg ───────────────────────────────────────────────────────────────

impl From<&repwatch_config::Config> for ChannelCfg {
    fn from(c: &repwatch_config::Config) -> Self {
        Self {
            touch_threshold_mm: c.sensor.touch_threshold_mm,
            poll_hz: c.sampling.poll_hz,
            measure_timeout: Duration::from_millis(c.sensor.measure_timeout_ms),
        }
    }
}
