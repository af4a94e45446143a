//! Type-state builder for `SensingChannel` and generic `build_channel`
//! constructor.
//!
//! The builder enforces at compile time that a ranging source is provided
//! before `build()` is available. `try_build()` is always available for
//! dynamic checks.

use std::marker::PhantomData;

use repwatch_traits::RangingSource;
use repwatch_traits::clock::{Clock, MonotonicClock};

use crate::channel::SensingChannel;
use crate::config::{ChannelCfg, DetectorParams, FilterCfg};
use crate::detector::TrendDetector;
use crate::error::{BuildError, Result};
use crate::frontend::SamplingFrontEnd;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `SensingChannel`. Parameters are validated on build.
pub struct ChannelBuilder<R, C, S> {
    source: Option<R>,
    clock: C,
    filter: Option<FilterCfg>,
    detector: Option<DetectorParams>,
    channel: Option<ChannelCfg>,
    _s: PhantomData<S>,
}

impl<R> Default for ChannelBuilder<R, MonotonicClock, Missing> {
    fn default() -> Self {
        Self {
            source: None,
            clock: MonotonicClock::new(),
            filter: None,
            detector: None,
            channel: None,
            _s: PhantomData,
        }
    }
}

impl<R: RangingSource> SensingChannel<R, MonotonicClock> {
    /// Start building a channel.
    pub fn builder() -> ChannelBuilder<R, MonotonicClock, Missing> {
        ChannelBuilder::default()
    }
}

impl<R, C, S> ChannelBuilder<R, C, S> {
    pub fn with_source(self, source: R) -> ChannelBuilder<R, C, Set> {
        ChannelBuilder {
            source: Some(source),
            clock: self.clock,
            filter: self.filter,
            detector: self.detector,
            channel: self.channel,
            _s: PhantomData,
        }
    }

    /// Clock used for the pauses inside a filtered read.
    pub fn with_clock<C2>(self, clock: C2) -> ChannelBuilder<R, C2, S> {
        ChannelBuilder {
            source: self.source,
            clock,
            filter: self.filter,
            detector: self.detector,
            channel: self.channel,
            _s: PhantomData,
        }
    }

    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_detector(mut self, params: DetectorParams) -> Self {
        self.detector = Some(params);
        self
    }

    pub fn with_channel_cfg(mut self, cfg: ChannelCfg) -> Self {
        self.channel = Some(cfg);
        self
    }

    /// Take everything from a parsed TOML config.
    pub fn apply_config(self, cfg: &repwatch_config::Config) -> Self {
        self.with_filter(cfg.into())
            .with_detector((&cfg.detector).into())
            .with_channel_cfg(cfg.into())
    }

    /// Build without the compile-time source check.
    pub fn try_build(self) -> Result<SensingChannel<R, C>>
    where
        R: RangingSource,
        C: Clock,
    {
        let source = self
            .source
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSource))?;
        validate_and_build(
            source,
            self.clock,
            self.filter.unwrap_or_default(),
            self.detector.unwrap_or_default(),
            self.channel.unwrap_or_default(),
        )
    }
}

impl<R: RangingSource, C: Clock> ChannelBuilder<R, C, Set> {
    pub fn build(self) -> Result<SensingChannel<R, C>> {
        self.try_build()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Validate parameters and construct the channel.
///
/// Single source of truth for validation, used by both
/// `ChannelBuilder::try_build()` and `build_channel()`.
fn validate_and_build<R: RangingSource, C: Clock>(
    source: R,
    clock: C,
    filter: FilterCfg,
    params: DetectorParams,
    cfg: ChannelCfg,
) -> Result<SensingChannel<R, C>> {
    if filter.median_count == 0 {
        return Err(invalid("median_count must be >= 1"));
    }
    if params.noise_threshold_mm == 0 {
        return Err(invalid("noise_threshold_mm must be >= 1"));
    }
    if params.max_range_mm == 0 {
        return Err(invalid("max_range_mm must be >= 1"));
    }
    if params.noise_threshold_mm >= params.max_range_mm {
        return Err(invalid("noise_threshold_mm must be below max_range_mm"));
    }
    if cfg.poll_hz == 0 {
        return Err(invalid("poll_hz must be > 0"));
    }
    if cfg.measure_timeout.is_zero() {
        return Err(invalid("measure_timeout must be > 0"));
    }

    let frontend = SamplingFrontEnd::with_clock(source, filter, clock);
    Ok(SensingChannel::from_parts(
        frontend,
        TrendDetector::new(params),
        cfg,
    ))
}

/// Generic constructor mirroring the builder, for callers that already hold
/// every part.
pub fn build_channel<R: RangingSource, C: Clock>(
    source: R,
    clock: C,
    filter: FilterCfg,
    params: DetectorParams,
    cfg: ChannelCfg,
) -> Result<SensingChannel<R, C>> {
    validate_and_build(source, clock, filter, params, cfg)
}
