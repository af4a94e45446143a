#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and distance-trace parsing for the ranging channel.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Trace CSV loader enforces headers and turns each row into one raw
//!   acquisition (`None` for a failed one) for offline replay.
use serde::Deserialize;

/// Largest number of acquisitions a single filtered read may take.
pub const MEDIAN_CAP: u8 = 7;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// Acquisitions per filtered read. Odd values >= 3 enable the median,
    /// anything else degrades to a single read. Capped at 7.
    pub median_count: u8,
    /// Distance at or below which a reading counts as a touch
    pub touch_threshold_mm: u16,
    /// Max time one acquisition waits on the data-ready line
    pub measure_timeout_ms: u64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            median_count: 3,
            touch_threshold_mm: 40,
            measure_timeout_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorCfg {
    /// Minimum excursion depth, also the hysteresis band
    pub noise_threshold_mm: u16,
    /// Readings beyond this are dropped
    pub max_range_mm: u16,
}

impl Default for DetectorCfg {
    fn default() -> Self {
        Self {
            noise_threshold_mm: 20,
            max_range_mm: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingCfg {
    /// Polling rate of the read/step cycle
    pub poll_hz: u32,
    /// Pause after a failed acquisition inside a filtered read
    pub retry_pause_ms: u64,
    /// Pause after every acquisition inside a filtered read
    pub settle_pause_ms: u64,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            poll_hz: 20,
            retry_pause_ms: 5,
            settle_pause_ms: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorCfg,
    pub detector: DetectorCfg,
    pub sampling: SamplingCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

const MAX_PAUSE_MS: u64 = 1000;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if self.sensor.median_count == 0 {
            eyre::bail!("sensor.median_count must be >= 1");
        }
        if self.sensor.measure_timeout_ms == 0 {
            eyre::bail!("sensor.measure_timeout_ms must be >= 1");
        }

        // Detector
        if self.detector.noise_threshold_mm == 0 {
            eyre::bail!("detector.noise_threshold_mm must be >= 1");
        }
        if self.detector.max_range_mm == 0 {
            eyre::bail!("detector.max_range_mm must be >= 1");
        }
        if self.detector.noise_threshold_mm >= self.detector.max_range_mm {
            eyre::bail!("detector.noise_threshold_mm must be below detector.max_range_mm");
        }

        // Sampling
        if self.sampling.poll_hz == 0 {
            eyre::bail!("sampling.poll_hz must be > 0");
        }
        if self.sampling.retry_pause_ms > MAX_PAUSE_MS {
            eyre::bail!("sampling.retry_pause_ms is unreasonably large (>1s)");
        }
        if self.sampling.settle_pause_ms > MAX_PAUSE_MS {
            eyre::bail!("sampling.settle_pause_ms is unreasonably large (>1s)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref() {
            if !matches!(rot, "never" | "daily" | "hourly") {
                eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot}");
            }
        }

        Ok(())
    }

    /// Acquisitions a filtered read will actually take for this config.
    pub fn effective_median_count(&self) -> u8 {
        effective_median(self.sensor.median_count)
    }
}

/// Acquisitions a filtered read takes for a requested `median_count`.
///
/// Only an odd count of at least 3 enables the median, clipped to
/// `MEDIAN_CAP`; 0, 1 and every even value mean a single passthrough read.
pub const fn effective_median(median_count: u8) -> u8 {
    if median_count <= 1 || median_count % 2 == 0 {
        1
    } else if median_count > MEDIAN_CAP {
        MEDIAN_CAP
    } else {
        median_count
    }
}

/// One row of a recorded distance trace.
///
/// Expected headers: `mm` or `mm,ok`. An empty `mm` or `ok=false` marks a
/// failed acquisition.
///
/// Example:
/// mm,ok
/// 1000,true
/// ,false
/// 950,true
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TraceRow {
    pub mm: Option<u16>,
    pub ok: Option<bool>,
}

impl TraceRow {
    pub fn acquisition(self) -> Option<u16> {
        match self.ok {
            Some(false) => None,
            _ => self.mm,
        }
    }
}

pub fn parse_trace<R: std::io::Read>(reader: R) -> eyre::Result<Vec<Option<u16>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read trace headers: {}", e))?
        .clone();
    let actual: Vec<&str> = headers.iter().collect();
    if actual != ["mm"] && actual != ["mm", "ok"] {
        eyre::bail!(
            "trace CSV must have headers 'mm' or 'mm,ok', got: {}",
            actual.join(",")
        );
    }

    let mut out = Vec::new();
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        match rec {
            Ok(row) => out.push(row.acquisition()),
            Err(e) => {
                eyre::bail!("invalid trace row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(out)
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<Option<u16>>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;
    parse_trace(file)
}
