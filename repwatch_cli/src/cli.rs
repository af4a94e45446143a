//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "repwatch", version, about = "Distance excursion detector")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit events and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Detector/filter knobs that may override the config file.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct Tuning {
    /// Acquisitions per filtered read (odd >= 3 enables the median)
    #[arg(long, value_name = "N")]
    pub median: Option<u8>,
    /// Noise threshold / hysteresis band in millimeters
    #[arg(long, value_name = "MM")]
    pub noise_mm: Option<u16>,
    /// Readings beyond this distance are ignored
    #[arg(long, value_name = "MM")]
    pub max_range_mm: Option<u16>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a recorded distance trace (CSV with `mm` or `mm,ok` header) through the detector
    Replay {
        /// Trace file
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Drive the detector with a synthetic sensor performing repetitions
    Simulate {
        /// Number of repetitions to perform
        #[arg(long, default_value_t = 5)]
        reps: u32,
        /// Travel of each repetition in millimeters
        #[arg(long, default_value_t = 300)]
        depth_mm: u16,
        /// Noise amplitude added to every acquisition
        #[arg(long, default_value_t = 4)]
        jitter_mm: u16,
        /// Every n-th acquisition reports no target (0 disables)
        #[arg(long, default_value_t = 0)]
        glitch_every: u32,
        /// PRNG seed for the noise
        #[arg(long, default_value_t = 0xC0FFEE)]
        seed: u32,
        /// Pace the loop on the wall clock at sampling.poll_hz
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
        /// The sensor's data-ready line goes dead after N acquisitions; each
        /// later acquisition fails after sensor.measure_timeout_ms
        #[arg(long, value_name = "N")]
        stall_after: Option<u32>,
        /// Stop after this many cycles (needed with --stall-after)
        #[arg(long, value_name = "N")]
        max_cycles: Option<u64>,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Quick health check of the filter/detector chain against the simulator
    SelfCheck,
}
