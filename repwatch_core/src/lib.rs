#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Distance-based excursion detection (hardware-agnostic).
//!
//! All sensor access goes through `repwatch_traits::RangingSource`; all
//! pauses go through `repwatch_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Filtering**: fixed-capacity median of up to 7 acquisitions (`filter`, `frontend`)
//! - **Detection**: Idle/Down/Up hysteresis machine (`detector`)
//! - **Channel**: one front-end feeding one detector, with counters (`channel`)
//! - **Orchestration**: paced loop (`runner`) and background thread (`monitor`)
//! - **Configuration**: runtime config structs and TOML conversions (`config`, `conversions`)

pub mod builder;
pub mod channel;
pub mod config;
pub mod conversions;
pub mod detector;
pub mod error;
pub mod filter;
pub mod frontend;
pub mod hw_error;
pub mod mocks;
pub mod monitor;
pub mod runner;
pub mod status;
pub mod util;

pub use builder::{ChannelBuilder, build_channel};
pub use channel::{ChannelStats, SensingChannel};
pub use config::{ChannelCfg, DetectorParams, FilterCfg};
pub use detector::{Phase, Snapshot, TrendDetector};
pub use filter::{FilterBuffer, K_MAX, effective_count};
pub use frontend::{ReadOutcome, SamplingFrontEnd};
pub use status::Cycle;
