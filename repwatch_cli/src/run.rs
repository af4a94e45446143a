//! Command implementations: config loading, replay, simulate and self-check.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use eyre::{Result, WrapErr, bail};
use repwatch_config::Config;
use repwatch_core::runner::{RunParams, StopReason, run_cycles};
use repwatch_core::{ChannelCfg, ChannelStats, Cycle, SensingChannel};
use repwatch_hardware::{
    ReadyGated, ScriptedRanging, SyntheticReps, SyntheticRepsCfg, simulated_ready_line,
};
use repwatch_traits::RangingSource;
use repwatch_traits::clock::{Clock, ManualClock, MonotonicClock};
use serde_json::json;

use crate::cli::Tuning;

/// Repetitions the self-check expects the simulator to produce.
const SELF_CHECK_REPS: u32 = 3;

/// Where event and summary lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Human,
    Json,
}

/// Read and validate the config; built-in defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .wrap_err_with(|| format!("read config {}", p.display()))?;
            repwatch_config::load_toml(&text)
                .map_err(|e| eyre::eyre!("parse config {}: {e}", p.display()))?
        }
        None => Config::default(),
    };
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// Apply command-line overrides on top of the file config and re-validate.
pub fn tuned(cfg: &Config, t: Tuning) -> Result<Config> {
    let mut cfg = cfg.clone();
    if let Some(n) = t.median {
        cfg.sensor.median_count = n;
    }
    if let Some(n) = t.noise_mm {
        cfg.detector.noise_threshold_mm = n;
    }
    if let Some(n) = t.max_range_mm {
        cfg.detector.max_range_mm = n;
    }
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

pub fn replay(
    cfg: &Config,
    trace: &Path,
    out: Output,
    shutdown: &AtomicBool,
) -> Result<ChannelStats> {
    let script = repwatch_config::load_trace_csv(trace)?;
    tracing::info!(rows = script.len(), trace = %trace.display(), "replaying trace");

    let clock = ManualClock::new();
    let mut channel = SensingChannel::<ScriptedRanging>::builder()
        .with_source(ScriptedRanging::new(script))
        .with_clock(clock.clone())
        .apply_config(cfg)
        .build()?;
    channel.begin()?;

    let params = RunParams::from(channel.cfg());
    let (reason, stats) = drive(
        &mut channel,
        &clock,
        params,
        shutdown,
        out,
        |ch| ch.frontend().source().remaining() == 0,
    );
    summary(&stats, reason, "trace exhausted", out);
    Ok(stats)
}

#[derive(Debug, Clone, Copy)]
pub struct SimArgs {
    pub reps: u32,
    pub depth_mm: u16,
    pub jitter_mm: u16,
    pub glitch_every: u32,
    pub seed: u32,
    pub realtime: bool,
    pub stall_after: Option<u32>,
    pub max_cycles: Option<u64>,
}

pub fn simulate(
    cfg: &Config,
    args: SimArgs,
    out: Output,
    shutdown: &AtomicBool,
) -> Result<ChannelStats> {
    let source = simulated_sensor(
        SyntheticRepsCfg {
            reps: args.reps,
            depth_mm: args.depth_mm,
            jitter_mm: args.jitter_mm,
            glitch_every: args.glitch_every,
            seed: args.seed,
            ..SyntheticRepsCfg::default()
        },
        args.stall_after,
        cfg,
    );
    let params = RunParams {
        max_cycles: args.max_cycles,
        ..RunParams::from(&ChannelCfg::from(cfg))
    };
    tracing::info!(
        reps = args.reps,
        realtime = args.realtime,
        stall_after = ?args.stall_after,
        "starting simulation"
    );

    let (reason, stats) = if args.realtime {
        let clock = MonotonicClock::new();
        let mut channel = SensingChannel::builder()
            .with_source(source)
            .with_clock(clock)
            .apply_config(cfg)
            .build()?;
        channel.begin()?;
        drive(&mut channel, &clock, params, shutdown, out, sim_finished)
    } else {
        let clock = ManualClock::new();
        let mut channel = SensingChannel::builder()
            .with_source(source)
            .with_clock(clock.clone())
            .apply_config(cfg)
            .build()?;
        channel.begin()?;
        drive(&mut channel, &clock, params, shutdown, out, sim_finished)
    };
    summary(&stats, reason, "simulation finished", out);
    Ok(stats)
}

/// Synthetic repetitions behind a simulated data-ready line that waits at
/// most `sensor.measure_timeout_ms` per acquisition.
fn simulated_sensor(
    reps: SyntheticRepsCfg,
    stall_after: Option<u32>,
    cfg: &Config,
) -> ReadyGated<SyntheticReps, impl FnMut() -> bool> {
    let chan = ChannelCfg::from(cfg);
    ReadyGated::new(
        SyntheticReps::new(reps),
        simulated_ready_line(stall_after),
        chan.measure_timeout,
    )
}

fn sim_finished<F, C>(ch: &SensingChannel<ReadyGated<SyntheticReps, F>, C>) -> bool
where
    F: FnMut() -> bool,
    C: Clock,
{
    ch.frontend().source().inner().finished()
}

/// Run a short simulated session through the configured filter and
/// detector and check that every repetition is reported once.
pub fn self_check(cfg: &Config, out: Output) -> Result<()> {
    let clock = ManualClock::new();
    let source = simulated_sensor(
        SyntheticRepsCfg {
            reps: SELF_CHECK_REPS,
            ..SyntheticRepsCfg::default()
        },
        None,
        cfg,
    );
    let mut channel = SensingChannel::builder()
        .with_source(source)
        .with_clock(clock.clone())
        .apply_config(cfg)
        .build()?;
    channel.begin()?;

    let never = AtomicBool::new(false);
    let params = RunParams::from(channel.cfg()).with_max_cycles(100_000);
    let (_, stats) = run_cycles(
        &mut channel,
        &clock,
        params,
        &never,
        |ch, _| {
            if sim_finished(ch) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        },
    );

    if stats.cycles == stats.failed_reads {
        bail!("self-check failed: no readings from the ranging source");
    }
    if stats.events != u64::from(SELF_CHECK_REPS) {
        bail!(
            "self-check failed: expected {SELF_CHECK_REPS} excursions, detected {}",
            stats.events
        );
    }

    match out {
        Output::Json => println!(
            "{}",
            json!({
                "type": "self_check",
                "ok": true,
                "cycles": stats.cycles,
                "events": stats.events,
            })
        ),
        Output::Human => println!(
            "self-check ok: {} excursions over {} cycles",
            stats.events, stats.cycles
        ),
    }
    Ok(())
}

/// Shared polling loop: prints each event and stops once `exhausted` holds.
fn drive<R, C, K>(
    channel: &mut SensingChannel<R, C>,
    pacer: &K,
    params: RunParams,
    shutdown: &AtomicBool,
    out: Output,
    exhausted: impl Fn(&SensingChannel<R, C>) -> bool,
) -> (StopReason, ChannelStats)
where
    R: RangingSource,
    C: Clock,
    K: Clock,
{
    let start = pacer.now();
    run_cycles(channel, pacer, params, shutdown, |ch, cycle| {
        if let Cycle::Reading { mm, event: true } = *cycle {
            let stats = ch.stats();
            let at_ms = pacer.ms_since(start);
            match out {
                Output::Json => println!(
                    "{}",
                    json!({
                        "type": "event",
                        "seq": stats.events,
                        "cycle": stats.cycles,
                        "mm": mm,
                        "at_ms": at_ms,
                    })
                ),
                Output::Human => println!(
                    "event #{} at cycle {} ({} ms): {} mm",
                    stats.events, stats.cycles, at_ms, mm
                ),
            }
        }
        if exhausted(ch) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
}

fn stop_name(reason: StopReason, exhausted: &'static str) -> &'static str {
    match reason {
        StopReason::Shutdown => "interrupted",
        StopReason::MaxCycles => "cycle limit",
        StopReason::Callback => exhausted,
    }
}

fn summary(stats: &ChannelStats, reason: StopReason, exhausted: &'static str, out: Output) {
    let stop = stop_name(reason, exhausted);
    match out {
        Output::Json => println!(
            "{}",
            json!({
                "type": "summary",
                "cycles": stats.cycles,
                "events": stats.events,
                "failed_reads": stats.failed_reads,
                "rejected": stats.rejected,
                "stop": stop,
            })
        ),
        Output::Human => println!(
            "{stop}: {} events, {} cycles, {} failed reads, {} rejected",
            stats.events, stats.cycles, stats.failed_reads, stats.rejected
        ),
    }
}
