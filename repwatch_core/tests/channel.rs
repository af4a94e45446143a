use std::ops::ControlFlow;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use repwatch_core::error::BuildError;
use repwatch_core::mocks::NoTargetSource;
use repwatch_core::runner::{RunParams, StopReason, run_cycles};
use repwatch_core::{
    ChannelCfg, Cycle, DetectorParams, FilterCfg, Phase, SensingChannel, build_channel,
};
use repwatch_hardware::{
    ReadyGated, ScriptedRanging, SyntheticReps, SyntheticRepsCfg, simulated_ready_line,
};
use repwatch_traits::ManualClock;
use rstest::rstest;

fn passthrough() -> FilterCfg {
    FilterCfg {
        median_count: 1,
        ..FilterCfg::default()
    }
}

fn scripted_channel(
    script: Vec<Option<u16>>,
    filter: FilterCfg,
) -> SensingChannel<ScriptedRanging, ManualClock> {
    let mut ch = SensingChannel::builder()
        .with_source(ScriptedRanging::new(script))
        .with_clock(ManualClock::new())
        .with_filter(filter)
        .build()
        .expect("build channel");
    ch.begin().expect("begin");
    ch
}

#[test]
fn builder_missing_source_yields_typed_build_error() {
    let err = SensingChannel::<ScriptedRanging>::builder()
        .try_build()
        .err()
        .expect("should fail with MissingSource");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingSource) => {}
        other => panic!("expected MissingSource, got: {other:?}"),
    }
}

#[rstest]
#[case(FilterCfg { median_count: 0, ..FilterCfg::default() }, DetectorParams::default(), "median_count")]
#[case(FilterCfg::default(), DetectorParams { noise_threshold_mm: 0, max_range_mm: 2000 }, "noise_threshold_mm must be >= 1")]
#[case(FilterCfg::default(), DetectorParams { noise_threshold_mm: 20, max_range_mm: 0 }, "max_range_mm must be >= 1")]
#[case(FilterCfg::default(), DetectorParams { noise_threshold_mm: 50, max_range_mm: 50 }, "below max_range_mm")]
fn invalid_parameters_are_rejected(
    #[case] filter: FilterCfg,
    #[case] params: DetectorParams,
    #[case] needle: &str,
) {
    let err = build_channel(
        ScriptedRanging::default(),
        ManualClock::new(),
        filter,
        params,
        ChannelCfg::default(),
    )
    .err()
    .expect("invalid parameters");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[test]
fn poll_feeds_the_detector_and_counts() {
    let script = [1000, 1000, 950, 900, 850, 900, 960].map(Some).to_vec();
    let mut ch = scripted_channel(script, passthrough());
    let cycles: Vec<Cycle> = (0..7).map(|_| ch.poll()).collect();
    assert_eq!(cycles.iter().filter(|c| c.fired()).count(), 1);
    assert_eq!(cycles[5], Cycle::Reading { mm: 900, event: true });
    let stats = ch.stats();
    assert_eq!(stats.cycles, 7);
    assert_eq!(stats.events, 1);
    assert_eq!(stats.failed_reads, 0);
    assert_eq!(ch.snapshot().phase, Phase::Up);
}

#[test]
fn failed_reads_do_not_step_the_detector() {
    let mut ch = scripted_channel(vec![Some(1000), None, Some(3000)], passthrough());
    ch.poll();
    let before = ch.snapshot();
    assert_eq!(ch.poll(), Cycle::NoReading);
    assert_eq!(ch.snapshot(), before);
    assert_eq!(ch.poll(), Cycle::Reading { mm: 3000, event: false });
    assert_eq!(ch.snapshot(), before);
    let stats = ch.stats();
    assert_eq!(stats.failed_reads, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(ch.last_distance(), Some(3000));
}

#[test]
fn uninitialized_channel_never_reads() {
    let mut ch = SensingChannel::builder()
        .with_source(ScriptedRanging::from_mm([1000]))
        .with_clock(ManualClock::new())
        .build()
        .expect("build");
    assert_eq!(ch.poll(), Cycle::NoReading);
    assert_eq!(ch.frontend().source().acquisitions(), 0);
}

#[test]
fn reset_clears_counters_and_detector() {
    let mut ch = scripted_channel([1000, 900, 950].map(Some).to_vec(), passthrough());
    for _ in 0..3 {
        ch.poll();
    }
    assert_eq!(ch.stats().events, 1);
    ch.reset();
    assert_eq!(ch.stats(), Default::default());
    assert!(!ch.detector().is_seeded());
    assert_eq!(ch.last_distance(), None);
}

#[rstest]
#[case(0, false)]
#[case(1, true)]
#[case(40, true)]
#[case(41, false)]
fn touch_threshold_is_inclusive(#[case] mm: u16, #[case] touch: bool) {
    let ch = scripted_channel(vec![], passthrough());
    assert_eq!(ch.is_touch(mm), touch);
}

#[test]
fn config_file_values_drive_the_channel() {
    let cfg = repwatch_config::load_toml(
        "[sensor]\nmedian_count = 5\ntouch_threshold_mm = 60\n[detector]\nnoise_threshold_mm = 30\n",
    )
    .unwrap();
    let ch = SensingChannel::builder()
        .with_source(ScriptedRanging::default())
        .with_clock(ManualClock::new())
        .apply_config(&cfg)
        .build()
        .unwrap();
    assert_eq!(ch.frontend().effective_count(), 5);
    assert_eq!(ch.params().noise_threshold_mm, 30);
    assert!(ch.is_touch(60));
}

#[test]
fn synthetic_reps_are_counted_through_the_median() {
    let reps = 4;
    let source = SyntheticReps::new(SyntheticRepsCfg {
        reps,
        glitch_every: 7,
        ..SyntheticRepsCfg::default()
    });
    let mut ch = SensingChannel::builder()
        .with_source(source)
        .with_clock(ManualClock::new())
        .build()
        .unwrap();
    ch.begin().unwrap();
    for _ in 0..400 {
        ch.poll();
    }
    assert!(ch.frontend().source().finished());
    assert_eq!(ch.stats().events, u64::from(reps));
}

#[test]
fn runner_stops_at_cycle_cap_and_paces_on_the_clock() {
    let mut ch = scripted_channel(vec![Some(500); 10], passthrough());
    let pacer = ManualClock::new();
    let shutdown = AtomicBool::new(false);
    let params = RunParams::at_hz(20).with_max_cycles(4);
    let (reason, stats) = run_cycles(&mut ch, &pacer, params, &shutdown, |_, _| {
        ControlFlow::Continue(())
    });
    assert_eq!(reason, StopReason::MaxCycles);
    assert_eq!(stats.cycles, 4);
    assert_eq!(pacer.elapsed(), Duration::from_millis(200));
}

#[test]
fn runner_callback_can_stop_when_trace_runs_dry() {
    let mut ch = scripted_channel(vec![Some(500); 3], passthrough());
    let pacer = ManualClock::new();
    let shutdown = AtomicBool::new(false);
    let (reason, stats) = run_cycles(&mut ch, &pacer, RunParams::at_hz(100), &shutdown, |ch, _| {
        if ch.frontend().source().remaining() == 0 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert_eq!(reason, StopReason::Callback);
    assert_eq!(stats.cycles, 3);
}

#[test]
fn runner_honors_shutdown_before_first_cycle() {
    let mut ch = build_channel(
        NoTargetSource,
        ManualClock::new(),
        FilterCfg::default(),
        DetectorParams::default(),
        ChannelCfg::default(),
    )
    .unwrap();
    let shutdown = AtomicBool::new(true);
    let (reason, stats) = run_cycles(
        &mut ch,
        &ManualClock::new(),
        RunParams::at_hz(10),
        &shutdown,
        |_, _| ControlFlow::Continue(()),
    );
    assert_eq!(reason, StopReason::Shutdown);
    assert_eq!(stats.cycles, 0);
}

#[test]
fn zero_measure_timeout_is_rejected() {
    let err = build_channel(
        ScriptedRanging::default(),
        ManualClock::new(),
        FilterCfg::default(),
        DetectorParams::default(),
        ChannelCfg {
            measure_timeout: Duration::ZERO,
            ..ChannelCfg::default()
        },
    )
    .err()
    .expect("zero timeout");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(msg)) if msg.contains("measure_timeout")
    ));
}

#[test]
fn run_params_follow_channel_poll_hz() {
    let cfg = repwatch_config::load_toml("[sensor]\nmedian_count = 1\n[sampling]\npoll_hz = 40\n")
        .unwrap();
    let mut ch = SensingChannel::builder()
        .with_source(ScriptedRanging::from_mm([500; 10]))
        .with_clock(ManualClock::new())
        .apply_config(&cfg)
        .build()
        .unwrap();
    ch.begin().unwrap();

    let pacer = ManualClock::new();
    let params = RunParams::from(ch.cfg()).with_max_cycles(4);
    assert_eq!(params.period, Duration::from_millis(25));
    let (_, stats) = run_cycles(&mut ch, &pacer, params, &AtomicBool::new(false), |_, _| {
        ControlFlow::Continue(())
    });
    assert_eq!(stats.cycles, 4);
    assert_eq!(pacer.elapsed(), Duration::from_millis(100));
}

#[test]
fn stalled_ready_line_fails_reads_after_configured_timeout() {
    let cfg = repwatch_config::load_toml("[sensor]\nmedian_count = 1\nmeasure_timeout_ms = 5\n")
        .unwrap();
    let chan = ChannelCfg::from(&cfg);
    assert_eq!(chan.measure_timeout, Duration::from_millis(5));

    let source = ReadyGated::new(
        ScriptedRanging::from_mm([500, 500]),
        simulated_ready_line(Some(1)),
        chan.measure_timeout,
    );
    let mut ch = SensingChannel::builder()
        .with_source(source)
        .with_clock(ManualClock::new())
        .apply_config(&cfg)
        .build()
        .unwrap();
    ch.begin().unwrap();

    assert_eq!(ch.poll(), Cycle::Reading { mm: 500, event: false });

    let started = Instant::now();
    assert_eq!(ch.poll(), Cycle::NoReading);
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(5), "gave up after {waited:?}");
    // Far below the 200 ms default, so the configured value was used.
    assert!(waited < Duration::from_millis(150), "waited {waited:?}");

    assert_eq!(ch.stats().failed_reads, 1);
    assert_eq!(ch.frontend().source().inner().remaining(), 1);
}
