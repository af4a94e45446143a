use proptest::prelude::*;
use repwatch_core::{FilterCfg, SamplingFrontEnd};
use repwatch_hardware::ScriptedRanging;
use repwatch_traits::ManualClock;
use rstest::rstest;

fn front(script: Vec<Option<u16>>, median_count: u8) -> SamplingFrontEnd<ScriptedRanging, ManualClock> {
    let cfg = FilterCfg {
        median_count,
        ..FilterCfg::default()
    };
    let mut fe = SamplingFrontEnd::with_clock(ScriptedRanging::new(script), cfg, ManualClock::new());
    fe.begin().expect("begin");
    fe
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(4)]
#[case(6)]
fn degenerate_counts_take_exactly_one_acquisition(#[case] median_count: u8) {
    let mut fe = front(vec![Some(500), Some(10), Some(10)], median_count);
    assert_eq!(fe.read(), Some(500));
    assert_eq!(fe.source().acquisitions(), 1);

    let mut failing = front(vec![None, Some(10)], median_count);
    assert_eq!(failing.read(), None);
    assert_eq!(failing.source().acquisitions(), 1);
}

#[rstest]
#[case(3, 3)]
#[case(5, 5)]
#[case(7, 7)]
#[case(9, 7)]
#[case(255, 7)]
fn multi_sample_reads_are_capped(#[case] median_count: u8, #[case] expected: usize) {
    let mut fe = front(vec![Some(100); 16], median_count);
    assert_eq!(fe.read(), Some(100));
    assert_eq!(fe.source().acquisitions(), expected);
}

#[test]
fn single_outlier_is_rejected() {
    let mut fe = front(vec![Some(802), Some(1990), Some(799)], 3);
    assert_eq!(fe.read(), Some(802));
}

#[test]
fn all_attempts_failing_yields_no_value() {
    let mut fe = front(vec![None; 5], 5);
    let out = fe.read_detailed();
    assert_eq!(out.value, None);
    assert_eq!(out.attempts, 5);
    assert_eq!(out.got, 0);
}

#[test]
fn partial_failure_degrades_sample_count() {
    let mut fe = front(vec![Some(300), None, Some(100), None, Some(200)], 5);
    let out = fe.read_detailed();
    assert_eq!(out.got, 3);
    assert_eq!(out.value, Some(200));
}

#[test]
fn single_success_among_failures_is_returned() {
    let mut fe = front(vec![None, None, Some(640), None, None, None, None], 7);
    assert_eq!(fe.read(), Some(640));
}

fn odd_count() -> impl Strategy<Value = u8> {
    prop_oneof![Just(3u8), Just(5u8), Just(7u8)]
}

proptest! {
    #[test]
    fn unanimous_valid_reads_return_exact_median(
        n in odd_count(),
        values in proptest::collection::vec(1u16..=4000, 7),
    ) {
        let samples: Vec<u16> = values[..usize::from(n)].to_vec();
        let mut fe = front(samples.iter().copied().map(Some).collect(), n);
        let mut sorted = samples.clone();
        sorted.sort_unstable();
        prop_assert_eq!(fe.read(), Some(sorted[sorted.len() / 2]));
    }

    #[test]
    fn value_is_drawn_from_successful_samples(
        n in odd_count(),
        script in proptest::collection::vec(proptest::option::of(1u16..=4000), 7),
    ) {
        let script: Vec<Option<u16>> = script[..usize::from(n)].to_vec();
        let valid: Vec<u16> = script.iter().flatten().copied().collect();
        let mut fe = front(script, n);
        match fe.read() {
            Some(v) => prop_assert!(valid.contains(&v)),
            None => prop_assert!(valid.is_empty()),
        }
    }
}
