use repwatch_config::load_toml;
use rstest::rstest;

const BASE: &str = r#"
[sensor]
median_count = 5
touch_threshold_mm = 40

[detector]
noise_threshold_mm = 20
max_range_mm = 2000

[sampling]
poll_hz = 25
retry_pause_ms = 5
settle_pause_ms = 2
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.sensor.median_count, 5);
    assert_eq!(cfg.effective_median_count(), 5);
}

#[test]
fn partial_sections_keep_field_defaults() {
    let toml = r#"
[detector]
noise_threshold_mm = 35
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    assert_eq!(cfg.detector.noise_threshold_mm, 35);
    assert_eq!(cfg.detector.max_range_mm, 2000);
    assert_eq!(cfg.sampling.retry_pause_ms, 5);
    cfg.validate().expect("valid");
}

#[test]
fn measure_timeout_defaults_and_overrides() {
    assert_eq!(load_toml("").unwrap().sensor.measure_timeout_ms, 200);
    let cfg = load_toml("[sensor]\nmeasure_timeout_ms = 15\n").expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.sensor.measure_timeout_ms, 15);
}

#[rstest]
#[case("[sensor]\nmedian_count = 0", "median_count must be >= 1")]
#[case("[sensor]\nmeasure_timeout_ms = 0", "measure_timeout_ms must be >= 1")]
#[case("[detector]\nnoise_threshold_mm = 0", "noise_threshold_mm must be >= 1")]
#[case("[detector]\nmax_range_mm = 0", "max_range_mm must be >= 1")]
#[case(
    "[detector]\nnoise_threshold_mm = 500\nmax_range_mm = 500",
    "must be below detector.max_range_mm"
)]
#[case("[sampling]\npoll_hz = 0", "poll_hz must be > 0")]
#[case("[sampling]\nretry_pause_ms = 5000", "retry_pause_ms is unreasonably large")]
#[case("[sampling]\nsettle_pause_ms = 5000", "settle_pause_ms is unreasonably large")]
#[case("[logging]\nrotation = \"weekly\"", "rotation must be one of")]
fn rejects_invalid_field(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "expected '{needle}' in '{err}'"
    );
}

#[test]
fn median_count_out_of_u8_range_fails_to_parse() {
    let err = load_toml("[sensor]\nmedian_count = 300").expect_err("u8 overflow");
    assert!(format!("{err}").contains("median_count"));
}
