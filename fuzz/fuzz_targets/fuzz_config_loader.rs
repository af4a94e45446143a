#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = repwatch_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let n = cfg.effective_median_count();
            assert!(n == 1 || (n % 2 == 1 && n <= repwatch_config::MEDIAN_CAP));
        }
    }
});
