//! Human-readable error descriptions and structured JSON error formatting.

use repwatch_core::error::{BuildError, SenseError};

/// Find a typed error anywhere in the report's chain.
fn find<E: std::error::Error + 'static>(err: &eyre::Report) -> Option<&E> {
    err.chain().find_map(|e| e.downcast_ref::<E>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingSource => {
                "What happened: No ranging source was provided to the sensing channel.\nLikely causes: The sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the source is created successfully and passed via with_source(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the --median/--noise-mm/--max-range-mm flags, then rerun."
            ),
        };
    }

    if let Some(se) = find::<SenseError>(err) {
        return match se {
            SenseError::NotInitialized | SenseError::Boot(_) => format!(
                "What happened: The ranging sensor did not start ({se}).\nLikely causes: SDA/SCL/XSHUT miswired, no power, or a wrong I2C address.\nHow to fix: Check the sensor wiring and power, then rerun self-check."
            ),
            SenseError::Timeout => "What happened: The sensor did not report a measurement in time.\nLikely causes: Data-ready line not wired, or sensor.measure_timeout_ms too low.\nHow to fix: Verify the IRQ pin and raise sensor.measure_timeout_ms in the config.".to_string(),
            SenseError::NoTarget => "What happened: No target in range.\nLikely causes: Nothing in front of the sensor or it is pointed away.\nHow to fix: Place a target within detector.max_range_mm and retry.".to_string(),
            SenseError::Hardware(_) => format!(
                "What happened: {se}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config or trace loading
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("trace csv must have headers") {
        return "Invalid headers in trace CSV. Expected 'mm' or 'mm,ok'.".to_string();
    }

    if lower.contains("open trace csv") || lower.contains("invalid trace row") {
        return format!(
            "What happened: The trace file could not be read.\nLikely causes: Wrong path or a malformed row.\nHow to fix: Check --trace and the CSV contents. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration")
        || lower.contains("parse config")
        || lower.contains("read config")
    {
        return format!(
            "What happened: Configuration is invalid or unreadable.\nLikely causes: Out-of-range values, a TOML syntax error, or a wrong --config path.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable short name for the error class, used in JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingSource => "MissingSource",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    if let Some(se) = find::<SenseError>(err) {
        return match se {
            SenseError::NotInitialized => "NotInitialized",
            SenseError::Boot(_) => "Boot",
            SenseError::NoTarget => "NoTarget",
            SenseError::Timeout => "Timeout",
            SenseError::Hardware(_) => "Hardware",
        };
    }
    "Error"
}

/// Exit codes: 2 configuration, 3 sensor, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if find::<BuildError>(err).is_some() {
        return 2;
    }
    if find::<SenseError>(err).is_some() {
        return 3;
    }
    if format!("{err:#}")
        .to_ascii_lowercase()
        .contains("invalid configuration")
    {
        return 2;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
