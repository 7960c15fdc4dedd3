//! Human-readable error descriptions, exit codes and structured JSON errors.

use haptic_core::error::{BuildError, HapticError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDevice => {
                "What happened: No device adapter was provided to the control loop.\nLikely causes: The device backend failed to construct.\nHow to fix: Check the [simulator] section or the driver installation.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            BuildError::WindowTooShort {
                window_s,
                timestep_s,
            } => format!(
                "What happened: The estimate window ({window_s}s) holds no samples at a {timestep_s}s timestep.\nLikely causes: timing.estimate_window_s smaller than timing.timestep_s.\nHow to fix: Set timing.estimate_window_s to at least one timestep (10 timesteps is typical)."
            ),
        };
    }

    if let Some(he) = err.downcast_ref::<HapticError>() {
        return match he {
            HapticError::DeviceInit(m) => format!(
                "What happened: The device could not be opened ({m}).\nLikely causes: Device unplugged, wrong [device] index, or missing USB permissions.\nHow to fix: Check the connection and device.index, then rerun."
            ),
            HapticError::FirmwareLoad(m) => format!(
                "What happened: Firmware upload failed ({m}).\nLikely causes: Wrong [device] firmware path or a corrupt image.\nHow to fix: Point device.firmware at a valid image, or remove it to skip the upload."
            ),
            HapticError::CalibrationMissing { serial } => format!(
                "What happened: No calibration for device {} and no \"default\" entry.\nLikely causes: calibration.on_missing = \"abort\" with an incomplete calibration file.\nHow to fix: Add an entry for this serial or a \"default\" entry, or set on_missing = \"identity\".",
                serial.as_deref().unwrap_or("<unknown serial>")
            ),
            HapticError::Timeout => {
                "What happened: Device read timed out.\nLikely causes: Device disconnected or the I/O loop stalled.\nHow to fix: Reconnect the device and rerun; use --log-level=debug for cycle timing.".to_string()
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("calibration") && (lower.contains("json") || lower.contains("zero scale")) {
        return format!(
            "What happened: The calibration file is invalid ({msg}).\nLikely causes: Malformed JSON, missing x/y/z min/max keys, or min and max too close (zero scale) on an axis.\nHow to fix: Fix the calibration file and rerun."
        );
    }
    if lower.contains("config") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nHow to fix: Edit the TOML config and try again."
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

/// Stable short name for the error kind.
pub fn error_kind(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDevice => "MissingDevice",
            BuildError::InvalidConfig(_) | BuildError::WindowTooShort { .. } => "Config",
        };
    }
    match err.downcast_ref::<HapticError>() {
        Some(HapticError::DeviceInit(_)) => "DeviceInit",
        Some(HapticError::FirmwareLoad(_)) => "FirmwareLoad",
        Some(HapticError::CalibrationMissing { .. }) => "CalibrationMissing",
        Some(HapticError::Config(_)) => "Config",
        Some(HapticError::Timeout) => "Timeout",
        Some(HapticError::Hardware(_) | HapticError::HardwareFault(_)) => "Hardware",
        Some(HapticError::State(_)) => "State",
        None => "Error",
    }
}

/// Map typed errors to stable exit codes; anything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match error_kind(err) {
        "DeviceInit" => 3,
        "FirmwareLoad" => 4,
        "CalibrationMissing" => 5,
        "Config" => 6,
        "Timeout" | "Hardware" => 7,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": error_kind(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_get_stable_codes() {
        let e = eyre::Report::new(HapticError::DeviceInit("gone".into()));
        assert_eq!(exit_code_for_error(&e), 3);
        let e = eyre::Report::new(HapticError::Timeout).wrap_err("cycle 4");
        assert_eq!(exit_code_for_error(&e), 7);
        let e = eyre::Report::new(BuildError::WindowTooShort {
            window_s: 0.001,
            timestep_s: 0.01,
        });
        assert_eq!(exit_code_for_error(&e), 6);
        assert_eq!(exit_code_for_error(&eyre::eyre!("boom")), 1);
    }

    #[test]
    fn json_error_has_reason_and_message() {
        let e = eyre::Report::new(HapticError::CalibrationMissing {
            serial: Some("SIM0001".into()),
        });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "CalibrationMissing");
        assert_eq!(v["exit_code"], 5);
        assert!(v["message"].as_str().unwrap().contains("SIM0001"));
    }
}
