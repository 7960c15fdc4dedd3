//! Runtime configuration for the control loop.
//!
//! These are separate from the TOML-deserialized config in `haptic_config`;
//! see `conversions` for the bridge.

use std::path::PathBuf;

pub use crate::force::{BoundaryConfig, ForceCfg};

/// Caller policy when no calibration entry matches the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingCalibration {
    /// Log a warning and use raw passthrough.
    #[default]
    Identity,
    /// Fail startup with `CalibrationMissing`.
    Abort,
}

/// Construction parameters: `(timestep, device index, reverse Z, window)` plus startup options.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopCfg {
    pub timestep_s: f64,
    pub estimate_window_s: f64,
    pub device_index: usize,
    pub reverse_z: bool,
    /// Firmware image uploaded after init; `None` skips the step.
    pub firmware: Option<PathBuf>,
    pub on_missing_calibration: MissingCalibration,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            timestep_s: 0.01,
            estimate_window_s: 0.1,
            device_index: 0,
            reverse_z: false,
            firmware: None,
            on_missing_calibration: MissingCalibration::Identity,
        }
    }
}

/// Cube-shaped workspace limit, applied through `set_limits_cube` at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeLimits {
    pub center: [f64; 3],
    pub radius: f64,
    pub stiffness: f64,
}

impl Default for CubeLimits {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            radius: 0.5,
            stiffness: 10.0,
        }
    }
}
