#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and calibration parsing for the haptic control loop.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section has defaults, so an empty file is a valid config.
//! - `CalibrationFile` is the per-device extents table, stored as JSON keyed
//!   by serial number or the reserved `"default"` key.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Reserved calibration key used when no entry matches the device serial.
pub const DEFAULT_CALIBRATION_KEY: &str = "default";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceCfg {
    /// Index of the device on the bus (0 = first)
    pub index: usize,
    /// Device Z axis is mounted in reverse
    pub reverse_z: bool,
    /// Firmware image uploaded after init; skipped when absent
    pub firmware: Option<String>,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            index: 0,
            reverse_z: false,
            firmware: Some("firmware/test_firmware.bin".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    /// Control cycle period in seconds
    pub timestep_s: f64,
    /// Length of the least-squares history window in seconds
    pub estimate_window_s: f64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            timestep_s: 0.001,
            estimate_window_s: 0.01,
        }
    }
}

/// Per-axis scalar, `{ x, y, z }` in TOML.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct AxisTriple {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AxisTriple {
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct BoundsCfg {
    pub pos: f64,
    pub neg: f64,
    pub stiffness: f64,
}

impl Default for BoundsCfg {
    fn default() -> Self {
        Self {
            pos: 0.01,
            neg: -0.01,
            stiffness: 0.0,
        }
    }
}

/// Cube-shaped workspace limit applied at startup.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LimitsCfg {
    #[serde(default)]
    pub center: [f64; 3],
    pub radius: f64,
    #[serde(default = "default_cube_stiffness")]
    pub stiffness: f64,
}

fn default_cube_stiffness() -> f64 {
    10.0
}

/// What to do when neither the device serial nor `"default"` has calibration.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnMissingCalibration {
    /// Fall back to raw passthrough
    #[default]
    Identity,
    /// Refuse to start
    Abort,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Path to the JSON calibration table
    pub file: Option<String>,
    pub on_missing: OnMissingCalibration,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            file: Some("falcon_calibration.json".to_string()),
            on_missing: OnMissingCalibration::Identity,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulatorCfg {
    pub serial: String,
    pub device_count: usize,
    /// Oscillation amplitude per axis as a fraction of the half-range
    pub amplitude: [f64; 3],
    pub frequency_hz: f64,
    /// Normalized displacement per unit force
    pub compliance: f64,
}

impl Default for SimulatorCfg {
    fn default() -> Self {
        Self {
            serial: "SIM0001".to_string(),
            device_count: 1,
            amplitude: [0.01, 0.01, 0.01],
            frequency_hz: 0.5,
            compliance: 0.001,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceCfg,
    pub timing: TimingCfg,
    /// Velocity damping coefficient per axis (typically <= 0)
    pub damping: AxisTriple,
    /// Boundary spring applied identically to every axis
    pub bounds: BoundsCfg,
    /// Optional cube limit; overrides `bounds` when present
    pub limits: Option<LimitsCfg>,
    pub calibration: CalibrationCfg,
    pub logging: Logging,
    pub simulator: SimulatorCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a TOML config file (no validation).
pub fn load_config_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Timing
        let dt = self.timing.timestep_s;
        if !dt.is_finite() || dt <= 0.0 {
            eyre::bail!("timing.timestep_s must be finite and > 0");
        }
        let win = self.timing.estimate_window_s;
        if !win.is_finite() || win < dt {
            eyre::bail!("timing.estimate_window_s must be finite and >= timing.timestep_s");
        }

        // Forces
        if !self.damping.to_array().iter().all(|v| v.is_finite()) {
            eyre::bail!("damping values must be finite");
        }
        if !(self.bounds.pos.is_finite()
            && self.bounds.neg.is_finite()
            && self.bounds.stiffness.is_finite())
        {
            eyre::bail!("bounds values must be finite");
        }
        if let Some(limits) = &self.limits {
            if !limits.center.iter().all(|v| v.is_finite()) {
                eyre::bail!("limits.center must be finite");
            }
            if !limits.radius.is_finite() || limits.radius < 0.0 {
                eyre::bail!("limits.radius must be finite and >= 0");
            }
            if !limits.stiffness.is_finite() {
                eyre::bail!("limits.stiffness must be finite");
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        // Simulator
        if self.simulator.device_count == 0 {
            eyre::bail!("simulator.device_count must be >= 1");
        }
        if !self.simulator.frequency_hz.is_finite() || self.simulator.frequency_hz < 0.0 {
            eyre::bail!("simulator.frequency_hz must be finite and >= 0");
        }
        if !(self.simulator.amplitude.iter().all(|v| v.is_finite())
            && self.simulator.compliance.is_finite())
        {
            eyre::bail!("simulator.amplitude and simulator.compliance must be finite");
        }

        Ok(())
    }
}

/// Raw extents for one device, hardware units.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CalibrationEntry {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl CalibrationEntry {
    /// `(min, max)` per axis in x, y, z order.
    pub fn extents(&self) -> [(f64, f64); 3] {
        [
            (self.x_min, self.x_max),
            (self.y_min, self.y_max),
            (self.z_min, self.z_max),
        ]
    }
}

/// Calibration table keyed by serial number or `"default"`.
///
/// Example:
/// {
///   "default": { "x_min": -0.06, "x_max": 0.06, ... },
///   "FAL-0042": { ... }
/// }
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct CalibrationFile {
    pub entries: BTreeMap<String, CalibrationEntry>,
}

impl CalibrationFile {
    pub fn parse(s: &str) -> eyre::Result<Self> {
        let file: Self =
            serde_json::from_str(s).map_err(|e| eyre::eyre!("parse calibration JSON: {e}"))?;
        file.validate()?;
        Ok(file)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        for (key, entry) in &self.entries {
            for ((min, max), axis) in entry.extents().into_iter().zip(["x", "y", "z"]) {
                if !min.is_finite() || !max.is_finite() {
                    eyre::bail!("calibration {key:?}: {axis} extents must be finite");
                }
                let scale = (max - min) / 2.0;
                if scale == 0.0 || !scale.is_finite() || !((min + max) / 2.0).is_finite() {
                    eyre::bail!(
                        "calibration {key:?}: {axis}_min={min}, {axis}_max={max} yields zero scale"
                    );
                }
            }
        }
        Ok(())
    }

    pub fn default_entry(&self) -> Option<&CalibrationEntry> {
        self.entries.get(DEFAULT_CALIBRATION_KEY)
    }
}

/// Load and validate a calibration JSON file. A missing file is an error.
pub fn load_calibration_json(path: &Path) -> eyre::Result<CalibrationFile> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("open calibration JSON {:?}: {}", path, e))?;
    CalibrationFile::parse(&text).map_err(|e| eyre::eyre!("{:?}: {}", path, e))
}

/// Like `load_calibration_json`, but a file that does not exist yields `Ok(None)`.
pub fn load_calibration_json_opt(path: &Path) -> eyre::Result<Option<CalibrationFile>> {
    if !path.exists() {
        return Ok(None);
    }
    load_calibration_json(path).map(Some)
}
