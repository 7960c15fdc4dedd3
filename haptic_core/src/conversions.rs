//! Conversions from `haptic_config` types to core types.

use std::path::PathBuf;

use crate::calibration::{AxisCalibration, CalibrationSet};
use crate::config::{BoundaryConfig, CubeLimits, ForceCfg, LoopCfg, MissingCalibration};
use crate::error::HapticError;

impl From<haptic_config::OnMissingCalibration> for MissingCalibration {
    fn from(p: haptic_config::OnMissingCalibration) -> Self {
        match p {
            haptic_config::OnMissingCalibration::Identity => MissingCalibration::Identity,
            haptic_config::OnMissingCalibration::Abort => MissingCalibration::Abort,
        }
    }
}

impl From<&haptic_config::Config> for LoopCfg {
    fn from(c: &haptic_config::Config) -> Self {
        Self {
            timestep_s: c.timing.timestep_s,
            estimate_window_s: c.timing.estimate_window_s,
            device_index: c.device.index,
            reverse_z: c.device.reverse_z,
            firmware: c.device.firmware.as_ref().map(PathBuf::from),
            on_missing_calibration: c.calibration.on_missing.into(),
        }
    }
}

impl From<&haptic_config::BoundsCfg> for BoundaryConfig {
    fn from(b: &haptic_config::BoundsCfg) -> Self {
        Self {
            pos_bound: b.pos,
            neg_bound: b.neg,
            stiffness: b.stiffness,
        }
    }
}

impl From<&haptic_config::Config> for ForceCfg {
    fn from(c: &haptic_config::Config) -> Self {
        Self {
            damping: c.damping.to_array(),
            boundaries: [BoundaryConfig::from(&c.bounds); 3],
        }
    }
}

impl From<&haptic_config::LimitsCfg> for CubeLimits {
    fn from(l: &haptic_config::LimitsCfg) -> Self {
        Self {
            center: l.center,
            radius: l.radius,
            stiffness: l.stiffness,
        }
    }
}

/// Per-axis calibration for one table entry, x, y, z order.
pub fn entry_axes(
    e: &haptic_config::CalibrationEntry,
) -> Result<[AxisCalibration; 3], HapticError> {
    let [(x0, x1), (y0, y1), (z0, z1)] = e.extents();
    Ok([
        AxisCalibration::new(x0, x1)?,
        AxisCalibration::new(y0, y1)?,
        AxisCalibration::new(z0, z1)?,
    ])
}

impl TryFrom<&haptic_config::CalibrationFile> for CalibrationSet {
    type Error = HapticError;

    fn try_from(f: &haptic_config::CalibrationFile) -> Result<Self, Self::Error> {
        let mut set = CalibrationSet::new();
        for (key, entry) in &f.entries {
            let axes = entry_axes(entry)
                .map_err(|e| HapticError::Config(format!("calibration {key:?}: {e}")))?;
            set.insert(key.clone(), axes);
        }
        Ok(set)
    }
}
