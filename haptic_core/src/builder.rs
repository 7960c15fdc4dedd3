//! Type-state builder for `HapticLoop` and the generic `build_haptic_loop` constructor.
//!
//! The builder only exposes `build()` once a device has been supplied;
//! `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;

use haptic_traits::DeviceAdapter;

use crate::calibration::{CalibrationMap, CalibrationSet};
use crate::config::{CubeLimits, ForceCfg, LoopCfg, MissingCalibration};
use crate::control::HapticLoop;
use crate::device::DeviceGuard;
use crate::error::{BuildError, HapticError, Result};
use crate::estimator::DerivativeEstimator;
use crate::force::ForceController;
use crate::history::HistoryBuffer;
use crate::status::LoopState;
use crate::types::Axis;

/// Boxed, dynamically dispatched control loop.
pub type DynHapticLoop = HapticLoop<Box<dyn DeviceAdapter>>;

impl DynHapticLoop {
    /// Start building a boxed control loop.
    pub fn builder() -> HapticLoopBuilder<Missing> {
        HapticLoopBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct HapticLoopBuilder<D> {
    device: Option<Box<dyn DeviceAdapter>>,
    loop_cfg: Option<LoopCfg>,
    force: Option<ForceCfg>,
    limits: Option<CubeLimits>,
    calibration: Option<CalibrationSet>,
    _d: PhantomData<D>,
}

impl Default for HapticLoopBuilder<Missing> {
    fn default() -> Self {
        Self {
            device: None,
            loop_cfg: None,
            force: None,
            limits: None,
            calibration: None,
            _d: PhantomData,
        }
    }
}

fn check_force_cfg(force: &ForceCfg, limits: Option<&CubeLimits>) -> Result<()> {
    if !force.damping.iter().all(|d| d.is_finite()) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "damping must be finite",
        )));
    }
    for b in &force.boundaries {
        if !(b.pos_bound.is_finite() && b.neg_bound.is_finite() && b.stiffness.is_finite()) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "boundary values must be finite",
            )));
        }
    }
    if let Some(l) = limits {
        if !l.center.iter().all(|c| c.is_finite()) || !l.stiffness.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "cube limits must be finite",
            )));
        }
        if !l.radius.is_finite() || l.radius < 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "cube radius must be finite and >= 0",
            )));
        }
    }
    Ok(())
}

fn resolve_calibration(
    set: Option<&CalibrationSet>,
    serial: Option<&str>,
    policy: MissingCalibration,
) -> Result<CalibrationMap> {
    let found = match set {
        Some(set) => CalibrationMap::load(set, serial),
        None => Err(HapticError::CalibrationMissing {
            serial: serial.map(str::to_string),
        }),
    };
    match (found, policy) {
        (Ok(map), _) => Ok(map),
        (Err(e @ HapticError::CalibrationMissing { .. }), MissingCalibration::Identity) => {
            tracing::warn!(error = %e, "using identity calibration");
            Ok(CalibrationMap::identity())
        }
        (Err(e), _) => Err(eyre::Report::new(e)),
    }
}

/// Validate configuration, bring the device up, and construct a `HapticLoop`.
///
/// Order: configuration checks (no device access), `init`, firmware upload,
/// serial query, calibration resolution. Once `init` has succeeded any later
/// failure shuts the device down before returning.
fn validate_and_build<D: DeviceAdapter>(
    device: D,
    cfg: LoopCfg,
    force: ForceCfg,
    limits: Option<CubeLimits>,
    calibration: Option<&CalibrationSet>,
) -> Result<HapticLoop<D>> {
    // ── Validation ───────────────────────────────────────────────────────────
    let window_len =
        crate::util::window_len(cfg.estimate_window_s, cfg.timestep_s).map_err(eyre::Report::new)?;
    check_force_cfg(&force, limits.as_ref())?;
    let estimator =
        DerivativeEstimator::new(cfg.timestep_s, window_len).map_err(eyre::Report::new)?;

    // ── Device bring-up ──────────────────────────────────────────────────────
    let mut guard = DeviceGuard::open(device, cfg.device_index).map_err(|e| {
        eyre::Report::new(HapticError::DeviceInit(format!(
            "device {}: {e}",
            cfg.device_index
        )))
    })?;
    tracing::info!(device_index = cfg.device_index, "device opened");

    if let Some(fw) = cfg.firmware.as_deref() {
        guard.get_mut().load_firmware(fw).map_err(|e| {
            eyre::Report::new(HapticError::FirmwareLoad(format!("{}: {e}", fw.display())))
        })?;
        tracing::info!(firmware = %fw.display(), "firmware loaded");
    }

    let serial = guard.get().serial_number();
    let calibration = resolve_calibration(calibration, serial.as_deref(), cfg.on_missing_calibration)?;
    tracing::info!(
        serial = serial.as_deref().unwrap_or("<unknown>"),
        source = %calibration.source(),
        offset = ?Axis::ALL.map(|a| calibration.offset(a)),
        scale = ?Axis::ALL.map(|a| calibration.scale(a)),
        window_len,
        timestep_s = cfg.timestep_s,
        "calibration resolved"
    );

    let mut force = ForceController::new(force, cfg.reverse_z);
    if let Some(l) = limits {
        force.set_limits_cube(l.center, l.radius, l.stiffness);
    }

    Ok(HapticLoop {
        device: guard.into_inner(),
        state: LoopState::Ready,
        serial,
        calibration,
        reverse_z: cfg.reverse_z,
        history: HistoryBuffer::new(window_len),
        estimator,
        force,
        estimates: Default::default(),
        cycles: 0,
    })
}

impl<D> HapticLoopBuilder<D> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<DynHapticLoop> {
        let device = self
            .device
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDevice))?;
        validate_and_build(
            device,
            self.loop_cfg.unwrap_or_default(),
            self.force.unwrap_or_default(),
            self.limits,
            self.calibration.as_ref(),
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<D> HapticLoopBuilder<D> {
    pub fn with_loop_cfg(mut self, cfg: LoopCfg) -> Self {
        self.loop_cfg = Some(cfg);
        self
    }
    pub fn with_force(mut self, force: ForceCfg) -> Self {
        self.force = Some(force);
        self
    }
    pub fn with_limits(mut self, limits: CubeLimits) -> Self {
        self.limits = Some(limits);
        self
    }
    pub fn with_calibration(mut self, set: CalibrationSet) -> Self {
        self.calibration = Some(set);
        self
    }
}

impl HapticLoopBuilder<Missing> {
    pub fn with_device(self, device: impl DeviceAdapter + 'static) -> HapticLoopBuilder<Set> {
        HapticLoopBuilder {
            device: Some(Box::new(device)),
            loop_cfg: self.loop_cfg,
            force: self.force,
            limits: self.limits,
            calibration: self.calibration,
            _d: PhantomData,
        }
    }
}

impl HapticLoopBuilder<Set> {
    /// Validate and build. Only available once a device is set.
    pub fn build(self) -> Result<DynHapticLoop> {
        self.try_build()
    }
}

/// Build a statically dispatched `HapticLoop` from a concrete device.
///
/// `calibration = None` behaves like an empty set, so the
/// `on_missing_calibration` policy decides.
pub fn build_haptic_loop<D: DeviceAdapter>(
    device: D,
    cfg: LoopCfg,
    force: ForceCfg,
    limits: Option<CubeLimits>,
    calibration: Option<&CalibrationSet>,
) -> Result<HapticLoop<D>> {
    validate_and_build(device, cfg, force, limits, calibration)
}
