//! The control loop (`HapticLoop`).
//!
//! One instance exclusively owns one device handle. Each cycle is two calls
//! in strict order: `update_state` (read, normalize, push, estimate) and
//! `output_forces` (shape, write, flush). A failed call leaves the history and
//! the force accumulators as they were before it.

use eyre::WrapErr;
use haptic_traits::DeviceAdapter;

use crate::calibration::CalibrationMap;
use crate::config::BoundaryConfig;
use crate::error::{HapticError, Result};
use crate::estimator::DerivativeEstimator;
use crate::force::ForceController;
use crate::history::HistoryBuffer;
use crate::hw_error::map_hw_error;
use crate::status::LoopState;
use crate::types::{Axis, AxisState};

pub struct HapticLoop<D: DeviceAdapter> {
    pub(crate) device: D,
    pub(crate) state: LoopState,
    pub(crate) serial: Option<String>,
    pub(crate) calibration: CalibrationMap,
    pub(crate) reverse_z: bool,
    pub(crate) history: HistoryBuffer,
    pub(crate) estimator: DerivativeEstimator,
    pub(crate) force: ForceController,
    pub(crate) estimates: [AxisState; 3],
    pub(crate) cycles: u64,
}

impl<D: DeviceAdapter> core::fmt::Debug for HapticLoop<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HapticLoop")
            .field("state", &self.state)
            .field("serial", &self.serial)
            .field("calibration", &self.calibration.source())
            .field("window_len", &self.window_len())
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl<D: DeviceAdapter> HapticLoop<D> {
    fn ensure_live(&self, op: &str) -> Result<()> {
        if self.state.is_live() {
            Ok(())
        } else {
            Err(eyre::Report::new(HapticError::State(format!(
                "{op} called in state {:?}",
                self.state
            ))))
        }
    }

    /// One read-normalize-push-estimate cycle.
    pub fn update_state(&mut self) -> Result<()> {
        self.ensure_live("update_state")?;
        let raw = self
            .device
            .read_raw_position()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading device position")?;

        let mut sample = self.calibration.normalize_all(raw);
        if self.reverse_z {
            sample[Axis::Z.index()] = -sample[Axis::Z.index()];
        }
        self.history.push(sample);
        self.estimates = self.estimator.estimate_all(&self.history);
        self.state = LoopState::Running;
        self.cycles += 1;
        tracing::trace!(
            cycle = self.cycles,
            x = self.estimates[0].position,
            y = self.estimates[1].position,
            z = self.estimates[2].position,
            "state updated"
        );
        Ok(())
    }

    /// Normalized position from the most recent estimate.
    pub fn get_pos(&self) -> [f64; 3] {
        self.estimates.map(|s| s.position)
    }

    /// Normalized velocity from the most recent estimate.
    pub fn get_vel(&self) -> [f64; 3] {
        self.estimates.map(|s| s.velocity)
    }

    /// Full per-axis estimates, acceleration included.
    pub fn estimates(&self) -> &[AxisState; 3] {
        &self.estimates
    }

    /// Add to the force sent with the next `output_forces`.
    pub fn add_force(&mut self, force: [f64; 3]) {
        self.force.add_force(force);
    }

    /// Shape and write this cycle's force, then zero the accumulators.
    ///
    /// Returns the command that was written. On a failed write the
    /// accumulated forces are kept.
    pub fn output_forces(&mut self) -> Result<[f64; 3]> {
        self.ensure_live("output_forces")?;
        let command = self.force.compute(&self.estimates);
        self.device
            .write_force(command)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("writing force command")?;
        self.force.clear();
        tracing::trace!(fx = command[0], fy = command[1], fz = command[2], "force written");
        Ok(command)
    }

    pub fn set_leds(&mut self, red: bool, green: bool, blue: bool) -> Result<()> {
        self.ensure_live("set_leds")?;
        self.device
            .set_leds(red, green, blue)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("setting LEDs")
    }

    /// Symmetric workspace cube; see [`ForceController::set_limits_cube`].
    pub fn set_limits_cube(&mut self, center: [f64; 3], radius: f64, stiffness: f64) {
        self.force.set_limits_cube(center, radius, stiffness);
        tracing::debug!(?center, radius, stiffness, "limits cube set");
    }

    pub fn set_damping(&mut self, damping: [f64; 3]) {
        self.force.set_damping(damping);
    }

    pub fn set_boundary(&mut self, axis: Axis, boundary: BoundaryConfig) {
        self.force.set_boundary(axis, boundary);
    }

    /// Forces added since the last successful flush.
    pub fn pending_force(&self) -> [f64; 3] {
        self.force.pending()
    }

    pub fn boundaries(&self) -> &[BoundaryConfig; 3] {
        &self.force.cfg().boundaries
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// History length N.
    pub fn window_len(&self) -> usize {
        self.estimator.window_len()
    }

    pub fn timestep_s(&self) -> f64 {
        self.estimator.timestep_s()
    }

    pub fn calibration(&self) -> &CalibrationMap {
        &self.calibration
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Completed `update_state` calls.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Release the device. Further cycle calls fail with `HapticError::State`;
    /// a second `shutdown` is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == LoopState::ShutDown {
            return Ok(());
        }
        self.state = LoopState::ShutDown;
        tracing::info!(cycles = self.cycles, "shutting down device");
        self.device
            .shutdown()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("device shutdown")
    }
}

impl<D: DeviceAdapter> Drop for HapticLoop<D> {
    fn drop(&mut self) {
        if self.state != LoopState::ShutDown
            && let Err(e) = self.shutdown()
        {
            tracing::warn!(error = %e, "shutdown on drop failed");
        }
    }
}
