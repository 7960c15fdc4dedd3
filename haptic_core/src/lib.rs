#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core control loop for a 3-DoF force-feedback device (hardware-agnostic).
//!
//! All device interaction goes through `haptic_traits::DeviceAdapter`.
//!
//! ## Architecture
//!
//! - **Calibration**: raw units to normalized `[-1, 1]` per axis (`calibration`)
//! - **History**: ring buffer of the last N normalized samples (`history`)
//! - **Estimation**: least-squares position/velocity/acceleration via a
//!   precomputed pseudoinverse (`estimator`)
//! - **Forces**: damping, boundary springs, Z rectification, flush (`force`)
//! - **Loop**: `HapticLoop` ties them to one device (`control`, `builder`)
//! - **Pacing**: fixed-rate cycle driver with deadline stats (`runner`)
//!
//! ```no_run
//! use haptic_core::{DynHapticLoop, LoopCfg, mocks::ScriptedDevice};
//!
//! let mut haptic = DynHapticLoop::builder()
//!     .with_device(ScriptedDevice::new())
//!     .with_loop_cfg(LoopCfg::default())
//!     .build()?;
//! haptic.update_state()?;
//! haptic.add_force([0.0, 0.0, 0.5]);
//! haptic.output_forces()?;
//! # Ok::<(), eyre::Report>(())
//! ```

pub mod builder;
pub mod calibration;
pub mod config;
pub mod control;
pub mod conversions;
pub mod device;
pub mod error;
pub mod estimator;
pub mod force;
pub mod history;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod status;
pub mod types;
pub mod util;

pub use builder::{DynHapticLoop, HapticLoopBuilder, Missing, Set, build_haptic_loop};
pub use calibration::{AxisCalibration, CalibrationMap, CalibrationSet, CalibrationSource};
pub use config::{BoundaryConfig, CubeLimits, ForceCfg, LoopCfg, MissingCalibration};
pub use control::HapticLoop;
pub use device::DeviceGuard;
pub use error::{BuildError, HapticError, Report, Result};
pub use estimator::DerivativeEstimator;
pub use force::ForceController;
pub use history::HistoryBuffer;
pub use runner::{RunOptions, RunStats, run_paced};
pub use status::LoopState;
pub use types::{Axis, AxisState};
