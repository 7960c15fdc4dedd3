//! Windowed least-squares differentiator.
//!
//! Row `i` of the basis matrix models the sample taken `i` timesteps ago:
//!
//! `sample(i) ≈ pos - vel * (i * dt) + 0.5 * accel * (i * dt)^2`
//!
//! so the columns are `[1, -i*dt, 0.5*(i*dt)^2]`. The Moore-Penrose
//! pseudoinverse of that N×3 matrix depends only on N and `dt`; it is computed
//! once (via SVD) and each cycle reduces to one 3×N matrix-vector product per
//! axis. The fit trades `(N-1)*dt` seconds of lag for noise rejection.

use nalgebra::DMatrix;

use crate::error::HapticError;
use crate::history::HistoryBuffer;
use crate::types::{Axis, AxisState};

/// Relative cutoff for small singular values, as a multiple of the largest.
const PINV_RCOND: f64 = 1e-15;

/// Build the N×3 polynomial basis for `window_len` samples spaced `timestep_s` apart.
pub fn basis_matrix(timestep_s: f64, window_len: usize) -> DMatrix<f64> {
    DMatrix::from_fn(window_len, 3, |i, j| {
        let t = i as f64 * timestep_s;
        match j {
            0 => 1.0,
            1 => -t,
            _ => 0.5 * t * t,
        }
    })
}

#[derive(Debug, Clone)]
pub struct DerivativeEstimator {
    timestep_s: f64,
    basis: DMatrix<f64>,
    pinv: DMatrix<f64>,
}

impl DerivativeEstimator {
    pub fn new(timestep_s: f64, window_len: usize) -> Result<Self, HapticError> {
        if !timestep_s.is_finite() || timestep_s <= 0.0 {
            return Err(HapticError::Config(format!(
                "timestep must be finite and > 0, got {timestep_s}"
            )));
        }
        if window_len == 0 {
            return Err(HapticError::Config("estimate window length must be >= 1".into()));
        }

        let basis = basis_matrix(timestep_s, window_len);
        let svd = basis.clone().svd(true, true);
        let cutoff = PINV_RCOND * svd.singular_values.max();
        let pinv = svd
            .pseudo_inverse(cutoff)
            .map_err(|e| HapticError::Config(format!("basis pseudoinverse failed: {e}")))?;
        if pinv.iter().any(|v| !v.is_finite()) {
            return Err(HapticError::Config(
                "basis pseudoinverse is not finite".into(),
            ));
        }
        tracing::debug!(window_len, timestep_s, "derivative basis ready");

        Ok(Self {
            timestep_s,
            basis,
            pinv,
        })
    }

    #[inline]
    pub fn window_len(&self) -> usize {
        self.basis.nrows()
    }

    pub fn timestep_s(&self) -> f64 {
        self.timestep_s
    }

    /// N×3 basis matrix.
    pub fn basis(&self) -> &DMatrix<f64> {
        &self.basis
    }

    /// 3×N pseudoinverse of the basis.
    pub fn pseudo_inverse(&self) -> &DMatrix<f64> {
        &self.pinv
    }

    /// Fit one axis of `history`. The history length must equal `window_len()`.
    pub fn estimate(&self, history: &HistoryBuffer, axis: Axis) -> AxisState {
        debug_assert_eq!(history.len(), self.window_len());
        self.project(history.column(axis))
    }

    pub fn estimate_all(&self, history: &HistoryBuffer) -> [AxisState; 3] {
        Axis::ALL.map(|axis| self.estimate(history, axis))
    }

    /// Fit a newest-first slice of samples; extra samples beyond the window are ignored.
    pub fn estimate_samples(&self, samples: &[f64]) -> AxisState {
        self.project(samples.iter().copied())
    }

    #[inline]
    fn project(&self, column: impl Iterator<Item = f64>) -> AxisState {
        let mut out = [0.0_f64; 3];
        for (i, v) in column.take(self.window_len()).enumerate() {
            let w = self.pinv.column(i);
            out[0] += w[0] * v;
            out[1] += w[1] * v;
            out[2] += w[2] * v;
        }
        AxisState {
            position: out[0],
            velocity: out[1],
            acceleration: out[2],
        }
    }
}
