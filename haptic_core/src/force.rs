//! Force shaping: accumulate injected forces, add damping and boundary
//! springs, apply the Z-axis rectification, and flush once per cycle.

use crate::types::{Axis, AxisState};

/// Gain applied to Z force when it pushes along the current Z velocity.
pub const Z_ASSIST_GAIN: f64 = 0.9;

/// One-sided repulsive spring outside `[neg_bound, pos_bound]`.
///
/// Comparisons are strict: a position exactly on a bound adds no force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryConfig {
    pub pos_bound: f64,
    pub neg_bound: f64,
    pub stiffness: f64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            pos_bound: 0.01,
            neg_bound: -0.01,
            stiffness: 0.0,
        }
    }
}

impl BoundaryConfig {
    /// Spring force for `position`.
    #[inline]
    pub fn force(&self, position: f64) -> f64 {
        if position > self.pos_bound {
            self.stiffness * (position - self.pos_bound)
        } else if position < self.neg_bound {
            self.stiffness * (position - self.neg_bound)
        } else {
            0.0
        }
    }
}

/// Static shaping parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceCfg {
    /// Velocity damping coefficient per axis (typically <= 0).
    pub damping: [f64; 3],
    pub boundaries: [BoundaryConfig; 3],
}

impl Default for ForceCfg {
    fn default() -> Self {
        Self {
            damping: [0.0; 3],
            boundaries: [BoundaryConfig::default(); 3],
        }
    }
}

/// `-1`, `0` or `1`, with zero mapping to zero.
#[inline]
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

#[derive(Debug, Clone)]
pub struct ForceController {
    cfg: ForceCfg,
    // Device Z axis mounted in reverse
    reverse_z: bool,
    pending: [f64; 3],
}

impl ForceController {
    pub fn new(cfg: ForceCfg, reverse_z: bool) -> Self {
        Self {
            cfg,
            reverse_z,
            pending: [0.0; 3],
        }
    }

    pub fn cfg(&self) -> &ForceCfg {
        &self.cfg
    }

    pub fn set_damping(&mut self, damping: [f64; 3]) {
        self.cfg.damping = damping;
    }

    pub fn set_boundary(&mut self, axis: Axis, boundary: BoundaryConfig) {
        self.cfg.boundaries[axis.index()] = boundary;
    }

    /// Symmetric cube around `center`, stored with `pos_bound = center - radius`,
    /// `neg_bound = center + radius` and negated stiffness.
    pub fn set_limits_cube(&mut self, center: [f64; 3], radius: f64, stiffness: f64) {
        for axis in Axis::ALL {
            let c = center[axis.index()];
            self.set_boundary(
                axis,
                BoundaryConfig {
                    pos_bound: c - radius,
                    neg_bound: c + radius,
                    stiffness: -stiffness,
                },
            );
        }
    }

    /// Accumulate an external force until the next flush.
    #[inline]
    pub fn add_force(&mut self, force: [f64; 3]) {
        for (acc, f) in self.pending.iter_mut().zip(force) {
            *acc += f;
        }
    }

    /// Forces injected since the last flush.
    pub fn pending(&self) -> [f64; 3] {
        self.pending
    }

    /// Shape the command for this cycle without touching the accumulators.
    pub fn compute(&self, state: &[AxisState; 3]) -> [f64; 3] {
        let mut force = self.pending;
        for axis in Axis::ALL {
            let i = axis.index();
            let s = state[i];
            force[i] += s.velocity * self.cfg.damping[i];
            force[i] += self.cfg.boundaries[i].force(s.position);
        }

        let z = Axis::Z.index();
        if sign(force[z]) == sign(state[z].velocity) {
            force[z] *= Z_ASSIST_GAIN;
        }
        if self.reverse_z {
            force[z] = -force[z];
        }
        force
    }

    /// Zero the accumulators after a command was delivered.
    #[inline]
    pub fn clear(&mut self) {
        self.pending = [0.0; 3];
    }
}
