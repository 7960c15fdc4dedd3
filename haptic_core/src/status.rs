//! Control loop lifecycle state.

/// `Uninitialized -> Ready -> Running -> ShutDown`.
///
/// Startup failures leave the loop `Uninitialized`; there is no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Device not yet opened or startup failed.
    Uninitialized,
    /// Device open, firmware and calibration loaded; no cycle run yet.
    Ready,
    /// At least one update cycle has run.
    Running,
    /// Device handle released.
    ShutDown,
}

impl LoopState {
    /// Whether update/output calls are allowed.
    pub fn is_live(self) -> bool {
        matches!(self, LoopState::Ready | LoopState::Running)
    }
}
