//! Maps `Box<dyn Error>` from trait boundaries to typed `HapticError`.
//!
//! The traits in `haptic_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `haptic_hardware::HwError` downcasting.

use crate::error::HapticError;

/// Map a per-cycle trait-boundary error to a typed `HapticError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> HapticError {
    #[cfg(feature = "hardware-errors")]
    {
        use haptic_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => HapticError::Timeout,
                HwError::NotInitialized => HapticError::State(hw.to_string()),
                other => HapticError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        HapticError::Timeout
    } else {
        HapticError::Hardware(s)
    }
}
