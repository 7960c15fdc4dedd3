//! Window and period helpers shared by the builder and the runner.

use std::time::Duration;

use crate::error::BuildError;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Longest history window accepted; bounds the history and pseudoinverse allocations.
pub const MAX_WINDOW_LEN: usize = 1 << 16;

/// History length `N = floor(window / timestep)`.
///
/// Fails when either input is non-finite or non-positive, when the window
/// is shorter than one timestep (`N < 1`), or when `N > MAX_WINDOW_LEN`.
pub fn window_len(estimate_window_s: f64, timestep_s: f64) -> Result<usize, BuildError> {
    if !timestep_s.is_finite() || timestep_s <= 0.0 {
        return Err(BuildError::InvalidConfig("timestep_s must be finite and > 0"));
    }
    if !estimate_window_s.is_finite() || estimate_window_s <= 0.0 {
        return Err(BuildError::InvalidConfig(
            "estimate_window_s must be finite and > 0",
        ));
    }
    let n = (estimate_window_s / timestep_s).floor();
    if n < 1.0 {
        return Err(BuildError::WindowTooShort {
            window_s: estimate_window_s,
            timestep_s,
        });
    }
    if n > MAX_WINDOW_LEN as f64 {
        return Err(BuildError::InvalidConfig(
            "estimate window exceeds 65536 timesteps",
        ));
    }
    Ok(n as usize)
}

/// Cycle period in microseconds for `timestep_s`, at least 1.
#[inline]
pub fn period_us(timestep_s: f64) -> u64 {
    if !timestep_s.is_finite() || timestep_s <= 0.0 {
        return 1;
    }
    ((timestep_s * MICROS_PER_SEC as f64).round() as u64).max(1)
}

#[inline]
pub fn period(timestep_s: f64) -> Duration {
    Duration::from_micros(period_us(timestep_s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_samples_for_reference_timing() {
        assert_eq!(window_len(0.1, 0.01), Ok(10));
        assert_eq!(window_len(0.01, 0.001), Ok(10));
    }

    #[test]
    fn ratio_is_floored_without_rounding_up() {
        // 0.3 / 0.1 == 2.9999999999999996
        assert_eq!(window_len(0.3, 0.1), Ok(2));
    }

    #[test]
    fn oversized_window_is_invalid_config() {
        assert_eq!(window_len(1.0, 1.0 / MAX_WINDOW_LEN as f64), Ok(MAX_WINDOW_LEN));
        assert!(matches!(
            window_len(1.0, 1e-12),
            Err(BuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_timesteps_are_floored() {
        assert_eq!(window_len(0.025, 0.01), Ok(2));
        assert_eq!(window_len(0.01, 0.01), Ok(1));
    }

    #[test]
    fn window_shorter_than_timestep_is_rejected() {
        assert!(matches!(
            window_len(0.005, 0.01),
            Err(BuildError::WindowTooShort { .. })
        ));
    }

    #[test]
    fn period_rounds_to_micros() {
        assert_eq!(period_us(0.001), 1_000);
        assert_eq!(period_us(0.01), 10_000);
        assert_eq!(period_us(0.0), 1);
        assert_eq!(period(0.002), Duration::from_micros(2_000));
    }
}
