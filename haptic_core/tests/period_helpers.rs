use std::time::Duration;

use haptic_core::error::BuildError;
use haptic_core::util::{period, period_us, window_len};
use rstest::rstest;

#[rstest]
#[case(0.1, 0.01, 10)]
#[case(0.01, 0.001, 10)]
#[case(0.3, 0.1, 2)]
#[case(0.019, 0.01, 1)]
#[case(1.0, 0.001, 1000)]
fn window_len_floors_ratio(#[case] window_s: f64, #[case] dt: f64, #[case] want: usize) {
    assert_eq!(window_len(window_s, dt), Ok(want));
}

#[rstest]
#[case(0.0, 0.01)]
#[case(f64::INFINITY, 0.01)]
#[case(0.1, -1.0)]
#[case(1.0, 1e-12)]
fn window_len_rejects_bad_inputs(#[case] window_s: f64, #[case] dt: f64) {
    assert!(matches!(
        window_len(window_s, dt),
        Err(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
#[case(0.001, 1_000)]
#[case(0.0005, 500)]
#[case(0.0000001, 1)]
#[case(f64::NAN, 1)]
fn period_is_at_least_one_micro(#[case] dt: f64, #[case] want: u64) {
    assert_eq!(period_us(dt), want);
    assert_eq!(period(dt), Duration::from_micros(want));
}
