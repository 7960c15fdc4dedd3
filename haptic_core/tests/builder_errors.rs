use std::path::PathBuf;

use haptic_core::error::{BuildError, HapticError};
use haptic_core::mocks::ScriptedDevice;
use haptic_core::{DynHapticLoop, ForceCfg, LoopCfg, LoopState, build_haptic_loop};
use rstest::rstest;

#[rstest]
fn builder_missing_device_yields_typed_build_error() {
    let err = DynHapticLoop::builder()
        // missing with_device()
        .with_loop_cfg(LoopCfg::default())
        .try_build()
        .expect_err("should fail with MissingDevice");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingDevice) => {}
        other => panic!("expected MissingDevice, got: {other:?}"),
    }
}

#[rstest]
#[case(0.005, 0.01)]
#[case(0.0009, 0.001)]
fn window_shorter_than_timestep_fails_before_device_init(
    #[case] window_s: f64,
    #[case] timestep_s: f64,
) {
    let dev = ScriptedDevice::new();
    let log = dev.log();
    let err = DynHapticLoop::builder()
        .with_device(dev)
        .with_loop_cfg(LoopCfg {
            timestep_s,
            estimate_window_s: window_s,
            ..LoopCfg::default()
        })
        .build()
        .expect_err("window too short");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::WindowTooShort { .. })
    ));
    assert!(log.borrow().inits.is_empty());
}

#[rstest]
#[case(0.0)]
#[case(-0.01)]
#[case(f64::NAN)]
fn bad_timestep_is_invalid_config(#[case] timestep_s: f64) {
    let err = build_haptic_loop(
        ScriptedDevice::new(),
        LoopCfg {
            timestep_s,
            ..LoopCfg::default()
        },
        ForceCfg::default(),
        None,
        None,
    )
    .expect_err("bad timestep");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[test]
fn non_finite_damping_is_rejected() {
    let err = build_haptic_loop(
        ScriptedDevice::new(),
        LoopCfg::default(),
        ForceCfg {
            damping: [0.0, f64::INFINITY, 0.0],
            ..ForceCfg::default()
        },
        None,
        None,
    )
    .expect_err("inf damping");
    assert!(err.downcast_ref::<BuildError>().is_some());
}

#[test]
fn init_failure_is_device_init_and_skips_shutdown() {
    let dev = ScriptedDevice::new().failing_init();
    let log = dev.log();
    let err = build_haptic_loop(dev, LoopCfg::default(), ForceCfg::default(), None, None)
        .expect_err("init fails");
    assert!(matches!(
        err.downcast_ref::<HapticError>(),
        Some(HapticError::DeviceInit(_))
    ));
    let log = log.borrow();
    assert_eq!(log.inits, vec![0]);
    assert_eq!(log.shutdowns, 0);
}

#[test]
fn firmware_failure_releases_device() {
    let dev = ScriptedDevice::new().failing_firmware();
    let log = dev.log();
    let cfg = LoopCfg {
        firmware: Some(PathBuf::from("fw/test.bin")),
        ..LoopCfg::default()
    };
    let err = build_haptic_loop(dev, cfg, ForceCfg::default(), None, None)
        .expect_err("firmware fails");
    assert!(matches!(
        err.downcast_ref::<HapticError>(),
        Some(HapticError::FirmwareLoad(_))
    ));
    let log = log.borrow();
    assert_eq!(log.firmware, vec![PathBuf::from("fw/test.bin")]);
    assert_eq!(log.shutdowns, 1);
}

#[test]
fn successful_build_is_ready_with_requested_window() {
    let dev = ScriptedDevice::new().with_serial("FAL-1");
    let log = dev.log();
    let cfg = LoopCfg {
        device_index: 2,
        firmware: Some(PathBuf::from("fw.bin")),
        ..LoopCfg::default()
    };
    let h = DynHapticLoop::builder()
        .with_device(dev)
        .with_loop_cfg(cfg)
        .build()
        .unwrap();
    assert_eq!(h.state(), LoopState::Ready);
    assert_eq!(h.window_len(), 10);
    assert_eq!(h.serial(), Some("FAL-1"));
    assert_eq!(log.borrow().inits, vec![2]);
    assert_eq!(log.borrow().shutdowns, 0);
}
