#![no_main]
use haptic_core::{ForceCfg, LoopCfg};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse or validation errors are fine; panics are not.
    let Ok(cfg) = haptic_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // Anything that validates must also size an estimator window cleanly.
        let loop_cfg = LoopCfg::from(&cfg);
        let _ = haptic_core::util::window_len(loop_cfg.estimate_window_s, loop_cfg.timestep_s);
        let _ = ForceCfg::from(&cfg);
    }
});
