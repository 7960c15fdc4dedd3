#![no_main]
use haptic_core::CalibrationSet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(file) = haptic_config::CalibrationFile::parse(data) {
        let _ = CalibrationSet::try_from(&file);
    }
});
