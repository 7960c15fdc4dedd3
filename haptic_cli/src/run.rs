//! Subcommand bodies: device assembly, paced run, raw monitor and self-check.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use haptic_config::Config;
use haptic_core::hw_error::map_hw_error;
use haptic_core::{
    CalibrationSet, CubeLimits, DeviceGuard, ForceCfg, HapticError, LoopCfg, RunOptions, RunStats,
    build_haptic_loop, run_paced,
};
use haptic_hardware::{SimParams, SimulatedFalcon};
use haptic_traits::{Clock, DeviceAdapter, MonotonicClock};

use crate::rt::{RtOptions, setup_rt_once};

/// Fail simulated reads after this many successful ones.
pub const SIM_FAIL_ENV: &str = "HAPTIC_SIM_FAIL_READ_AFTER";

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub cycles: Option<u64>,
    pub stats: bool,
    pub cube_radius: Option<f64>,
    pub cube_stiffness: Option<f64>,
    pub rt: Option<RtOptions>,
}

fn sim_params(cfg: &Config) -> SimParams {
    let fail_read_after = std::env::var(SIM_FAIL_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok());
    SimParams {
        serial: cfg.simulator.serial.clone(),
        device_count: cfg.simulator.device_count,
        amplitude: cfg.simulator.amplitude,
        frequency_hz: cfg.simulator.frequency_hz,
        compliance: cfg.simulator.compliance,
        timestep_s: cfg.timing.timestep_s,
        fail_read_after,
        ..SimParams::default()
    }
}

/// Load the calibration table. An explicitly requested file must exist; the
/// configured default path may be absent, which leaves the choice to
/// `calibration.on_missing`.
pub fn load_calibration(path: &Path, explicit: bool) -> eyre::Result<Option<CalibrationSet>> {
    let file = if explicit {
        Some(haptic_config::load_calibration_json(path))
    } else {
        haptic_config::load_calibration_json_opt(path).transpose()
    };
    let file = match file {
        Some(res) => res.map_err(|e| eyre::Report::new(HapticError::Config(format!("{e}"))))?,
        None => {
            tracing::warn!(path = %path.display(), "calibration file not found");
            return Ok(None);
        }
    };
    let set = CalibrationSet::try_from(&file).map_err(eyre::Report::new)?;
    tracing::info!(path = %path.display(), entries = set.len(), "calibration loaded");
    Ok(Some(set))
}

fn cube_limits(cfg: &Config, args: &RunArgs) -> Option<CubeLimits> {
    let from_cfg = cfg.limits.as_ref().map(CubeLimits::from);
    match args.cube_radius {
        Some(radius) => {
            let base = from_cfg.unwrap_or_default();
            Some(CubeLimits {
                radius,
                stiffness: args.cube_stiffness.unwrap_or(base.stiffness),
                ..base
            })
        }
        None => from_cfg,
    }
}

fn open_device(cfg: &Config) -> eyre::Result<DeviceGuard<SimulatedFalcon>> {
    let index = cfg.device.index;
    let mut guard = DeviceGuard::open(SimulatedFalcon::new(sim_params(cfg)), index).map_err(|e| {
        eyre::Report::new(HapticError::DeviceInit(format!("device {index}: {e}")))
    })?;
    if let Some(fw) = cfg.device.firmware.as_deref() {
        guard
            .get_mut()
            .load_firmware(Path::new(fw))
            .map_err(|e| eyre::Report::new(HapticError::FirmwareLoad(format!("{fw}: {e}"))))?;
    }
    Ok(guard)
}

fn print_stats(stats: &RunStats, timestep_s: f64) {
    eprintln!("\n--- Haptic Stats ---");
    eprintln!("Cycles: {}", stats.cycles);
    eprintln!("Period (us): {}", haptic_core::util::period_us(timestep_s));
    eprintln!(
        "Latency mean/max (us): {:.1} / {}",
        stats.mean_latency_us, stats.max_latency_us
    );
    eprintln!("Missed deadlines (> period): {}", stats.missed_deadlines);
    eprintln!("--------------------\n");
}

pub fn run_loop(
    cfg: &Config,
    calibration: Option<&CalibrationSet>,
    args: &RunArgs,
    json: bool,
) -> eyre::Result<()> {
    if let Some(rt) = args.rt {
        setup_rt_once(rt);
    }

    let loop_cfg = LoopCfg::from(cfg);
    let force = ForceCfg::from(cfg);
    let device = SimulatedFalcon::new(sim_params(cfg));
    let mut haptic = build_haptic_loop(device, loop_cfg, force, cube_limits(cfg, args), calibration)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "Ctrl-C handler not installed");
        }
    }

    haptic.set_leds(false, true, false)?;
    let result = run_paced(
        &mut haptic,
        &MonotonicClock::new(),
        RunOptions {
            max_cycles: args.cycles,
        },
        &shutdown,
        |_| {},
    );
    if let Err(e) = haptic.set_leds(false, false, false) {
        tracing::warn!(error = %e, "failed to turn LEDs off");
    }
    let pos = haptic.get_pos();
    let vel = haptic.get_vel();
    let source = haptic.calibration().source().to_string();
    let serial = haptic.serial().map(str::to_string);
    let timestep_s = haptic.timestep_s();
    haptic.shutdown()?;
    let stats = result?;

    if json {
        let mut obj = serde_json::json!({
            "cycles": stats.cycles,
            "missed_deadlines": stats.missed_deadlines,
            "pos": pos,
            "vel": vel,
            "calibration": source,
            "serial": serial,
        });
        if args.stats {
            obj["max_latency_us"] = serde_json::json!(stats.max_latency_us);
            obj["mean_latency_us"] = serde_json::json!(stats.mean_latency_us);
        }
        println!("{obj}");
    } else {
        println!(
            "run complete: {} cycles, {} missed deadlines",
            stats.cycles, stats.missed_deadlines
        );
        println!("pos: [{:.6}, {:.6}, {:.6}]", pos[0], pos[1], pos[2]);
        println!("vel: [{:.6}, {:.6}, {:.6}]", vel[0], vel[1], vel[2]);
        println!("calibration: {source}");
        if args.stats {
            print_stats(&stats, timestep_s);
        }
    }
    Ok(())
}

pub fn raw(cfg: &Config, cycles: u64, json: bool) -> eyre::Result<()> {
    let mut guard = open_device(cfg)?;
    let clock = MonotonicClock::new();
    let period = haptic_core::util::period(cfg.timing.timestep_s);
    let mut deadline = clock.now() + period;
    for i in 0..cycles {
        let [x, y, z] = guard
            .get_mut()
            .read_raw_position()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("raw read {i}"))?;
        if json {
            println!("{}", serde_json::json!({ "cycle": i, "raw": [x, y, z] }));
        } else {
            println!("{i:>6} {x:>12.6} {y:>12.6} {z:>12.6}");
        }
        clock.sleep_until(deadline);
        deadline += period;
    }
    Ok(())
}

pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let mut guard = open_device(cfg)?;
    let serial = guard.get().serial_number();
    guard
        .get_mut()
        .read_raw_position()
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err("self-check read")?;
    tracing::info!(serial = serial.as_deref().unwrap_or("<unknown>"), "self-check read ok");
    drop(guard);
    println!("self-check ok");
    Ok(())
}
