//! Fixed-rate driver for the two-call control cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use eyre::WrapErr;
use haptic_traits::{Clock, DeviceAdapter};

use crate::control::HapticLoop;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after this many cycles; `None` runs until the shutdown flag is raised.
    pub max_cycles: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub cycles: u64,
    /// Cycles that finished after their deadline.
    pub missed_deadlines: u64,
    pub max_latency_us: u64,
    pub mean_latency_us: f64,
}

#[inline]
fn micros_between(start: Instant, end: Instant) -> u64 {
    u64::try_from(end.saturating_duration_since(start).as_micros()).unwrap_or(u64::MAX)
}

/// Run `update_state`, `on_cycle`, `output_forces` once per timestep.
///
/// Per-cycle errors are returned immediately without retry. A cycle that
/// overruns its deadline is counted and the schedule restarts from the end
/// of that cycle instead of trying to catch up.
pub fn run_paced<D, C, F>(
    haptic: &mut HapticLoop<D>,
    clock: &C,
    opts: RunOptions,
    shutdown: &AtomicBool,
    mut on_cycle: F,
) -> Result<RunStats>
where
    D: DeviceAdapter,
    C: Clock + ?Sized,
    F: FnMut(&mut HapticLoop<D>),
{
    let period = crate::util::period(haptic.timestep_s());
    let mut stats = RunStats::default();
    let mut latency_sum_us: u128 = 0;
    let mut deadline = clock.now() + period;

    tracing::info!(
        period_us = period.as_micros() as u64,
        max_cycles = ?opts.max_cycles,
        "paced run start"
    );

    while !shutdown.load(Ordering::Relaxed) {
        if opts.max_cycles.is_some_and(|max| stats.cycles >= max) {
            break;
        }
        let started = clock.now();
        haptic
            .update_state()
            .wrap_err_with(|| format!("cycle {}", stats.cycles))?;
        on_cycle(haptic);
        haptic
            .output_forces()
            .wrap_err_with(|| format!("cycle {}", stats.cycles))?;
        let finished = clock.now();

        let latency_us = micros_between(started, finished);
        stats.cycles += 1;
        stats.max_latency_us = stats.max_latency_us.max(latency_us);
        latency_sum_us += u128::from(latency_us);

        if finished > deadline {
            stats.missed_deadlines += 1;
            tracing::debug!(
                cycle = stats.cycles,
                overrun_us = micros_between(deadline, finished),
                "missed cycle deadline"
            );
            deadline = finished + period;
        } else {
            clock.sleep_until(deadline);
            deadline += period;
        }
    }

    if stats.cycles > 0 {
        stats.mean_latency_us = latency_sum_us as f64 / stats.cycles as f64;
    }
    tracing::info!(
        cycles = stats.cycles,
        missed = stats.missed_deadlines,
        max_latency_us = stats.max_latency_us,
        "paced run stopped"
    );
    Ok(stats)
}
