//! Real-time scheduling for the control thread (Linux: mlockall, SCHED_FIFO, affinity).
//!
//! Every step is best-effort: a failure is logged as a warning and the loop
//! runs with normal scheduling.

use crate::cli::RtLock;

#[derive(Debug, Clone, Copy)]
pub struct RtOptions {
    pub prio: Option<i32>,
    pub lock: RtLock,
    pub cpu: Option<usize>,
}

#[cfg(target_os = "linux")]
fn os_result(rc: libc::c_int) -> std::io::Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(target_os = "linux")]
fn lock_memory(lock: RtLock) -> std::io::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};
    match lock {
        RtLock::None => Ok(()),
        RtLock::Current => os_result(unsafe { mlockall(MCL_CURRENT) }),
        RtLock::All => os_result(unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) }).or_else(|e| {
            // Future pages need a larger memlock budget; settle for resident ones.
            if matches!(e.raw_os_error(), Some(libc::EPERM | libc::ENOMEM)) {
                os_result(unsafe { mlockall(MCL_CURRENT) })
            } else {
                Err(e)
            }
        }),
    }
}

#[cfg(target_os = "linux")]
fn set_fifo_priority(prio: Option<i32>) -> std::io::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};
    let (min, max) = unsafe { (sched_get_priority_min(SCHED_FIFO), sched_get_priority_max(SCHED_FIFO)) };
    let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
    let prio = prio.unwrap_or(max).clamp(min, max);
    let param = sched_param {
        sched_priority: prio,
    };
    os_result(unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) })?;
    Ok(prio)
}

#[cfg(target_os = "linux")]
fn pin_to_cpu(cpu: usize) -> eyre::Result<()> {
    let capacity = std::mem::size_of::<libc::cpu_set_t>() * 8;
    if cpu >= capacity {
        eyre::bail!("CPU {cpu} exceeds cpu_set_t capacity {capacity}");
    }
    let mut allowed: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    os_result(unsafe {
        libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut allowed)
    })?;
    if !unsafe { libc::CPU_ISSET(cpu, &allowed) } {
        eyre::bail!("CPU {cpu} not permitted by current affinity mask");
    }
    let mut desired: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        libc::CPU_ZERO(&mut desired);
        libc::CPU_SET(cpu, &mut desired);
    }
    os_result(unsafe {
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &desired)
    })?;
    Ok(())
}

/// Apply real-time settings once per process.
#[cfg(target_os = "linux")]
pub fn setup_rt_once(opts: RtOptions) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    RT_ONCE.get_or_init(|| {
        match lock_memory(opts.lock) {
            Ok(()) => tracing::info!(lock = ?opts.lock, "memory locked"),
            Err(e) => tracing::warn!(
                error = %e,
                "mlockall failed; needs CAP_IPC_LOCK (or root) and a sufficient 'ulimit -l'"
            ),
        }
        match set_fifo_priority(opts.prio) {
            Ok(prio) => tracing::info!(prio, "SCHED_FIFO enabled"),
            Err(e) => tracing::warn!(error = %e, "SCHED_FIFO failed; needs CAP_SYS_NICE or root"),
        }
        let cpu = opts.cpu.unwrap_or(0);
        match pin_to_cpu(cpu) {
            Ok(()) => tracing::info!(cpu, "pinned to CPU"),
            Err(e) => tracing::warn!(error = %e, "affinity not applied"),
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(opts: RtOptions) {
    let _ = opts;
    tracing::warn!("real-time mode is only supported on Linux; continuing without it");
}
