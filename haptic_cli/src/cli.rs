//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "haptic", version, about = "Haptic device control loop")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Calibration JSON (overrides [calibration] file)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the control loop at the configured timestep
    Run {
        /// Stop after N cycles (default: until Ctrl-C)
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Print cycle latency and deadline stats
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
        /// Apply a workspace cube of this radius around the origin
        #[arg(long, value_name = "R")]
        cube_radius: Option<f64>,
        /// Cube stiffness (default 10, or [limits] stiffness)
        #[arg(long, value_name = "K", requires = "cube_radius")]
        cube_stiffness: Option<f64>,
        /// Enable real-time mode (Linux: SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority, pins to one CPU, and locks the address space with mlockall. Needs CAP_SYS_NICE / CAP_IPC_LOCK (or root); failures are logged as warnings and the loop still runs."
        )]
        rt: bool,
        /// SCHED_FIFO priority when --rt is set (clamped to the system range)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE", default_value = "current")]
        rt_lock: RtLock,
        /// CPU index to pin to when --rt is set (default 0)
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
    },
    /// Print raw device positions each cycle
    Raw {
        /// Number of samples to print
        #[arg(long, value_name = "N", default_value_t = 10)]
        cycles: u64,
    },
    /// Open the device, load firmware, read once, shut down
    SelfCheck,
}
