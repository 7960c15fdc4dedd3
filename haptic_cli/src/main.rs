#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod rt;
mod run;

use std::path::{Path, PathBuf};

use clap::Parser;
use haptic_config::{Config, Logging};
use haptic_core::HapticError;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::rt::RtOptions;
use crate::run::RunArgs;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        tracing::debug!(error = ?e, "exiting with error");
        std::process::exit(exit_code_for_error(&e));
    }
}

fn config_error(e: eyre::Report) -> eyre::Report {
    eyre::Report::new(HapticError::Config(format!("{e}")))
}

fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let cfg = match path {
        Some(p) => haptic_config::load_config_file(p).map_err(config_error)?,
        None => Config::default(),
    };
    cfg.validate().map_err(config_error)?;
    Ok(cfg)
}

fn console_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn init_tracing(cli: &Cli, logging: &Logging) {
    let console_json = cli.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter(&cli.log_level))
    });
    let console_pretty = (!cli.json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter(&cli.log_level))
    });

    // Optional JSON-lines file sink
    let file = logging.file.as_deref().map(|path| {
        let path = Path::new(path);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| PathBuf::from("haptic.log"), PathBuf::from);
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(EnvFilter::new(logging.level.as_deref().unwrap_or("info")))
    });

    let _ = tracing_subscriber::registry()
        .with(console_json)
        .with(console_pretty)
        .with(file)
        .try_init();
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let _ = color_eyre::install();
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(&cli, &cfg.logging);
    tracing::debug!(config = ?cli.config, "configuration loaded");

    match &cli.cmd {
        Commands::Run {
            cycles,
            stats,
            cube_radius,
            cube_stiffness,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            let calibration = match (&cli.calibration, &cfg.calibration.file) {
                (Some(p), _) => run::load_calibration(p, true)?,
                (None, Some(p)) => run::load_calibration(Path::new(p), false)?,
                (None, None) => None,
            };
            let args = RunArgs {
                cycles: *cycles,
                stats: *stats,
                cube_radius: *cube_radius,
                cube_stiffness: *cube_stiffness,
                rt: rt.then_some(RtOptions {
                    prio: *rt_prio,
                    lock: *rt_lock,
                    cpu: *rt_cpu,
                }),
            };
            run::run_loop(&cfg, calibration.as_ref(), &args, cli.json)
        }
        Commands::Raw { cycles } => run::raw(&cfg, *cycles, cli.json),
        Commands::SelfCheck => run::self_check(&cfg),
    }
}
