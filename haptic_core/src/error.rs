use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HapticError {
    #[error("device init failed: {0}")]
    DeviceInit(String),
    #[error("firmware load failed: {0}")]
    FirmwareLoad(String),
    #[error("no calibration for serial {serial:?} and no default entry")]
    CalibrationMissing { serial: Option<String> },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for device")]
    Timeout,
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("missing device adapter")]
    MissingDevice,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("estimate window {window_s}s is shorter than one timestep of {timestep_s}s")]
    WindowTooShort { window_s: f64, timestep_s: f64 },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
