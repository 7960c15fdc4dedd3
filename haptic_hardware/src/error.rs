use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("no device at index {0}")]
    DeviceNotFound(usize),
    #[error("device not initialized")]
    NotInitialized,
    #[error("firmware load failed: {0}")]
    Firmware(String),
    #[error("device read timeout")]
    Timeout,
    #[error("usb transfer failed: {0}")]
    Transfer(String),
}

pub type Result<T> = std::result::Result<T, HwError>;
