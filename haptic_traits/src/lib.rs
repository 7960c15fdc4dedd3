pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::path::Path;

/// Boundary to a 3-axis force-feedback device driver.
///
/// One adapter instance represents one device handle. `init` acquires the
/// handle and `shutdown` releases it; every other call is only meaningful in
/// between. Axis triples are ordered `[x, y, z]` in hardware units.
pub trait DeviceAdapter {
    fn init(&mut self, device_index: usize) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn load_firmware(
        &mut self,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Serial number of the opened device, if the driver can report one.
    fn serial_number(&self) -> Option<String>;
    /// Blocking read of the raw axis positions. Also services the device I/O loop.
    fn read_raw_position(&mut self) -> Result<[f64; 3], Box<dyn std::error::Error + Send + Sync>>;
    fn write_force(&mut self, force: [f64; 3])
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_leds(
        &mut self,
        red: bool,
        green: bool,
        blue: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: DeviceAdapter + ?Sized> DeviceAdapter for Box<T> {
    fn init(&mut self, device_index: usize) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).init(device_index)
    }
    fn load_firmware(
        &mut self,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).load_firmware(path)
    }
    fn serial_number(&self) -> Option<String> {
        (**self).serial_number()
    }
    fn read_raw_position(&mut self) -> Result<[f64; 3], Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_raw_position()
    }
    fn write_force(
        &mut self,
        force: [f64; 3],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_force(force)
    }
    fn set_leds(
        &mut self,
        red: bool,
        green: bool,
        blue: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_leds(red, green, blue)
    }
    fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).shutdown()
    }
}
