//! Test doubles for `haptic_traits::DeviceAdapter`.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use haptic_traits::DeviceAdapter;

/// Every call a [`ScriptedDevice`] received, in arrival order per kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeviceLog {
    pub inits: Vec<usize>,
    pub firmware: Vec<PathBuf>,
    /// Read attempts, failed ones included.
    pub reads: usize,
    /// Forces that were accepted by the device.
    pub writes: Vec<[f64; 3]>,
    pub leds: Vec<(bool, bool, bool)>,
    pub shutdowns: usize,
}

/// Replays scripted raw positions and records every adapter call.
///
/// Once the script runs out the last sample is repeated. Failure switches
/// make single calls fail without consuming script entries.
#[derive(Debug)]
pub struct ScriptedDevice {
    script: VecDeque<[f64; 3]>,
    last: [f64; 3],
    serial: Option<String>,
    open: bool,
    fail_init: bool,
    fail_firmware: bool,
    fail_leds: bool,
    fail_reads: BTreeSet<usize>,
    fail_writes: BTreeSet<usize>,
    write_attempts: usize,
    log: Rc<RefCell<DeviceLog>>,
}

impl Default for ScriptedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            last: [0.0; 3],
            serial: None,
            open: false,
            fail_init: false,
            fail_firmware: false,
            fail_leds: false,
            fail_reads: BTreeSet::new(),
            fail_writes: BTreeSet::new(),
            write_attempts: 0,
            log: Rc::new(RefCell::new(DeviceLog::default())),
        }
    }

    /// Append raw samples to replay.
    pub fn with_samples(mut self, samples: impl IntoIterator<Item = [f64; 3]>) -> Self {
        self.script.extend(samples);
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_firmware(mut self) -> Self {
        self.fail_firmware = true;
        self
    }

    pub fn failing_leds(mut self) -> Self {
        self.fail_leds = true;
        self
    }

    /// Fail the read attempt with zero-based index `n`.
    pub fn fail_read_at(mut self, n: usize) -> Self {
        self.fail_reads.insert(n);
        self
    }

    /// Fail the write attempt with zero-based index `n`.
    pub fn fail_write_at(mut self, n: usize) -> Self {
        self.fail_writes.insert(n);
        self
    }

    /// Shared handle to the call log; stays valid after the device is moved.
    pub fn log(&self) -> Rc<RefCell<DeviceLog>> {
        Rc::clone(&self.log)
    }

    fn require_open(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.open {
            Ok(())
        } else {
            Err("device not open".into())
        }
    }
}

impl DeviceAdapter for ScriptedDevice {
    fn init(&mut self, device_index: usize) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.log.borrow_mut().inits.push(device_index);
        if self.fail_init {
            return Err(format!("no device at index {device_index}").into());
        }
        self.open = true;
        Ok(())
    }

    fn load_firmware(
        &mut self,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.log.borrow_mut().firmware.push(path.to_path_buf());
        self.require_open()?;
        if self.fail_firmware {
            return Err("firmware rejected".into());
        }
        Ok(())
    }

    fn serial_number(&self) -> Option<String> {
        if self.open { self.serial.clone() } else { None }
    }

    fn read_raw_position(&mut self) -> Result<[f64; 3], Box<dyn std::error::Error + Send + Sync>> {
        let attempt = {
            let mut log = self.log.borrow_mut();
            log.reads += 1;
            log.reads - 1
        };
        self.require_open()?;
        if self.fail_reads.contains(&attempt) {
            return Err("scripted read failure".into());
        }
        if let Some(s) = self.script.pop_front() {
            self.last = s;
        }
        Ok(self.last)
    }

    fn write_force(
        &mut self,
        force: [f64; 3],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let attempt = self.write_attempts;
        self.write_attempts += 1;
        self.require_open()?;
        if self.fail_writes.contains(&attempt) {
            return Err("scripted write failure".into());
        }
        self.log.borrow_mut().writes.push(force);
        Ok(())
    }

    fn set_leds(
        &mut self,
        red: bool,
        green: bool,
        blue: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.require_open()?;
        if self.fail_leds {
            return Err("led write failed".into());
        }
        self.log.borrow_mut().leds.push((red, green, blue));
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.log.borrow_mut().shutdowns += 1;
        self.open = false;
        Ok(())
    }
}
