//! Device backends implementing `haptic_traits::DeviceAdapter`.
//!
//! Only a simulated Falcon-style device ships here; native USB transport is
//! provided by the vendor driver and wrapped outside this workspace.
pub mod error;

use std::f64::consts::TAU;
use std::path::Path;

use error::HwError;
use haptic_traits::DeviceAdapter;

/// Parameters of the simulated device.
#[derive(Debug, Clone)]
pub struct SimParams {
    pub serial: String,
    /// Number of devices "present" on the bus; `init` fails for larger indices.
    pub device_count: usize,
    /// Raw (min, max) extents per axis in hardware units.
    pub extents: [(f64, f64); 3],
    /// Oscillation amplitude per axis as a fraction of the half-range.
    pub amplitude: [f64; 3],
    pub frequency_hz: f64,
    /// Normalized displacement per unit of commanded force.
    pub compliance: f64,
    /// Simulated time advanced per read.
    pub timestep_s: f64,
    /// Fail every read after this many successful ones.
    pub fail_read_after: Option<u64>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            serial: "SIM0001".to_string(),
            device_count: 1,
            extents: [(-0.06, 0.06), (-0.06, 0.06), (0.075, 0.175)],
            amplitude: [0.01, 0.01, 0.01],
            frequency_hz: 0.5,
            compliance: 0.001,
            timestep_s: 0.001,
            fail_read_after: None,
        }
    }
}

/// Deterministic stand-in for a Novint Falcon.
///
/// Each read advances simulated time by one timestep. The end effector
/// oscillates around the workspace center and is displaced by the last
/// commanded force scaled by `compliance`.
#[derive(Debug)]
pub struct SimulatedFalcon {
    params: SimParams,
    device_index: Option<usize>,
    firmware_loaded: bool,
    reads: u64,
    last_force: [f64; 3],
    leds: (bool, bool, bool),
}

impl SimulatedFalcon {
    pub fn new(params: SimParams) -> Self {
        Self {
            params,
            device_index: None,
            firmware_loaded: false,
            reads: 0,
            last_force: [0.0; 3],
            leds: (false, false, false),
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn is_open(&self) -> bool {
        self.device_index.is_some()
    }

    pub fn firmware_loaded(&self) -> bool {
        self.firmware_loaded
    }

    pub fn last_force(&self) -> [f64; 3] {
        self.last_force
    }

    pub fn leds(&self) -> (bool, bool, bool) {
        self.leds
    }

    fn ensure_open(&self) -> error::Result<()> {
        if self.device_index.is_none() {
            return Err(HwError::NotInitialized);
        }
        Ok(())
    }

    fn sample(&self) -> [f64; 3] {
        let t = self.reads as f64 * self.params.timestep_s;
        let mut raw = [0.0; 3];
        for (axis, value) in raw.iter_mut().enumerate() {
            let (min, max) = self.params.extents[axis];
            let center = (min + max) / 2.0;
            let half = (max - min) / 2.0;
            let phase = axis as f64 * TAU / 3.0;
            let wave = self.params.amplitude[axis] * (TAU * self.params.frequency_hz * t + phase).sin();
            let push = self.params.compliance * self.last_force[axis];
            *value = center + half * (wave + push);
        }
        raw
    }
}

impl Default for SimulatedFalcon {
    fn default() -> Self {
        Self::new(SimParams::default())
    }
}

impl DeviceAdapter for SimulatedFalcon {
    fn init(&mut self, device_index: usize) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if device_index >= self.params.device_count {
            return Err(Box::new(HwError::DeviceNotFound(device_index)));
        }
        self.device_index = Some(device_index);
        self.reads = 0;
        tracing::debug!(device_index, serial = %self.params.serial, "simulated device opened");
        Ok(())
    }

    fn load_firmware(
        &mut self,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.ensure_open()?;
        if path.as_os_str().is_empty() {
            return Err(Box::new(HwError::Firmware("empty firmware path".into())));
        }
        self.firmware_loaded = true;
        tracing::debug!(path = %path.display(), "simulated firmware loaded");
        Ok(())
    }

    fn serial_number(&self) -> Option<String> {
        self.device_index.map(|_| self.params.serial.clone())
    }

    fn read_raw_position(&mut self) -> Result<[f64; 3], Box<dyn std::error::Error + Send + Sync>> {
        self.ensure_open()?;
        if let Some(limit) = self.params.fail_read_after
            && self.reads >= limit
        {
            return Err(Box::new(HwError::Timeout));
        }
        let raw = self.sample();
        self.reads += 1;
        tracing::trace!(x = raw[0], y = raw[1], z = raw[2], "simulated raw read");
        Ok(raw)
    }

    fn write_force(
        &mut self,
        force: [f64; 3],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.ensure_open()?;
        self.last_force = force;
        Ok(())
    }

    fn set_leds(
        &mut self,
        red: bool,
        green: bool,
        blue: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.ensure_open()?;
        self.leds = (red, green, blue);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(index) = self.device_index.take() {
            self.last_force = [0.0; 3];
            self.leds = (false, false, false);
            tracing::debug!(device_index = index, "simulated device closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_stay_inside_extents() {
        let mut dev = SimulatedFalcon::default();
        dev.init(0).unwrap();
        for _ in 0..2000 {
            let raw = dev.read_raw_position().unwrap();
            for (axis, v) in raw.iter().enumerate() {
                let (min, max) = dev.params().extents[axis];
                assert!(*v >= min && *v <= max, "axis {axis} out of range: {v}");
            }
        }
    }

    #[test]
    fn read_before_init_fails() {
        let mut dev = SimulatedFalcon::default();
        let err = dev.read_raw_position().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HwError>(),
            Some(HwError::NotInitialized)
        ));
    }

    #[test]
    fn force_displaces_position() {
        let params = SimParams {
            amplitude: [0.0; 3],
            compliance: 0.1,
            ..SimParams::default()
        };
        let mut dev = SimulatedFalcon::new(params);
        dev.init(0).unwrap();
        let before = dev.read_raw_position().unwrap();
        dev.write_force([1.0, 0.0, 0.0]).unwrap();
        let after = dev.read_raw_position().unwrap();
        assert!(after[0] > before[0]);
        assert!((after[1] - before[1]).abs() < 1e-12);
    }
}
