//! Scoped ownership of an initialized device handle.

use haptic_traits::DeviceAdapter;

/// Shuts the wrapped device down when dropped unless it was released with
/// [`DeviceGuard::into_inner`]. Shutdown errors on drop are logged, not raised.
pub struct DeviceGuard<D: DeviceAdapter> {
    device: Option<D>,
}

impl<D: DeviceAdapter> DeviceGuard<D> {
    /// Wrap a device whose `init` already succeeded.
    pub fn new(device: D) -> Self {
        Self {
            device: Some(device),
        }
    }

    /// Open device `index` and guard it. Nothing is shut down if `init` fails.
    pub fn open(
        mut device: D,
        index: usize,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        device.init(index)?;
        Ok(Self::new(device))
    }

    // `device` is only `None` inside `into_inner`, which consumes the guard.
    pub fn get(&self) -> &D {
        match &self.device {
            Some(d) => d,
            None => unreachable!("device taken before guard was consumed"),
        }
    }

    pub fn get_mut(&mut self) -> &mut D {
        match &mut self.device {
            Some(d) => d,
            None => unreachable!("device taken before guard was consumed"),
        }
    }

    /// Release the device without shutting it down.
    pub fn into_inner(mut self) -> D {
        match self.device.take() {
            Some(d) => d,
            None => unreachable!("device taken before guard was consumed"),
        }
    }
}

impl<D: DeviceAdapter> Drop for DeviceGuard<D> {
    fn drop(&mut self) {
        if let Some(dev) = self.device.as_mut()
            && let Err(e) = dev.shutdown()
        {
            tracing::warn!(error = %e, "device shutdown failed");
        }
    }
}
