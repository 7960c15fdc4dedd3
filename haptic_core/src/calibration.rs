//! Per-axis linear normalization from raw hardware units to a dimensionless
//! range centered on zero (nominally `[-1, 1]`).
//!
//! `normalized = (raw - offset) / scale`, where `offset = (min + max) / 2`
//! and `scale = (max - min) / 2`.

use std::collections::HashMap;

use haptic_config::DEFAULT_CALIBRATION_KEY;

use crate::error::HapticError;
use crate::types::Axis;

/// Raw extents of one axis. Construction rejects a zero scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCalibration {
    min: f64,
    max: f64,
}

impl AxisCalibration {
    pub fn new(min: f64, max: f64) -> Result<Self, HapticError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(HapticError::Config(format!(
                "calibration extents must be finite (min={min}, max={max})"
            )));
        }
        let cal = Self { min, max };
        let scale = cal.scale();
        if scale == 0.0 || !scale.is_finite() || !cal.offset().is_finite() {
            return Err(HapticError::Config(format!(
                "calibration extents min={min}, max={max} yield zero or non-finite scale"
            )));
        }
        Ok(cal)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn offset(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        (self.max - self.min) / 2.0
    }

    #[inline]
    pub fn normalize(&self, raw: f64) -> f64 {
        (raw - self.offset()) / self.scale()
    }
}

/// Calibration entries keyed by device serial or `"default"`.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSet {
    entries: HashMap<String, [AxisCalibration; 3]>,
}

impl CalibrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, axes: [AxisCalibration; 3]) {
        self.entries.insert(key.into(), axes);
    }

    pub fn with_entry(mut self, key: impl Into<String>, axes: [AxisCalibration; 3]) -> Self {
        self.insert(key, axes);
        self
    }

    pub fn with_default(self, axes: [AxisCalibration; 3]) -> Self {
        self.with_entry(DEFAULT_CALIBRATION_KEY, axes)
    }

    pub fn get(&self, key: &str) -> Option<&[AxisCalibration; 3]> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact serial match first, then the `"default"` entry.
    pub fn lookup(
        &self,
        serial: Option<&str>,
    ) -> Result<(CalibrationSource, [AxisCalibration; 3]), HapticError> {
        if let Some(s) = serial
            && let Some(axes) = self.entries.get(s)
        {
            return Ok((CalibrationSource::Serial(s.to_string()), *axes));
        }
        match self.entries.get(DEFAULT_CALIBRATION_KEY) {
            Some(axes) => Ok((CalibrationSource::Default, *axes)),
            None => Err(HapticError::CalibrationMissing {
                serial: serial.map(str::to_string),
            }),
        }
    }
}

/// Where the active normalization came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalibrationSource {
    Serial(String),
    Default,
    /// Raw passthrough; no entry was found.
    Identity,
}

impl std::fmt::Display for CalibrationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationSource::Serial(s) => write!(f, "serial:{s}"),
            CalibrationSource::Default => f.write_str("default"),
            CalibrationSource::Identity => f.write_str("identity"),
        }
    }
}

/// Resolved normalization for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationMap {
    offset: [f64; 3],
    scale: [f64; 3],
    source: CalibrationSource,
}

impl CalibrationMap {
    /// Resolve the entry for `serial`. Fails with `CalibrationMissing` when
    /// neither the serial nor a default entry exists; choosing a fallback is
    /// up to the caller.
    pub fn load(set: &CalibrationSet, serial: Option<&str>) -> Result<Self, HapticError> {
        let (source, axes) = set.lookup(serial)?;
        Ok(Self::from_axes(&axes, source))
    }

    pub fn from_axes(axes: &[AxisCalibration; 3], source: CalibrationSource) -> Self {
        Self {
            offset: axes.map(|a| a.offset()),
            scale: axes.map(|a| a.scale()),
            source,
        }
    }

    /// Unscaled passthrough.
    pub fn identity() -> Self {
        Self {
            offset: [0.0; 3],
            scale: [1.0; 3],
            source: CalibrationSource::Identity,
        }
    }

    #[inline]
    pub fn normalize(&self, axis: Axis, raw: f64) -> f64 {
        let i = axis.index();
        (raw - self.offset[i]) / self.scale[i]
    }

    pub fn normalize_all(&self, raw: [f64; 3]) -> [f64; 3] {
        Axis::ALL.map(|axis| self.normalize(axis, raw[axis.index()]))
    }

    pub fn source(&self) -> &CalibrationSource {
        &self.source
    }

    pub fn offset(&self, axis: Axis) -> f64 {
        self.offset[axis.index()]
    }

    pub fn scale(&self, axis: Axis) -> f64 {
        self.scale[axis.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(min: f64, max: f64) -> [AxisCalibration; 3] {
        let a = AxisCalibration::new(min, max).unwrap();
        [a, a, a]
    }

    #[test]
    fn offset_and_scale_from_extents() {
        let a = AxisCalibration::new(0.075, 0.175).unwrap();
        assert!((a.offset() - 0.125).abs() < 1e-12);
        assert!((a.scale() - 0.05).abs() < 1e-12);
        assert!((a.normalize(0.175) - 1.0).abs() < 1e-12);
        assert!((a.normalize(0.075) + 1.0).abs() < 1e-12);
        assert!(a.normalize(0.125).abs() < 1e-12);
    }

    #[test]
    fn zero_scale_is_a_configuration_error() {
        let err = AxisCalibration::new(3.0, 3.0).unwrap_err();
        assert!(matches!(err, HapticError::Config(_)));
        assert!(AxisCalibration::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn scale_that_rounds_to_zero_or_overflows_is_rejected() {
        // (5e-324 - 0) / 2 underflows to 0.0
        assert!(matches!(
            AxisCalibration::new(0.0, 5e-324),
            Err(HapticError::Config(_))
        ));
        assert!(matches!(
            AxisCalibration::new(-f64::MAX, f64::MAX),
            Err(HapticError::Config(_))
        ));
        assert!(AxisCalibration::new(0.0, 1e-300).is_ok());
    }

    #[test]
    fn inverted_extents_flip_sign() {
        let a = AxisCalibration::new(1.0, -1.0).unwrap();
        assert!((a.normalize(1.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn exact_serial_wins_over_default() {
        let set = CalibrationSet::new()
            .with_default(axes(-1.0, 1.0))
            .with_entry("FAL-7", axes(0.0, 10.0));
        let map = CalibrationMap::load(&set, Some("FAL-7")).unwrap();
        assert_eq!(map.source(), &CalibrationSource::Serial("FAL-7".into()));
        assert!((map.normalize(Axis::Y, 10.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_serial_falls_back_to_default() {
        let set = CalibrationSet::new().with_default(axes(0.0, 4.0));
        let map = CalibrationMap::load(&set, Some("nope")).unwrap();
        assert_eq!(map.source(), &CalibrationSource::Default);
        assert!((map.offset(Axis::X) - 2.0).abs() < 1e-12);
        assert!((map.scale(Axis::Z) - 2.0).abs() < 1e-12);
        assert!((map.normalize(Axis::X, 3.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_entry_reports_serial() {
        let set = CalibrationSet::new().with_entry("A", axes(0.0, 1.0));
        let err = CalibrationMap::load(&set, Some("B")).unwrap_err();
        assert_eq!(
            err,
            HapticError::CalibrationMissing {
                serial: Some("B".into())
            }
        );
        let err = CalibrationMap::load(&CalibrationSet::new(), None).unwrap_err();
        assert_eq!(err, HapticError::CalibrationMissing { serial: None });
    }

    #[test]
    fn identity_passes_raw_through() {
        let map = CalibrationMap::identity();
        assert_eq!(map.normalize_all([1.5, -2.0, 0.25]), [1.5, -2.0, 0.25]);
        assert_eq!(map.source().to_string(), "identity");
    }
}
