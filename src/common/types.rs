// src/common/types.rs

use arrayvec::ArrayVec;
use core::fmt;

/// Maximum number of targets a single multi-ranging result can carry.
pub const MAX_TARGETS: usize = 4;

// --- Sensor identity & lifecycle ---

/// Identifies one of the configured sensors. The value is an index into the
/// manager's sensor table and is fixed at configuration time.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorId(u8);

impl SensorId {
    pub const fn new(index: u8) -> Self {
        SensorId(index)
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for SensorId {
    fn from(value: u8) -> Self {
        SensorId(value)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tof{}", self.0)
    }
}

/// Lifecycle state of a single sensor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorState {
    #[default]
    NotInit,
    InitInProgress,
    Idle,
    Measuring,
    Error,
}

/// Ranging distance preset passed to the sensor during initialization.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DistanceMode {
    #[default]
    Short = 1,
    Medium = 2,
    Long = 3,
}

// --- Ranging payload ---

/// Unsigned 16.16 fixed-point value as reported by the sensor for rates and sigma.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fix1616(pub u32);

impl Fix1616 {
    pub const fn integer_part(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub fn to_f32(&self) -> f32 {
        self.0 as f32 / 65536.0
    }
}

/// Per-target range status code.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeStatus {
    /// Ranging is valid.
    Valid,
    /// Sigma estimator above the configured limit.
    SigmaFail,
    /// Return signal too weak.
    SignalFail,
    /// Target below the minimum detection threshold.
    RangeValidMinRangeClipped,
    /// Phase out of the valid window.
    OutOfBounds,
    /// Hardware or VCSEL failure.
    HardwareFail,
    /// Valid range, but no wrap-around check was performed.
    RangeValidNoWrapCheck,
    /// Wrap-around detected.
    WrapTargetFail,
    /// Processing failure inside the device.
    ProcessingFail,
    /// Cross-talk signal above threshold.
    XtalkSignalFail,
    /// First valid range after interrupt setup; may be inaccurate.
    SynchronizationInt,
    /// Valid range merged from several targets.
    RangeValidMergedPulse,
    /// Target present but lacking signal to report a range.
    TargetPresentLackOfSignal,
    /// No target detected.
    NoTarget,
    /// Status code not known to this crate.
    Unknown(u8),
}

impl RangeStatus {
    /// Whether the distance in the same target entry can be used.
    pub const fn is_valid(&self) -> bool {
        matches!(
            self,
            RangeStatus::Valid
                | RangeStatus::RangeValidNoWrapCheck
                | RangeStatus::RangeValidMinRangeClipped
                | RangeStatus::RangeValidMergedPulse
        )
    }
}

impl From<u8> for RangeStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => RangeStatus::Valid,
            1 => RangeStatus::SigmaFail,
            2 => RangeStatus::SignalFail,
            3 => RangeStatus::RangeValidMinRangeClipped,
            4 => RangeStatus::OutOfBounds,
            5 => RangeStatus::HardwareFail,
            6 => RangeStatus::RangeValidNoWrapCheck,
            7 => RangeStatus::WrapTargetFail,
            8 => RangeStatus::ProcessingFail,
            9 => RangeStatus::XtalkSignalFail,
            10 => RangeStatus::SynchronizationInt,
            11 => RangeStatus::RangeValidMergedPulse,
            12 => RangeStatus::TargetPresentLackOfSignal,
            255 => RangeStatus::NoTarget,
            other => RangeStatus::Unknown(other),
        }
    }
}

impl From<RangeStatus> for u8 {
    fn from(status: RangeStatus) -> Self {
        match status {
            RangeStatus::Valid => 0,
            RangeStatus::SigmaFail => 1,
            RangeStatus::SignalFail => 2,
            RangeStatus::RangeValidMinRangeClipped => 3,
            RangeStatus::OutOfBounds => 4,
            RangeStatus::HardwareFail => 5,
            RangeStatus::RangeValidNoWrapCheck => 6,
            RangeStatus::WrapTargetFail => 7,
            RangeStatus::ProcessingFail => 8,
            RangeStatus::XtalkSignalFail => 9,
            RangeStatus::SynchronizationInt => 10,
            RangeStatus::RangeValidMergedPulse => 11,
            RangeStatus::TargetPresentLackOfSignal => 12,
            RangeStatus::NoTarget => 255,
            RangeStatus::Unknown(value) => value,
        }
    }
}

/// One detected target within a multi-ranging result.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetRange {
    /// Estimated distance in millimeters.
    pub range_mm: i16,
    /// Lower bound of the distance estimate.
    pub range_min_mm: i16,
    /// Upper bound of the distance estimate.
    pub range_max_mm: i16,
    /// Estimated standard deviation of the range, in millimeters.
    pub sigma_mm: Fix1616,
    /// Return signal rate in mega counts per second.
    pub signal_rate_mcps: Fix1616,
    /// Ambient rate in mega counts per second.
    pub ambient_rate_mcps: Fix1616,
    pub status: RangeStatus,
}

/// The payload of one measurement cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangingResult {
    /// Device timestamp of the cycle, if the driver provides one.
    pub timestamp: u32,
    /// Rolling measurement counter incremented by the device.
    pub stream_count: u8,
    /// Number of targets the device reported, which may exceed `targets.len()`.
    pub objects_found: u8,
    /// Effective SPAD count in 8.8 fixed point.
    pub effective_spad_count: u16,
    pub xtalk_changed: bool,
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    pub targets: ArrayVec<TargetRange, MAX_TARGETS>,
}

impl RangingResult {
    /// Distance of the nearest target with a usable status.
    pub fn closest_valid_mm(&self) -> Option<i16> {
        self.targets
            .iter()
            .filter(|t| t.status.is_valid())
            .map(|t| t.range_mm)
            .min()
    }

    pub fn clear(&mut self) {
        *self = RangingResult::default();
    }
}
