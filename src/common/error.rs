// src/common/error.rs

use super::types::{SensorId, SensorState};

/// Step of the initialization sequence that configures the device.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigStep {
    AddressAssignment,
    DataInit,
    DistanceMode,
}

/// Payload-free classification of a fault, as handed to a [`FaultSink`](crate::common::FaultSink).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    IdentificationMismatch,
    BootTimeout,
    CalibrationFailure,
    ConfigurationFailure,
    MeasurementStartFailure,
    MeasurementFetchFailure,
    IllegalStateTransition,
    InterruptTimeout,
    BusInitFailure,
    EnableLineFailure,
    Bus,
    Configuration,
}

/// Error returned by a sensor driver adapter call.
#[derive(Debug, thiserror::Error)]
pub enum DriverError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Underlying bus error.
    #[error("bus error: {0:?}")]
    Bus(E),

    /// The device did not reach the expected condition in time.
    #[error("device did not respond in time")]
    Timeout,

    /// The vendor driver returned a non-zero status code.
    #[error("device status {0}")]
    Status(i8),
}

impl<E: core::fmt::Debug> From<E> for DriverError<E> {
    fn from(e: E) -> Self {
        DriverError::Bus(e)
    }
}

/// Error raised while driving an enable (XSHUT) line.
#[derive(Debug, thiserror::Error)]
pub enum EnableError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Bus error while talking to an I/O expander.
    #[error("bus error: {0:?}")]
    Bus(E),

    /// The GPIO driving the line reported an error.
    #[error("pin error: {0:?}")]
    Pin(embedded_hal::digital::ErrorKind),

    /// The controller cannot drive this kind of line, or the line index is out of range.
    #[error("enable line not handled by this controller")]
    UnsupportedLine,

    /// Every expander slot is already tracking another device.
    #[error("too many expanders")]
    TooManyExpanders,
}

impl<E: core::fmt::Debug> From<E> for EnableError<E> {
    fn from(e: E) -> Self {
        EnableError::Bus(e)
    }
}

/// Error returned by the acquisition manager.
#[derive(Debug, thiserror::Error)]
pub enum TofError<E = ()>
where
    E: core::fmt::Debug,
{
    /// An identification register did not hold the expected value (`found` is
    /// `None` when the register could not be read at all).
    #[error("identification register {register:#06x}: expected {expected:#04x}, found {found:?}")]
    IdentificationMismatch {
        register: u16,
        expected: u8,
        found: Option<u8>,
    },

    #[error("device boot failed: {0:?}")]
    BootTimeout(DriverError<E>),

    #[error("cross-talk calibration failed: {0:?}")]
    CalibrationFailure(DriverError<E>),

    #[error("configuration failed at {step:?}: {error:?}")]
    ConfigurationFailure {
        step: ConfigStep,
        error: DriverError<E>,
    },

    #[error("measurement start failed: {0:?}")]
    MeasurementStartFailure(DriverError<E>),

    #[error("measurement fetch failed: {0:?}")]
    MeasurementFetchFailure(DriverError<E>),

    /// Operation called in a state that does not allow it.
    #[error("operation not allowed in state {state:?}")]
    IllegalStateTransition { state: SensorState },

    /// No interrupt arrived within the configured timeout.
    #[error("timed out waiting for the measurement interrupt")]
    InterruptTimeout,

    #[error("bus bring-up failed: {0:?}")]
    BusInitFailure(E),

    #[error("enable line failed: {0:?}")]
    EnableLineFailure(EnableError<E>),

    /// The id does not name a configured sensor.
    #[error("unknown sensor {0:?}")]
    UnknownSensor(SensorId),

    /// The interrupt table was built from a different sensor configuration.
    #[error("interrupt table does not match the configuration of {0:?}")]
    InterruptLineMismatch(SensorId),

    /// Two sensors are configured to answer at the same bus address; the id
    /// is the later of the two.
    #[error("{0:?} shares its bus address with another sensor")]
    AddressConflict(SensorId),
}

impl<E: core::fmt::Debug> TofError<E> {
    /// Classification used when reporting this error to a fault sink.
    pub fn kind(&self) -> FaultKind {
        match self {
            TofError::IdentificationMismatch { .. } => FaultKind::IdentificationMismatch,
            TofError::BootTimeout(_) => FaultKind::BootTimeout,
            TofError::CalibrationFailure(_) => FaultKind::CalibrationFailure,
            TofError::ConfigurationFailure { .. } => FaultKind::ConfigurationFailure,
            TofError::MeasurementStartFailure(_) => FaultKind::MeasurementStartFailure,
            TofError::MeasurementFetchFailure(_) => FaultKind::MeasurementFetchFailure,
            TofError::IllegalStateTransition { .. } => FaultKind::IllegalStateTransition,
            TofError::InterruptTimeout => FaultKind::InterruptTimeout,
            TofError::BusInitFailure(_) => FaultKind::BusInitFailure,
            TofError::EnableLineFailure(_) => FaultKind::EnableLineFailure,
            TofError::UnknownSensor(_)
            | TofError::InterruptLineMismatch(_)
            | TofError::AddressConflict(_) => FaultKind::Configuration,
        }
    }
}
