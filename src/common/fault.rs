// src/common/fault.rs

use super::error::FaultKind;
use super::types::SensorId;
use embedded_hal::digital::OutputPin;

/// Destination for faults at the moment they occur.
///
/// Reporting is in addition to the error returned to the caller, so sinks are
/// free to be lossy (an LED, a log line).
pub trait FaultSink {
    fn report(&mut self, sensor: SensorId, fault: FaultKind);
}

/// Discards every fault.
impl FaultSink for () {
    fn report(&mut self, _sensor: SensorId, _fault: FaultKind) {}
}

impl<T: FaultSink + ?Sized> FaultSink for &mut T {
    fn report(&mut self, sensor: SensorId, fault: FaultKind) {
        T::report(self, sensor, fault);
    }
}

/// Writes every fault to the logging backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFaults;

impl FaultSink for LogFaults {
    fn report(&mut self, sensor: SensorId, fault: FaultKind) {
        error!("{:?}: fault {:?}", sensor, fault);
    }
}

/// Latches an indicator pin active on the first fault and keeps it there.
pub struct FaultLed<P> {
    pin: P,
    active_high: bool,
    latched: bool,
}

impl<P: OutputPin> FaultLed<P> {
    pub fn new(pin: P) -> Self {
        FaultLed {
            pin,
            active_high: true,
            latched: false,
        }
    }

    /// Indicator that lights when its pin is driven low.
    pub fn active_low(pin: P) -> Self {
        FaultLed {
            pin,
            active_high: false,
            latched: false,
        }
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> FaultSink for FaultLed<P> {
    fn report(&mut self, sensor: SensorId, fault: FaultKind) {
        warn!("{:?}: fault {:?}", sensor, fault);
        if self.latched {
            return;
        }
        let result = if self.active_high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        // Retry on the next fault if the pin could not be driven.
        if result.is_ok() {
            self.latched = true;
        }
    }
}
