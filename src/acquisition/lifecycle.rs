// src/acquisition/lifecycle.rs

use super::TofManager;
use crate::common::{
    config::{EnableLine, IdentificationPolicy, SensorConfig, DEFAULT_SENSOR_ADDRESS},
    error::{ConfigStep, DriverError, FaultKind, TofError},
    fault::FaultSink,
    hal_traits::{Clock, TofBus},
    timing,
    types::{SensorId, SensorState},
};
use crate::driver::{self, RangingDriver};
use crate::enable::EnableControl;

impl<B, EN, D, C, F, const N: usize> TofManager<'_, B, EN, D, C, F, N>
where
    B: TofBus,
    EN: EnableControl<B>,
    D: RangingDriver<B>,
    C: Clock,
    F: FaultSink,
{
    /// Runs the full bring-up of one sensor and leaves it ranging in `Idle`.
    ///
    /// Allowed from any state; this is also the only way out of `Error`. Any
    /// previously captured result is dropped. On failure the sensor is left in
    /// `Error`, the fault has been reported, and other sensors are unaffected.
    pub fn init(&mut self, id: SensorId) -> Result<(), TofError<B::Error>> {
        let index = self.slot_index(id)?;
        self.sensors[index].latest = None;
        self.transition(index, SensorState::InitInProgress);

        match self.run_init(id, index) {
            Ok(()) => {
                self.transition(index, SensorState::Idle);
                info!("{}: ranging at {:?}", id, self.config.sensors[index].address);
                Ok(())
            }
            Err(e) => {
                self.transition(index, SensorState::Error);
                Err(self.fault(id, e))
            }
        }
    }

    /// Brings up every configured sensor in index order.
    ///
    /// All sensors are first held in reset so that only the one being
    /// initialized answers at the factory address while it is moved to its
    /// configured one. A failing sensor does not stop the others; the outcome
    /// of each is returned at its index.
    pub fn init_all(&mut self) -> [Result<(), TofError<B::Error>>; N] {
        // Bus failures here are reported by the per-sensor init below.
        if self.bus.ensure_initialized().is_ok() {
            for index in 0..N {
                let line = self.config.sensors[index].enable_line;
                if self.enable.disable(&mut self.bus, line).is_err() {
                    warn!("tof{}: could not hold in reset", index);
                }
                self.interrupts.clear(SensorId::new(index as u8));
                self.sensors[index].latest = None;
                self.transition(index, SensorState::NotInit);
            }
        }
        core::array::from_fn(|index| self.init(SensorId::new(index as u8)))
    }

    /// Holds the sensor in reset and returns it to `NotInit`.
    pub fn shutdown(&mut self, id: SensorId) -> Result<(), TofError<B::Error>> {
        let index = self.slot_index(id)?;
        let line = self.config.sensors[index].enable_line;
        self.sensors[index].latest = None;

        let result = self
            .bus
            .ensure_initialized()
            .map_err(TofError::BusInitFailure)
            .and_then(|()| {
                self.enable
                    .disable(&mut self.bus, line)
                    .map_err(TofError::EnableLineFailure)
            });
        match result {
            Ok(()) => {
                self.interrupts.clear(id);
                self.transition(index, SensorState::NotInit);
                debug!("{}: shut down", id);
                Ok(())
            }
            Err(e) => {
                self.transition(index, SensorState::Error);
                Err(self.fault(id, e))
            }
        }
    }

    fn run_init(&mut self, id: SensorId, index: usize) -> Result<(), TofError<B::Error>> {
        let config = self.config.sensors[index];

        self.bus.ensure_initialized().map_err(TofError::BusInitFailure)?;
        self.pulse_enable(config.enable_line)?;
        if config.address != DEFAULT_SENSOR_ADDRESS {
            self.assign_address(id, &config)?;
        }
        self.identify(id, index, config.address)?;

        let slot = &mut self.sensors[index];
        let mut dev = self.bus.device(config.address);
        slot.driver.wait_booted(&mut dev).map_err(TofError::BootTimeout)?;
        slot.driver.data_init(&mut dev).map_err(|error| TofError::ConfigurationFailure {
            step: ConfigStep::DataInit,
            error,
        })?;
        slot.driver
            .perform_crosstalk_calibration(&mut dev)
            .map_err(TofError::CalibrationFailure)?;
        slot.driver
            .set_distance_mode(&mut dev, config.distance_mode)
            .map_err(|error| TofError::ConfigurationFailure {
                step: ConfigStep::DistanceMode,
                error,
            })?;
        slot.driver
            .start_measurement(&mut dev)
            .map_err(TofError::MeasurementStartFailure)?;
        Ok(())
    }

    /// Reset pulse on the enable line, leaving the sensor booting.
    fn pulse_enable(&mut self, line: EnableLine) -> Result<(), TofError<B::Error>> {
        self.enable
            .disable(&mut self.bus, line)
            .map_err(TofError::EnableLineFailure)?;
        self.clock.delay(timing::RESET_PULSE);
        self.enable
            .enable(&mut self.bus, line)
            .map_err(TofError::EnableLineFailure)?;
        self.clock.delay(timing::BOOT_SETTLE);
        Ok(())
    }

    /// Moves a freshly reset sensor from the factory address to its configured one.
    fn assign_address(&mut self, id: SensorId, config: &SensorConfig) -> Result<(), TofError<B::Error>> {
        debug!("{}: moving to address {:?}", id, config.address);
        match self
            .bus
            .write(DEFAULT_SENSOR_ADDRESS, driver::I2C_SLAVE_DEVICE_ADDRESS, config.address)
        {
            Ok(()) => Ok(()),
            Err(e) => {
                self.faults.report(id, FaultKind::Bus);
                Err(TofError::ConfigurationFailure {
                    step: ConfigStep::AddressAssignment,
                    error: DriverError::Bus(e),
                })
            }
        }
    }

    /// Checks the identification registers.
    ///
    /// A mismatch is always reported. Under the permissive policy init carries
    /// on regardless; under the strict one the first mismatch aborts it.
    fn identify(&mut self, id: SensorId, index: usize, address: u8) -> Result<(), TofError<B::Error>> {
        for (register, expected) in driver::IDENTIFICATION {
            let slot = &mut self.sensors[index];
            let mut dev = self.bus.device(address);
            let found = match slot.driver.read_register(&mut dev, register) {
                Ok(value) => Some(value),
                Err(_) => {
                    self.faults.report(id, FaultKind::Bus);
                    None
                }
            };
            if found == Some(expected) {
                continue;
            }
            let mismatch = TofError::IdentificationMismatch {
                register,
                expected,
                found,
            };
            match self.config.identification {
                IdentificationPolicy::Strict => return Err(mismatch),
                IdentificationPolicy::Permissive => {
                    let _ = self.fault(id, mismatch);
                }
            }
        }
        debug!("{}: identification done", id);
        Ok(())
    }
}
