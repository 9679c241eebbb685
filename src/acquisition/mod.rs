// src/acquisition/mod.rs

//! The per-sensor acquisition state machine.
//!
//! [`TofManager`] owns the shared bus, the enable-line controller, one driver
//! per sensor and the fault sink. Its only link to interrupt context is a
//! shared reference to the [`InterruptTable`].

use crate::bus::BusManager;
use crate::common::{
    config::ManagerConfig,
    error::TofError,
    fault::FaultSink,
    hal_traits::{Clock, TofBus},
    types::{RangingResult, SensorId, SensorState},
};
use crate::driver::RangingDriver;
use crate::enable::EnableControl;
use crate::interrupt::InterruptTable;

mod lifecycle;
mod measure;

#[cfg(test)]
mod mock;

/// Per-sensor record in the manager's arena.
#[derive(Debug)]
struct SensorSlot<D> {
    state: SensorState,
    driver: D,
    latest: Option<RangingResult>,
}

impl<D> SensorSlot<D> {
    fn new(driver: D) -> Self {
        SensorSlot {
            state: SensorState::NotInit,
            driver,
            latest: None,
        }
    }
}

/// Drives `N` ranging sensors sharing one bus.
///
/// All operations run in the foreground through `&mut self`; the interrupt
/// handler only ever sees the `&'t InterruptTable<N>`.
pub struct TofManager<'t, B, EN, D, C, F, const N: usize>
where
    B: TofBus,
{
    bus: BusManager<B>,
    enable: EN,
    clock: C,
    faults: F,
    interrupts: &'t InterruptTable<N>,
    config: ManagerConfig<N>,
    sensors: [SensorSlot<D>; N],
}

impl<'t, B, EN, D, C, F, const N: usize> TofManager<'t, B, EN, D, C, F, N>
where
    B: TofBus,
    EN: EnableControl<B>,
    D: RangingDriver<B>,
    C: Clock,
    F: FaultSink,
{
    /// Creates the manager with every sensor in `NotInit`. Nothing touches the
    /// hardware until the first `init`.
    ///
    /// Fails with `InterruptLineMismatch` if `interrupts` was built from a
    /// wiring that disagrees with `config`, and with `AddressConflict` if two
    /// sensors are configured for the same bus address (including two left at
    /// the factory default).
    pub fn new(
        bus: B,
        enable: EN,
        drivers: [D; N],
        clock: C,
        faults: F,
        interrupts: &'t InterruptTable<N>,
        config: ManagerConfig<N>,
    ) -> Result<Self, TofError<B::Error>> {
        for (index, sensor) in config.sensors.iter().enumerate() {
            let id = SensorId::new(index as u8);
            if interrupts.line(id) != Some(sensor.interrupt_line) {
                error!("{}: interrupt table disagrees with configuration", id);
                return Err(TofError::InterruptLineMismatch(id));
            }
            if config.sensors[..index]
                .iter()
                .any(|earlier| earlier.address == sensor.address)
            {
                error!("{}: address {:?} already taken", id, sensor.address);
                return Err(TofError::AddressConflict(id));
            }
        }
        Ok(TofManager {
            bus: BusManager::new(bus),
            enable,
            clock,
            faults,
            interrupts,
            config,
            sensors: drivers.map(SensorSlot::new),
        })
    }

    /// Current lifecycle state, `None` for an id outside the configuration.
    pub fn state(&self, id: SensorId) -> Option<SensorState> {
        self.sensors.get(id.index()).map(|slot| slot.state)
    }

    /// Result of the last successful measurement.
    ///
    /// Only available while the sensor is `Idle`; during a measurement, after
    /// a fault, or before the first successful cycle this is `None`.
    pub fn latest_result(&self, id: SensorId) -> Option<&RangingResult> {
        let slot = self.sensors.get(id.index())?;
        match slot.state {
            SensorState::Idle => slot.latest.as_ref(),
            _ => None,
        }
    }

    pub fn config(&self) -> &ManagerConfig<N> {
        &self.config
    }

    pub fn bus(&self) -> &BusManager<B> {
        &self.bus
    }

    pub fn interrupts(&self) -> &'t InterruptTable<N> {
        self.interrupts
    }

    pub fn driver(&self, id: SensorId) -> Option<&D> {
        self.sensors.get(id.index()).map(|slot| &slot.driver)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn faults(&self) -> &F {
        &self.faults
    }

    pub fn faults_mut(&mut self) -> &mut F {
        &mut self.faults
    }

    // --- Internal helpers shared by lifecycle and measure ---

    /// Index of a configured sensor; reports and rejects anything else.
    fn slot_index(&mut self, id: SensorId) -> Result<usize, TofError<B::Error>> {
        if id.index() < N {
            Ok(id.index())
        } else {
            Err(self.fault(id, TofError::UnknownSensor(id)))
        }
    }

    fn transition(&mut self, index: usize, to: SensorState) {
        let slot = &mut self.sensors[index];
        trace!("tof{}: {:?} -> {:?}", index, slot.state, to);
        slot.state = to;
    }

    /// Hands a fault to the sink and gives the error back for returning.
    fn fault(&mut self, id: SensorId, error: TofError<B::Error>) -> TofError<B::Error> {
        let kind = error.kind();
        warn!("{}: {:?}", id, kind);
        self.faults.report(id, kind);
        error
    }
}
