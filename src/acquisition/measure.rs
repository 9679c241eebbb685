// src/acquisition/measure.rs

use super::TofManager;
use crate::common::{
    error::TofError,
    fault::FaultSink,
    hal_traits::{Clock, TofBus},
    timing,
    types::{SensorId, SensorState},
};
use crate::driver::RangingDriver;
use crate::enable::EnableControl;

impl<B, EN, D, C, F, const N: usize> TofManager<'_, B, EN, D, C, F, N>
where
    B: TofBus,
    EN: EnableControl<B>,
    D: RangingDriver<B>,
    C: Clock,
    F: FaultSink,
{
    /// Runs one interrupt-driven measurement cycle.
    ///
    /// The sensor must be `Idle`. Otherwise the call fails with
    /// `IllegalStateTransition` and changes nothing: no bus traffic, no driver
    /// call, pending interrupts untouched. On success the sensor is back in
    /// `Idle` and [`latest_result`](Self::latest_result) holds the new data.
    pub fn measure(&mut self, id: SensorId) -> Result<(), TofError<B::Error>> {
        let index = self.slot_index(id)?;
        let state = self.sensors[index].state;
        if state != SensorState::Idle {
            return Err(self.fault(id, TofError::IllegalStateTransition { state }));
        }

        // Edges left over from earlier cycles must not satisfy this wait.
        self.interrupts.clear(id);
        self.transition(index, SensorState::Measuring);

        match self.run_measurement(id, index) {
            Ok(()) => {
                self.transition(index, SensorState::Idle);
                Ok(())
            }
            Err(e) => {
                self.transition(index, SensorState::Error);
                Err(self.fault(id, e))
            }
        }
    }

    fn run_measurement(&mut self, id: SensorId, index: usize) -> Result<(), TofError<B::Error>> {
        let address = self.config.sensors[index].address;
        {
            let slot = &mut self.sensors[index];
            let mut dev = self.bus.device(address);
            slot.driver
                .clear_interrupt_and_start_next(&mut dev)
                .map_err(TofError::MeasurementStartFailure)?;
        }

        let edges = self.wait_for_interrupt(id)?;
        if edges > 1 {
            trace!("{}: {:?} edges coalesced", id, edges);
        }

        let slot = &mut self.sensors[index];
        let mut result = slot.latest.take().unwrap_or_default();
        result.clear();
        let mut dev = self.bus.device(address);
        slot.driver
            .get_multi_ranging_data(&mut dev, &mut result)
            .map_err(TofError::MeasurementFetchFailure)?;
        slot.latest = Some(result);
        Ok(())
    }

    /// Blocks until the sensor's interrupt has fired at least once since the
    /// last clear, consuming every recorded edge. Bounded by the configured
    /// interrupt timeout; the pending counter is polled with a short delay in
    /// between.
    fn wait_for_interrupt(&mut self, id: SensorId) -> Result<u16, TofError<B::Error>> {
        let deadline = self.clock.now() + self.config.interrupt_timeout;

        loop {
            match self.interrupts.try_take(id) {
                Ok(edges) => return Ok(edges),
                Err(nb::Error::WouldBlock) => {
                    if self.clock.now() >= deadline {
                        return Err(TofError::InterruptTimeout);
                    }
                    self.clock.delay(timing::INTERRUPT_POLL_INTERVAL);
                }
                Err(nb::Error::Other(never)) => match never {},
            }
        }
    }
}
