// src/acquisition/mock.rs

//! Hand-written doubles for the acquisition tests.

use super::TofManager;
use crate::bus::{BusManager, Device};
use crate::common::{
    config::{EnableLine, ManagerConfig},
    error::{DriverError, EnableError, FaultKind},
    fault::FaultSink,
    hal_traits::{Clock, TofBus},
    types::{DistanceMode, Fix1616, RangeStatus, RangingResult, SensorId, TargetRange},
};
use crate::driver::{RangingDriver, EXPECTED_MODEL_ID, EXPECTED_MODULE_TYPE};
use crate::enable::EnableControl;
use crate::interrupt::InterruptTable;
use core::time::Duration;
use heapless::Vec;

// --- Mock Instant ---
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MockInstant(u64);

impl core::ops::Add<Duration> for MockInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        MockInstant(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

impl core::ops::Sub<MockInstant> for MockInstant {
    type Output = Duration;
    fn sub(self, rhs: MockInstant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

// --- Mock Clock: time only moves when somebody delays ---
#[derive(Debug, Default)]
pub struct MockClock {
    pub now_us: u64,
}

impl Clock for MockClock {
    type Instant = MockInstant;
    fn now(&self) -> MockInstant {
        MockInstant(self.now_us)
    }
    fn delay_us(&mut self, us: u32) {
        self.now_us += u64::from(us);
    }
}

// --- Mock Bus ---
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MockBusError;

/// Answers the identification registers and logs register-framed traffic.
#[derive(Debug)]
pub struct MockBus {
    pub init_calls: u32,
    pub fail_inits: u32,
    pub transfers: u32,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub model_id: u8,
    pub module_type: u8,
    /// (address, register, value) of every single-byte register write.
    pub writes: Vec<(u8, u16, u8), 16>,
    /// (address, register) of every register read.
    pub reads: Vec<(u8, u16), 16>,
}

impl Default for MockBus {
    fn default() -> Self {
        MockBus {
            init_calls: 0,
            fail_inits: 0,
            transfers: 0,
            fail_reads: false,
            fail_writes: false,
            model_id: EXPECTED_MODEL_ID,
            module_type: EXPECTED_MODULE_TYPE,
            writes: Vec::new(),
            reads: Vec::new(),
        }
    }
}

impl TofBus for MockBus {
    type Error = MockBusError;

    fn init(&mut self) -> Result<(), MockBusError> {
        self.init_calls += 1;
        if self.init_calls <= self.fail_inits {
            Err(MockBusError)
        } else {
            Ok(())
        }
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), MockBusError> {
        self.transfers += 1;
        if self.fail_writes {
            return Err(MockBusError);
        }
        if let [hi, lo, value] = *bytes {
            let _ = self.writes.push((address, u16::from_be_bytes([hi, lo]), value));
        }
        Ok(())
    }

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), MockBusError> {
        self.transfers += 1;
        if self.fail_reads {
            return Err(MockBusError);
        }
        let [hi, lo] = *bytes else {
            return Err(MockBusError);
        };
        let register = u16::from_be_bytes([hi, lo]);
        let _ = self.reads.push((address, register));
        buffer.fill(0);
        if let Some(first) = buffer.first_mut() {
            match register {
                0x010F => *first = self.model_id,
                0x0110 => *first = self.module_type,
                _ => {}
            }
        }
        Ok(())
    }
}

// --- Mock Enable Lines ---
#[derive(Debug, Default)]
pub struct MockEnable {
    pub fail: bool,
    /// (active, line) in call order.
    pub events: Vec<(bool, EnableLine), 16>,
}

impl MockEnable {
    fn drive<E: core::fmt::Debug>(&mut self, line: EnableLine, active: bool) -> Result<(), EnableError<E>> {
        if self.fail {
            return Err(EnableError::Pin(embedded_hal::digital::ErrorKind::Other));
        }
        let _ = self.events.push((active, line));
        Ok(())
    }
}

impl<B: TofBus> EnableControl<B> for MockEnable {
    fn enable(&mut self, _bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>> {
        self.drive(line, true)
    }

    fn disable(&mut self, _bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>> {
        self.drive(line, false)
    }
}

// --- Mock Driver ---
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    WaitBooted,
    DataInit,
    Calibrate,
    DistanceMode,
    Start,
    Restart,
    Fetch,
}

/// Records calls, fails on demand and can play the interrupt handler when the
/// next cycle is armed.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub calls: Vec<Step, 32>,
    pub fail_at: Option<Step>,
    pub raise: Option<fn()>,
    pub fetches: u8,
    pub distance_mode: Option<DistanceMode>,
}

impl MockDriver {
    pub const RANGE_MM: i16 = 450;

    fn step<E: core::fmt::Debug>(&mut self, step: Step) -> Result<(), DriverError<E>> {
        let _ = self.calls.push(step);
        match self.fail_at {
            Some(Step::WaitBooted) if step == Step::WaitBooted => Err(DriverError::Timeout),
            Some(failing) if failing == step => Err(DriverError::Status(-1)),
            _ => Ok(()),
        }
    }
}

impl<B: TofBus> RangingDriver<B> for MockDriver {
    fn wait_booted(&mut self, _dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        self.step(Step::WaitBooted)
    }

    fn data_init(&mut self, _dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        self.step(Step::DataInit)
    }

    fn perform_crosstalk_calibration(&mut self, _dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        self.step(Step::Calibrate)
    }

    fn set_distance_mode(&mut self, _dev: &mut Device<'_, B>, mode: DistanceMode) -> Result<(), DriverError<B::Error>> {
        self.step(Step::DistanceMode)?;
        self.distance_mode = Some(mode);
        Ok(())
    }

    fn start_measurement(&mut self, _dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        self.step(Step::Start)
    }

    fn clear_interrupt_and_start_next(&mut self, _dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        self.step(Step::Restart)?;
        if let Some(raise) = self.raise {
            raise();
        }
        Ok(())
    }

    fn get_measurement_data_ready(&mut self, _dev: &mut Device<'_, B>) -> Result<bool, DriverError<B::Error>> {
        Ok(true)
    }

    fn get_multi_ranging_data(
        &mut self,
        _dev: &mut Device<'_, B>,
        out: &mut RangingResult,
    ) -> Result<(), DriverError<B::Error>> {
        self.step(Step::Fetch)?;
        self.fetches += 1;
        out.stream_count = self.fetches;
        out.objects_found = 1;
        let _ = out.targets.try_push(TargetRange {
            range_mm: Self::RANGE_MM,
            range_min_mm: Self::RANGE_MM - 10,
            range_max_mm: Self::RANGE_MM + 10,
            sigma_mm: Fix1616(3 << 16),
            signal_rate_mcps: Fix1616(12 << 16),
            ambient_rate_mcps: Fix1616(1 << 16),
            status: RangeStatus::Valid,
        });
        Ok(())
    }
}

// --- Fault Recorder ---
#[derive(Debug, Default)]
pub struct FaultLog {
    entries: Vec<(SensorId, FaultKind), 16>,
}

impl FaultLog {
    pub fn entries(&self) -> &[(SensorId, FaultKind)] {
        &self.entries
    }

    pub fn kinds(&self) -> Vec<FaultKind, 16> {
        self.entries.iter().map(|(_, kind)| *kind).collect()
    }
}

impl FaultSink for FaultLog {
    fn report(&mut self, sensor: SensorId, fault: FaultKind) {
        let _ = self.entries.push((sensor, fault));
    }
}

// --- Manager under test ---
pub type TestManager<const N: usize> =
    TofManager<'static, MockBus, MockEnable, MockDriver, MockClock, FaultLog, N>;

pub fn manager<const N: usize>(table: &'static InterruptTable<N>, config: ManagerConfig<N>) -> TestManager<N> {
    TofManager::new(
        MockBus::default(),
        MockEnable::default(),
        core::array::from_fn(|_| MockDriver::default()),
        MockClock::default(),
        FaultLog::default(),
        table,
        config,
    )
    .unwrap()
}

impl<C: Clock, const N: usize> TofManager<'_, MockBus, MockEnable, MockDriver, C, FaultLog, N> {
    pub fn bus_mut(&mut self) -> &mut BusManager<MockBus> {
        &mut self.bus
    }

    pub fn enable(&self) -> &MockEnable {
        &self.enable
    }

    pub fn enable_mut(&mut self) -> &mut MockEnable {
        &mut self.enable
    }

    pub fn driver_mut(&mut self, id: SensorId) -> &mut MockDriver {
        &mut self.sensors[id.index()].driver
    }
}
