// src/common/config.rs

use super::timing;
use super::types::DistanceMode;
use core::time::Duration;

/// Factory-default 7-bit bus address of the ranging sensor.
pub const DEFAULT_SENSOR_ADDRESS: u8 = 0x29;

/// Number of distinct interrupt lines (EXTI channels) a table can correlate.
pub const MAX_INTERRUPT_LINES: usize = 16;

/// How a sensor's enable (XSHUT) line is wired.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnableLine {
    /// Directly on a controller pin; the value indexes the pin table of
    /// [`GpioEnable`](crate::enable::GpioEnable).
    Gpio(u8),
    /// Behind a bus-attached I/O expander.
    Expander { address: u8, pin: u8 },
}

/// External interrupt line a sensor's data-ready output is routed to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptLine(pub u8);

impl InterruptLine {
    /// Line matching a single-bit HAL pin mask (`1 << n`).
    pub const fn from_pin_mask(mask: u16) -> Option<Self> {
        if mask.count_ones() == 1 {
            Some(InterruptLine(mask.trailing_zeros() as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// What to do when the identification registers do not read back as expected.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdentificationPolicy {
    /// Report the fault and continue the init sequence.
    #[default]
    Permissive,
    /// Report the fault and abort init with the sensor in `Error`.
    Strict,
}

/// Static per-sensor wiring and settings.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// 7-bit bus address the sensor is operated at.
    pub address: u8,
    pub enable_line: EnableLine,
    pub interrupt_line: InterruptLine,
    /// Priority the platform layer registers for `interrupt_line`. Kept here so
    /// the whole wiring lives in one table; the crate does not program it.
    pub interrupt_priority: u8,
    pub distance_mode: DistanceMode,
}

impl SensorConfig {
    pub const fn new(enable_line: EnableLine, interrupt_line: InterruptLine) -> Self {
        SensorConfig {
            address: DEFAULT_SENSOR_ADDRESS,
            enable_line,
            interrupt_line,
            interrupt_priority: 0,
            distance_mode: DistanceMode::Short,
        }
    }

    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.interrupt_priority = priority;
        self
    }

    pub const fn with_distance_mode(mut self, mode: DistanceMode) -> Self {
        self.distance_mode = mode;
        self
    }
}

/// Configuration of the whole acquisition manager.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ManagerConfig<const N: usize> {
    pub sensors: [SensorConfig; N],
    pub identification: IdentificationPolicy,
    /// Upper bound on the wait for a measurement interrupt.
    pub interrupt_timeout: Duration,
}

impl<const N: usize> ManagerConfig<N> {
    pub const fn new(sensors: [SensorConfig; N]) -> Self {
        ManagerConfig {
            sensors,
            identification: IdentificationPolicy::Permissive,
            interrupt_timeout: timing::DEFAULT_INTERRUPT_TIMEOUT,
        }
    }

    pub const fn with_identification(mut self, policy: IdentificationPolicy) -> Self {
        self.identification = policy;
        self
    }

    pub const fn with_interrupt_timeout(mut self, timeout: Duration) -> Self {
        self.interrupt_timeout = timeout;
        self
    }
}
