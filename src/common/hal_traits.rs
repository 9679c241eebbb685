// src/common/hal_traits.rs

use core::fmt::Debug;
use core::ops::{Add, Sub};
use core::time::Duration;

/// Point in time as produced by a [`Clock`].
///
/// Anything ordered that supports `instant + duration` and `instant - instant`
/// qualifies, including `std::time::Instant`.
pub trait TofInstant: Copy + Ord + Add<Duration, Output = Self> + Sub<Self, Output = Duration> {}

impl<T> TofInstant for T where T: Copy + Ord + Add<Duration, Output = T> + Sub<T, Output = Duration> {}

/// Time source and delay used for reset sequencing and the bounded interrupt wait.
pub trait Clock {
    type Instant: TofInstant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Delay for at least the specified number of microseconds.
    ///
    /// On a target this may put the core to sleep until the next interrupt,
    /// since the interrupt wait re-checks its counter after every delay.
    fn delay_us(&mut self, us: u32);

    /// Delay for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }

    /// Delay for at least `duration`, saturating at `u32::MAX` microseconds.
    fn delay(&mut self, duration: Duration) {
        let us = u32::try_from(duration.as_micros()).unwrap_or(u32::MAX);
        self.delay_us(us);
    }
}

/// The shared two-wire bus all sensors (and any I/O expander) hang off.
///
/// Addresses are 7-bit. Register framing is left to the caller; see
/// [`BusManager`](crate::bus::BusManager) and [`Device`](crate::bus::Device).
pub trait TofBus {
    /// Associated error type for bus transfers.
    type Error: Debug;

    /// One-time bring-up of the bus peripheral (timing, filters).
    ///
    /// Called through [`BusManager::ensure_initialized`](crate::bus::BusManager::ensure_initialized)
    /// only, which guarantees it runs once per successful bring-up.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Writes `bytes` to the device at `address`.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Writes `bytes` then reads `buffer.len()` bytes in a single transaction.
    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: TofBus + ?Sized> TofBus for &mut T {
    type Error = T::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        T::init(self)
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        T::write(self, address, bytes)
    }

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        T::write_read(self, address, bytes, buffer)
    }
}
