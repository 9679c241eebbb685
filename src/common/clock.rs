// src/common/clock.rs

use super::hal_traits::Clock;
use core::ops::{Add, Sub};
use core::time::Duration;
use embedded_hal::delay::DelayNs;

/// Microsecond timestamp produced by [`DelayClock`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Micros(pub u64);

impl Add<Duration> for Micros {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        let us = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Micros(self.0.saturating_add(us))
    }
}

impl Sub<Micros> for Micros {
    type Output = Duration;
    fn sub(self, rhs: Micros) -> Duration {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

/// [`Clock`] for targets without a free-running timer.
///
/// Time only advances through the delays issued by this crate, which is
/// exactly what the bounded interrupt wait needs: every poll delays, so the
/// elapsed time is the sum of those delays.
pub struct DelayClock<D> {
    delay: D,
    elapsed: Micros,
}

impl<D: DelayNs> DelayClock<D> {
    pub fn new(delay: D) -> Self {
        DelayClock {
            delay,
            elapsed: Micros(0),
        }
    }

    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> Clock for DelayClock<D> {
    type Instant = Micros;

    fn now(&self) -> Micros {
        self.elapsed
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
        self.elapsed = self.elapsed + Duration::from_micros(u64::from(us));
    }
}

/// [`Clock`] backed by `std::time::Instant` and `std::thread::sleep`.
#[cfg(any(feature = "std", test))]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

#[cfg(any(feature = "std", test))]
impl Clock for StdClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn test_delay_clock_advances_only_on_delay() {
        let mut clock = DelayClock::new(NoopDelay::new());
        assert_eq!(clock.now(), Micros(0));

        clock.delay_us(150);
        clock.delay_ms(2);
        assert_eq!(clock.now(), Micros(2_150));

        clock.delay(Duration::from_millis(1));
        assert_eq!(clock.now() - Micros(150), Duration::from_micros(3_000));
    }

    #[test]
    fn test_micros_arithmetic_saturates() {
        assert_eq!(Micros(u64::MAX - 1) + Duration::from_micros(5), Micros(u64::MAX));
        assert_eq!(Micros(10) - Micros(20), Duration::ZERO);
    }

    #[test]
    fn test_std_clock_sleeps() {
        let mut clock = StdClock;
        let start = clock.now();
        clock.delay_ms(2);
        assert!(clock.now() - start >= Duration::from_millis(2));
    }
}
