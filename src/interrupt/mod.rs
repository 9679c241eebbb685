// src/interrupt/mod.rs

//! Correlates hardware interrupt lines with the sensors that raised them.
//!
//! The table is the only state shared between the interrupt handler and the
//! foreground. It is built at compile time from the sensor configuration and
//! normally lives in a `static`:
//!
//! ```ignore
//! static SENSORS: [SensorConfig; 2] = [ /* ... */ ];
//! static TOF_IRQ: InterruptTable<2> = InterruptTable::for_sensors(&SENSORS);
//!
//! #[interrupt]
//! fn EXTI3() {
//!     TOF_IRQ.signal(InterruptLine(3));
//! }
//! ```

use crate::common::config::{InterruptLine, SensorConfig, MAX_INTERRUPT_LINES};
use crate::common::types::SensorId;
use core::convert::Infallible;
use portable_atomic::{AtomicU16, Ordering};

/// Largest number of sensors one table can serve (one bit per sensor in a line mask).
pub const MAX_SENSORS: usize = 32;

/// Per-sensor pending-interrupt counters plus the line-to-sensor mapping.
///
/// `signal` / `signal_pin_mask` are safe to call from interrupt context: they
/// only perform atomic read-modify-writes on the counters. Everything else is
/// meant for the foreground.
#[derive(Debug)]
pub struct InterruptTable<const N: usize> {
    line_masks: [u32; MAX_INTERRUPT_LINES],
    lines: [InterruptLine; N],
    pending: [AtomicU16; N],
}

impl<const N: usize> InterruptTable<N> {
    /// Builds the table from the sensor wiring.
    ///
    /// # Panics
    ///
    /// If `N` exceeds [`MAX_SENSORS`] or a sensor names a line outside
    /// `0..MAX_INTERRUPT_LINES`. In a `static` initializer this is a compile error.
    pub const fn for_sensors(sensors: &[SensorConfig; N]) -> Self {
        assert!(N <= MAX_SENSORS, "too many sensors for one interrupt table");

        const IDLE: AtomicU16 = AtomicU16::new(0);
        let mut line_masks = [0u32; MAX_INTERRUPT_LINES];
        let mut lines = [InterruptLine(0); N];

        let mut i = 0;
        while i < N {
            let line = sensors[i].interrupt_line;
            assert!(line.index() < MAX_INTERRUPT_LINES, "interrupt line out of range");
            line_masks[line.index()] |= 1 << i;
            lines[i] = line;
            i += 1;
        }

        InterruptTable {
            line_masks,
            lines,
            pending: [IDLE; N],
        }
    }

    // --- Interrupt context ---

    /// Records one falling edge on `line` for every sensor wired to it.
    ///
    /// Lines that serve no sensor are ignored. Counters saturate at `u16::MAX`.
    pub fn signal(&self, line: InterruptLine) {
        let Some(&mask) = self.line_masks.get(line.index()) else {
            return;
        };
        let mut remaining = mask;
        while remaining != 0 {
            let index = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            if let Some(counter) = self.pending.get(index) {
                // Err means already saturated.
                let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                    count.checked_add(1)
                });
            }
        }
    }

    /// Same as [`signal`](Self::signal) for every line set in a HAL-style pin
    /// mask (bit `n` for line `n`), as handed to an EXTI callback.
    pub fn signal_pin_mask(&self, mask: u16) {
        let mut remaining = mask;
        while remaining != 0 {
            let line = remaining.trailing_zeros() as u8;
            remaining &= remaining - 1;
            self.signal(InterruptLine(line));
        }
    }

    // --- Foreground ---

    /// Edges recorded for `id` and not yet consumed. Unknown ids read as 0.
    pub fn pending(&self, id: SensorId) -> u16 {
        self.pending
            .get(id.index())
            .map_or(0, |counter| counter.load(Ordering::Acquire))
    }

    /// Drops any edge recorded for `id`.
    pub fn clear(&self, id: SensorId) {
        if let Some(counter) = self.pending.get(id.index()) {
            counter.store(0, Ordering::Release);
        }
    }

    /// Consumes every edge recorded for `id` in one atomic step and returns
    /// how many there were, or `WouldBlock` if none arrived yet.
    pub fn try_take(&self, id: SensorId) -> nb::Result<u16, Infallible> {
        let taken = self
            .pending
            .get(id.index())
            .map_or(0, |counter| counter.swap(0, Ordering::AcqRel));
        if taken == 0 {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(taken)
        }
    }

    /// Line the sensor was wired to when the table was built.
    pub fn line(&self, id: SensorId) -> Option<InterruptLine> {
        self.lines.get(id.index()).copied()
    }

    /// Sensors served by `line`, one bit per sensor index.
    pub fn sensors_on(&self, line: InterruptLine) -> u32 {
        self.line_masks.get(line.index()).copied().unwrap_or(0)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::EnableLine;

    const SENSORS: [SensorConfig; 3] = [
        SensorConfig::new(EnableLine::Gpio(0), InterruptLine(3)),
        SensorConfig::new(EnableLine::Gpio(1), InterruptLine(3)),
        SensorConfig::new(EnableLine::Gpio(2), InterruptLine(7)),
    ];

    static TABLE: InterruptTable<3> = InterruptTable::for_sensors(&SENSORS);

    fn take(table: &InterruptTable<3>, id: u8) -> nb::Result<u16, Infallible> {
        table.try_take(SensorId::new(id))
    }

    #[test]
    fn test_table_layout() {
        let table = InterruptTable::for_sensors(&SENSORS);
        assert_eq!(table.sensors_on(InterruptLine(3)), 0b011);
        assert_eq!(table.sensors_on(InterruptLine(7)), 0b100);
        assert_eq!(table.sensors_on(InterruptLine(0)), 0);
        assert_eq!(table.sensors_on(InterruptLine(40)), 0);
        assert_eq!(table.line(SensorId::new(2)), Some(InterruptLine(7)));
        assert_eq!(table.line(SensorId::new(3)), None);
    }

    #[test]
    fn test_shared_line_signals_every_sensor_on_it() {
        let table = InterruptTable::for_sensors(&SENSORS);
        table.signal(InterruptLine(3));

        assert_eq!(table.pending(SensorId::new(0)), 1);
        assert_eq!(table.pending(SensorId::new(1)), 1);
        assert_eq!(table.pending(SensorId::new(2)), 0);
        assert_eq!(take(&table, 2), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_try_take_consumes_all_edges() {
        let table = InterruptTable::for_sensors(&SENSORS);
        table.signal(InterruptLine(7));
        table.signal(InterruptLine(7));

        assert_eq!(take(&table, 2), Ok(2));
        assert_eq!(table.pending(SensorId::new(2)), 0);
        assert_eq!(take(&table, 2), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_clear_discards_stale_edges() {
        let table = InterruptTable::for_sensors(&SENSORS);
        table.signal(InterruptLine(3));
        table.clear(SensorId::new(0));

        assert_eq!(table.pending(SensorId::new(0)), 0);
        assert_eq!(table.pending(SensorId::new(1)), 1);
    }

    #[test]
    fn test_pin_mask_and_unknown_lines() {
        let table = InterruptTable::for_sensors(&SENSORS);
        table.signal_pin_mask((1 << 3) | (1 << 7) | (1 << 12));
        table.signal(InterruptLine(40));

        assert_eq!(table.pending(SensorId::new(0)), 1);
        assert_eq!(table.pending(SensorId::new(1)), 1);
        assert_eq!(table.pending(SensorId::new(2)), 1);
        assert_eq!(table.pending(SensorId::new(9)), 0);
        assert_eq!(take(&table, 9), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_counter_saturates() {
        let table = InterruptTable::for_sensors(&SENSORS);
        for _ in 0..u32::from(u16::MAX) + 10 {
            table.signal(InterruptLine(7));
        }
        assert_eq!(take(&table, 2), Ok(u16::MAX));
    }

    #[test]
    fn test_static_table_from_another_thread() {
        let handle = std::thread::spawn(|| {
            for _ in 0..100 {
                TABLE.signal(InterruptLine(7));
            }
        });
        handle.join().unwrap();
        assert_eq!(take(&TABLE, 2), Ok(100));
    }
}
