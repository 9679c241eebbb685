// src/enable/mod.rs

//! Enable (XSHUT) line control, either on controller pins or behind an I/O expander.

mod expander;

pub use expander::{ExpanderEnable, MAX_EXPANDERS};

use crate::bus::BusManager;
use crate::common::{config::EnableLine, error::EnableError, hal_traits::TofBus};
use embedded_hal::digital::{Error as _, OutputPin};

/// Drives sensor enable lines. Active means "sensor running", inactive holds it in reset.
///
/// The bus is passed in so that controllers behind an expander can reach it;
/// the acquisition manager brings the bus up before the first call.
pub trait EnableControl<B: TofBus> {
    fn enable(&mut self, bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>>;

    fn disable(&mut self, bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>>;
}

/// Enable lines wired straight to controller pins, indexed by [`EnableLine::Gpio`].
pub struct GpioEnable<P, const N: usize> {
    pins: [P; N],
}

impl<P: OutputPin, const N: usize> GpioEnable<P, N> {
    pub fn new(pins: [P; N]) -> Self {
        GpioEnable { pins }
    }

    pub fn release(self) -> [P; N] {
        self.pins
    }

    fn set<E: core::fmt::Debug>(&mut self, line: EnableLine, active: bool) -> Result<(), EnableError<E>> {
        let EnableLine::Gpio(index) = line else {
            return Err(EnableError::UnsupportedLine);
        };
        let pin = self
            .pins
            .get_mut(usize::from(index))
            .ok_or(EnableError::UnsupportedLine)?;
        let result = if active { pin.set_high() } else { pin.set_low() };
        result.map_err(|e| EnableError::Pin(e.kind()))
    }
}

impl<B: TofBus, P: OutputPin, const N: usize> EnableControl<B> for GpioEnable<P, N> {
    fn enable(&mut self, _bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>> {
        self.set(line, true)
    }

    fn disable(&mut self, _bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>> {
        self.set(line, false)
    }
}

/// Boards mixing direct pins and expander lines: the first controller that
/// handles a line wins.
impl<B, A, X> EnableControl<B> for (A, X)
where
    B: TofBus,
    A: EnableControl<B>,
    X: EnableControl<B>,
{
    fn enable(&mut self, bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>> {
        match self.0.enable(bus, line) {
            Err(EnableError::UnsupportedLine) => self.1.enable(bus, line),
            other => other,
        }
    }

    fn disable(&mut self, bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>> {
        match self.0.disable(bus, line) {
            Err(EnableError::UnsupportedLine) => self.1.disable(bus, line),
            other => other,
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::I2cBus;
    use embedded_hal::digital::ErrorKind;
    use embedded_hal_mock::eh1::MockError;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    fn idle_bus() -> BusManager<I2cBus<I2cMock>> {
        BusManager::new(I2cBus::new(I2cMock::new(&[])))
    }

    #[test]
    fn test_gpio_enable_drives_indexed_pin() {
        let first = PinMock::new(&[PinTransaction::set(State::Low), PinTransaction::set(State::High)]);
        let second = PinMock::new(&[PinTransaction::set(State::High)]);
        let mut lines = GpioEnable::new([first, second]);
        let mut bus = idle_bus();

        lines.disable(&mut bus, EnableLine::Gpio(0)).unwrap();
        lines.enable(&mut bus, EnableLine::Gpio(0)).unwrap();
        lines.enable(&mut bus, EnableLine::Gpio(1)).unwrap();

        for mut pin in lines.release() {
            pin.done();
        }
        bus.release().release().done();
    }

    #[test]
    fn test_gpio_enable_rejects_foreign_lines() {
        let mut lines = GpioEnable::new([PinMock::new(&[])]);
        let mut bus = idle_bus();

        assert!(matches!(
            lines.enable(&mut bus, EnableLine::Gpio(3)),
            Err(EnableError::UnsupportedLine)
        ));
        assert!(matches!(
            lines.enable(&mut bus, EnableLine::Expander { address: 0x43, pin: 0 }),
            Err(EnableError::UnsupportedLine)
        ));

        for mut pin in lines.release() {
            pin.done();
        }
        bus.release().release().done();
    }

    #[test]
    fn test_gpio_pin_error_is_reported() {
        let pin = PinMock::new(&[PinTransaction::set(State::Low).with_error(MockError::Io(std::io::ErrorKind::Other))]);
        let mut lines = GpioEnable::new([pin]);
        let mut bus = idle_bus();

        assert!(matches!(
            lines.disable(&mut bus, EnableLine::Gpio(0)),
            Err(EnableError::Pin(ErrorKind::Other))
        ));

        for mut pin in lines.release() {
            pin.done();
        }
        bus.release().release().done();
    }

    #[test]
    fn test_mixed_board_falls_through_to_expander() {
        let direct = GpioEnable::new([PinMock::new(&[PinTransaction::set(State::High)])]);
        let expectations = [
            Transaction::write_read(0x43, std::vec![0x14], std::vec![0x00, 0x00]),
            Transaction::write_read(0x43, std::vec![0x12], std::vec![0x00, 0x00]),
            Transaction::write(0x43, std::vec![0x12, 0x00, 0x80]),
            Transaction::write(0x43, std::vec![0x14, 0x00, 0x80]),
        ];
        let mut bus = BusManager::new(I2cBus::new(I2cMock::new(&expectations)));
        let mut board = (direct, ExpanderEnable::new());

        board.enable(&mut bus, EnableLine::Gpio(0)).unwrap();
        board
            .enable(&mut bus, EnableLine::Expander { address: 0x43, pin: 15 })
            .unwrap();

        let (direct, _) = board;
        for mut pin in direct.release() {
            pin.done();
        }
        bus.release().release().done();
    }
}
