// src/enable/expander.rs

use super::EnableControl;
use crate::bus::BusManager;
use crate::common::{config::EnableLine, error::EnableError, hal_traits::TofBus};
use arrayvec::ArrayVec;

/// Number of distinct expanders one controller keeps state for.
pub const MAX_EXPANDERS: usize = 4;

// STMPE1600 registers; 16-bit values are sent low byte first.
const GPSR: u8 = 0x12; // GPIO set state
const GPDR: u8 = 0x14; // GPIO direction (1 = output)

const PINS_PER_EXPANDER: u8 = 16;

#[derive(Debug, Copy, Clone)]
struct Shadow {
    address: u8,
    direction: u16,
    output: u16,
}

/// Enable lines routed through STMPE1600 I/O expanders on the shared bus, as
/// found on carrier boards without direct XSHUT wiring.
///
/// Expander pins are configured lazily: the first time a pin is driven, its
/// output latch is written and then it is switched to output. The current
/// direction and output registers are read once per expander, so pins used
/// by other peripherals on the same expander are left as they were. The bus
/// must be up by then, which the acquisition manager guarantees.
#[derive(Debug, Default)]
pub struct ExpanderEnable {
    expanders: ArrayVec<Shadow, MAX_EXPANDERS>,
}

impl ExpanderEnable {
    pub fn new() -> Self {
        ExpanderEnable {
            expanders: ArrayVec::new(),
        }
    }

    /// Shadow for `address`, seeded from the device the first time it is seen
    /// so that pins driven by other board code keep their direction and level.
    fn shadow_index<B: TofBus>(
        &mut self,
        bus: &mut BusManager<B>,
        address: u8,
    ) -> Result<usize, EnableError<B::Error>> {
        if let Some(index) = self.expanders.iter().position(|s| s.address == address) {
            return Ok(index);
        }
        if self.expanders.is_full() {
            return Err(EnableError::TooManyExpanders);
        }
        let mut direction = [0u8; 2];
        bus.write_read_raw(address, &[GPDR], &mut direction)?;
        let mut output = [0u8; 2];
        bus.write_read_raw(address, &[GPSR], &mut output)?;
        debug!("expander {:?}: adopted direction {:?}", address, direction);
        self.expanders
            .try_push(Shadow {
                address,
                direction: u16::from_le_bytes(direction),
                output: u16::from_le_bytes(output),
            })
            .map_err(|_| EnableError::TooManyExpanders)?;
        Ok(self.expanders.len() - 1)
    }

    fn set<B: TofBus>(
        &mut self,
        bus: &mut BusManager<B>,
        line: EnableLine,
        active: bool,
    ) -> Result<(), EnableError<B::Error>> {
        let EnableLine::Expander { address, pin } = line else {
            return Err(EnableError::UnsupportedLine);
        };
        if pin >= PINS_PER_EXPANDER {
            return Err(EnableError::UnsupportedLine);
        }
        let index = self.shadow_index(bus, address)?;
        let shadow = &mut self.expanders[index];
        let bit = 1u16 << pin;

        let output = if active {
            shadow.output | bit
        } else {
            shadow.output & !bit
        };
        let [lo, hi] = output.to_le_bytes();
        bus.write_raw(address, &[GPSR, lo, hi])?;
        shadow.output = output;

        if shadow.direction & bit == 0 {
            let direction = shadow.direction | bit;
            trace!("expander {:?}: pin {:?} switched to output", address, pin);
            let [lo, hi] = direction.to_le_bytes();
            bus.write_raw(address, &[GPDR, lo, hi])?;
            shadow.direction = direction;
        }
        Ok(())
    }
}

impl<B: TofBus> EnableControl<B> for ExpanderEnable {
    fn enable(&mut self, bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>> {
        self.set(bus, line, true)
    }

    fn disable(&mut self, bus: &mut BusManager<B>, line: EnableLine) -> Result<(), EnableError<B::Error>> {
        self.set(bus, line, false)
    }
}
