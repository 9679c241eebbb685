// src/driver/mod.rs

//! Capability interface to the vendor ranging driver.
//!
//! The acquisition state machine never touches sensor registers itself beyond
//! identification and address assignment; everything else goes through a
//! [`RangingDriver`] implementation wrapping the vendor API.

use crate::bus::Device;
use crate::common::{error::DriverError, hal_traits::TofBus, types::DistanceMode, types::RangingResult};

/// Register holding the 7-bit bus address the device answers to.
pub const I2C_SLAVE_DEVICE_ADDRESS: u16 = 0x0001;

/// Identification registers and the values a VL53L3CX reads back.
pub const IDENTIFICATION_MODEL_ID: u16 = 0x010F;
pub const IDENTIFICATION_MODULE_TYPE: u16 = 0x0110;
pub const EXPECTED_MODEL_ID: u8 = 0xEA;
pub const EXPECTED_MODULE_TYPE: u8 = 0xAA;

/// The two identification reads, in the order they are checked.
pub const IDENTIFICATION: [(u16, u8); 2] = [
    (IDENTIFICATION_MODEL_ID, EXPECTED_MODEL_ID),
    (IDENTIFICATION_MODULE_TYPE, EXPECTED_MODULE_TYPE),
];

/// Operations the acquisition state machine needs from a sensor driver.
///
/// One instance per physical sensor. Every call gets the device view at the
/// sensor's current address; implementations keep whatever calibration or
/// tuning state they need between calls. A call either fully succeeds or
/// returns an error; there is no partial success.
pub trait RangingDriver<B: TofBus> {
    /// Reads a single register byte.
    fn read_register(&mut self, dev: &mut Device<'_, B>, index: u16) -> Result<u8, DriverError<B::Error>> {
        Ok(dev.read_byte(index)?)
    }

    /// Blocks until the device firmware reports boot completion.
    fn wait_booted(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>>;

    /// One-time device initialization after boot.
    fn data_init(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>>;

    /// Cross-talk calibration against the cover glass.
    fn perform_crosstalk_calibration(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>>;

    fn set_distance_mode(&mut self, dev: &mut Device<'_, B>, mode: DistanceMode) -> Result<(), DriverError<B::Error>>;

    /// Starts continuous ranging; each completed cycle pulls the interrupt line.
    fn start_measurement(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>>;

    /// Acknowledges the last interrupt and arms the next cycle.
    fn clear_interrupt_and_start_next(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>>;

    /// Polling alternative to the interrupt line.
    fn get_measurement_data_ready(&mut self, dev: &mut Device<'_, B>) -> Result<bool, DriverError<B::Error>>;

    /// Reads the result of the last completed cycle into `out`.
    fn get_multi_ranging_data(
        &mut self,
        dev: &mut Device<'_, B>,
        out: &mut RangingResult,
    ) -> Result<(), DriverError<B::Error>>;
}

impl<B: TofBus, T: RangingDriver<B> + ?Sized> RangingDriver<B> for &mut T {
    fn read_register(&mut self, dev: &mut Device<'_, B>, index: u16) -> Result<u8, DriverError<B::Error>> {
        T::read_register(self, dev, index)
    }

    fn wait_booted(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        T::wait_booted(self, dev)
    }

    fn data_init(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        T::data_init(self, dev)
    }

    fn perform_crosstalk_calibration(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        T::perform_crosstalk_calibration(self, dev)
    }

    fn set_distance_mode(&mut self, dev: &mut Device<'_, B>, mode: DistanceMode) -> Result<(), DriverError<B::Error>> {
        T::set_distance_mode(self, dev, mode)
    }

    fn start_measurement(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        T::start_measurement(self, dev)
    }

    fn clear_interrupt_and_start_next(&mut self, dev: &mut Device<'_, B>) -> Result<(), DriverError<B::Error>> {
        T::clear_interrupt_and_start_next(self, dev)
    }

    fn get_measurement_data_ready(&mut self, dev: &mut Device<'_, B>) -> Result<bool, DriverError<B::Error>> {
        T::get_measurement_data_ready(self, dev)
    }

    fn get_multi_ranging_data(
        &mut self,
        dev: &mut Device<'_, B>,
        out: &mut RangingResult,
    ) -> Result<(), DriverError<B::Error>> {
        T::get_multi_ranging_data(self, dev, out)
    }
}
