// src/bus/mod.rs

//! The shared bus: one handle, brought up once, used by every sensor.

use crate::common::hal_traits::TofBus;
use embedded_hal::i2c::I2c;

/// Owns the bus shared by all sensors and guarantees a single bring-up.
#[derive(Debug)]
pub struct BusManager<B> {
    bus: B,
    initialized: bool,
}

impl<B: TofBus> BusManager<B> {
    pub const fn new(bus: B) -> Self {
        BusManager {
            bus,
            initialized: false,
        }
    }

    /// Brings the bus up if that has not happened yet.
    ///
    /// Idempotent: once a bring-up succeeded, later calls return immediately
    /// without touching the bus. A failed bring-up is attempted again on the
    /// next call.
    pub fn ensure_initialized(&mut self) -> Result<(), B::Error> {
        if self.initialized {
            return Ok(());
        }
        debug!("bringing up shared bus");
        self.bus.init()?;
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reads one byte from a 16-bit register index.
    pub fn read(&mut self, address: u8, register: u16) -> Result<u8, B::Error> {
        self.device(address).read_byte(register)
    }

    /// Writes one byte to a 16-bit register index.
    pub fn write(&mut self, address: u8, register: u16, value: u8) -> Result<(), B::Error> {
        self.device(address).write_byte(register, value)
    }

    /// Raw write without register framing.
    pub fn write_raw(&mut self, address: u8, bytes: &[u8]) -> Result<(), B::Error> {
        self.bus.write(address, bytes)
    }

    /// Raw write-then-read without register framing.
    pub fn write_read_raw(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), B::Error> {
        self.bus.write_read(address, bytes, buffer)
    }

    /// View of the bus bound to one device address.
    pub fn device(&mut self, address: u8) -> Device<'_, B> {
        Device { bus: self, address }
    }

    pub fn inner(&self) -> &B {
        &self.bus
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn release(self) -> B {
        self.bus
    }
}

/// A device on the shared bus, addressed with 16-bit big-endian register indices.
///
/// This is what a [`RangingDriver`](crate::driver::RangingDriver) talks through.
#[derive(Debug)]
pub struct Device<'a, B> {
    bus: &'a mut BusManager<B>,
    address: u8,
}

impl<B: TofBus> Device<'_, B> {
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn write_byte<R>(&mut self, register: R, value: u8) -> Result<(), B::Error>
    where
        R: Into<u16>,
    {
        let reg: u16 = register.into();
        let [hi, lo] = reg.to_be_bytes();
        self.bus.bus.write(self.address, &[hi, lo, value])
    }

    pub fn read_byte<R>(&mut self, register: R) -> Result<u8, B::Error>
    where
        R: Into<u16>,
    {
        let mut buffer = [0u8; 1];
        self.read_block(register, &mut buffer)?;
        Ok(buffer[0])
    }

    pub fn write_word<R>(&mut self, register: R, value: u16) -> Result<(), B::Error>
    where
        R: Into<u16>,
    {
        let reg: u16 = register.into();
        let mut buffer = [0u8; 4];
        buffer[0..2].copy_from_slice(&reg.to_be_bytes());
        buffer[2..4].copy_from_slice(&value.to_be_bytes());
        self.bus.bus.write(self.address, &buffer)
    }

    pub fn read_word<R>(&mut self, register: R) -> Result<u16, B::Error>
    where
        R: Into<u16>,
    {
        let mut buffer = [0u8; 2];
        self.read_block(register, &mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    pub fn write_dword<R>(&mut self, register: R, value: u32) -> Result<(), B::Error>
    where
        R: Into<u16>,
    {
        let reg: u16 = register.into();
        let mut buffer = [0u8; 6];
        buffer[0..2].copy_from_slice(&reg.to_be_bytes());
        buffer[2..6].copy_from_slice(&value.to_be_bytes());
        self.bus.bus.write(self.address, &buffer)
    }

    pub fn read_dword<R>(&mut self, register: R) -> Result<u32, B::Error>
    where
        R: Into<u16>,
    {
        let mut buffer = [0u8; 4];
        self.read_block(register, &mut buffer)?;
        Ok(u32::from_be_bytes(buffer))
    }

    /// Reads `buffer.len()` consecutive registers starting at `register`.
    pub fn read_block<R>(&mut self, register: R, buffer: &mut [u8]) -> Result<(), B::Error>
    where
        R: Into<u16>,
    {
        let reg: u16 = register.into();
        self.bus.bus.write_read(self.address, &reg.to_be_bytes(), buffer)
    }
}

/// [`TofBus`] over any `embedded-hal` 1.0 I2C controller.
///
/// The platform layer has already configured the peripheral, so bring-up is
/// a no-op unless a setup hook is supplied.
pub struct I2cBus<I2C: I2c> {
    i2c: I2C,
    setup: Option<fn(&mut I2C) -> Result<(), I2C::Error>>,
}

impl<I2C: I2c> I2cBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        I2cBus { i2c, setup: None }
    }

    /// Runs `setup` as the one-time bring-up (analog filter, timing, ...).
    pub fn with_setup(i2c: I2C, setup: fn(&mut I2C) -> Result<(), I2C::Error>) -> Self {
        I2cBus {
            i2c,
            setup: Some(setup),
        }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> TofBus for I2cBus<I2C> {
    type Error = I2C::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        match self.setup {
            Some(setup) => setup(&mut self.i2c),
            None => Ok(()),
        }
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(address, bytes)
    }

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(address, bytes, buffer)
    }
}
