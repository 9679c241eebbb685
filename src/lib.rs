// src/lib.rs

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

// Must come first so the logging macros are visible in every module below.
mod fmt;

pub mod acquisition;
pub mod bus;
pub mod common;
pub mod driver;
pub mod enable;
pub mod interrupt;

// Re-export key types for convenience
pub use acquisition::TofManager;
pub use bus::{BusManager, Device, I2cBus};
pub use common::{
    Clock, DistanceMode, EnableLine, FaultKind, FaultSink, IdentificationPolicy, InterruptLine,
    ManagerConfig, RangingResult, SensorConfig, SensorId, SensorState, TofBus, TofError,
};
pub use driver::RangingDriver;
pub use enable::{EnableControl, ExpanderEnable, GpioEnable};
pub use interrupt::InterruptTable;
