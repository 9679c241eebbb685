// src/common/mod.rs

pub mod clock;
pub mod config;
pub mod error;
pub mod fault;
pub mod hal_traits;
pub mod timing;
pub mod types;

// --- Re-export key types/traits for easier access ---

pub use clock::{DelayClock, Micros};
#[cfg(any(feature = "std", test))]
pub use clock::StdClock;

pub use config::{
    EnableLine, IdentificationPolicy, InterruptLine, ManagerConfig, SensorConfig,
    DEFAULT_SENSOR_ADDRESS, MAX_INTERRUPT_LINES,
};

pub use error::{ConfigStep, DriverError, EnableError, FaultKind, TofError};

pub use fault::{FaultLed, FaultSink, LogFaults};

pub use hal_traits::{Clock, TofBus, TofInstant};

pub use types::{
    DistanceMode, Fix1616, RangeStatus, RangingResult, SensorId, SensorState, TargetRange,
    MAX_TARGETS,
};
