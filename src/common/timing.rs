// src/common/timing.rs

use core::time::Duration;

// === Enable line (XSHUT) sequencing ===

/// How long the enable line is held inactive to reset the sensor.
pub const RESET_PULSE: Duration = Duration::from_millis(2);
/// Settle time after releasing the enable line before the first bus access.
pub const BOOT_SETTLE: Duration = Duration::from_millis(2);

// === Interrupt wait ===

/// Upper bound on the wait for a measurement interrupt. The default timing
/// budget of the sensor is a few tens of milliseconds, so this is generous.
pub const DEFAULT_INTERRUPT_TIMEOUT: Duration = Duration::from_secs(1);
/// Delay between two checks of the pending-interrupt counter.
pub const INTERRUPT_POLL_INTERVAL: Duration = Duration::from_micros(100);
