// LeGuardian Bracelet - Hardware Capabilities
//
// The controller only talks to hardware through these traits. ESP-IDF
// implementations live in `drivers`; tests use in-memory fakes.

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{SensorUnavailable, TransportError};
use crate::events::{Channel, HapticPattern, MotionReading};

/// Raw button level, already inverted for active-low wiring.
pub trait ButtonInput {
    fn is_pressed(&mut self) -> bool;
}

/// GNSS positioning. Returns the raw `+CGNSSINFO` reply body.
pub trait Positioning {
    fn gnss_info(&mut self) -> Result<String, SensorUnavailable>;
}

pub trait SignalMonitor {
    /// CSQ scale 0-31; 0 when unknown.
    fn signal_quality(&mut self) -> u8;
}

/// Network-synchronised clock. Returns the raw `+CCLK` reply body.
pub trait NetworkClock {
    fn network_time(&mut self) -> Result<String, SensorUnavailable>;
}

pub trait MotionSensor {
    /// Probed once at startup; a `false` here is final for the process.
    fn is_available(&mut self) -> bool;
    fn read(&mut self) -> Result<MotionReading, SensorUnavailable>;
}

pub trait Haptic {
    /// Plays the whole pattern before returning.
    fn play(&mut self, pattern: HapticPattern);
}

pub trait IndicatorPins {
    fn set(&mut self, channel: Channel, on: bool);
}

/// Durable registration flag (one byte, 0 = unregistered).
pub trait RegistrationStore {
    fn is_registered(&self) -> bool;
    /// Must be durable before returning `Ok`.
    fn mark_registered(&mut self) -> anyhow::Result<()>;
}

/// A bidirectional byte stream that can be bounded and explicitly released.
pub trait Stream: Read + Write {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;
    fn close(&mut self);
}

pub trait Connector {
    type Stream: Stream;

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self::Stream, TransportError>;
}
