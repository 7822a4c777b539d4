// LeGuardian Bracelet - Telemetry Lifecycle Controller
//
// Hardware-independent core of the bracelet firmware. Everything outside
// `drivers` builds and tests on the host; `drivers` binds the capabilities to
// ESP-IDF peripherals.

pub mod association;
pub mod at_reply;
pub mod capabilities;
pub mod collector;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod http;
pub mod indicator;
pub mod input;
pub mod payload;
pub mod registration;
pub mod scheduler;
pub mod state;
pub mod time;

#[cfg(target_os = "espidf")]
pub mod drivers;
