// LeGuardian Bracelet - Device Lifecycle State
//
// Single owner: the controller. Fields change only through the named
// transitions below.

use crate::config::{SEND_EMERGENCY_MS, SEND_NORMAL_MS};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    registered: bool,
    associated: bool,
    emergency_mode: bool,
}

impl DeviceState {
    pub fn registered(&self) -> bool {
        self.registered
    }

    pub fn associated(&self) -> bool {
        self.associated
    }

    pub fn emergency_mode(&self) -> bool {
        self.emergency_mode
    }

    /// Post: `registered()`. Never reverted by firmware.
    pub fn mark_registered(&mut self) {
        self.registered = true;
    }

    /// Returns `true` when the cached association flag changed.
    pub fn set_associated(&mut self, associated: bool) -> bool {
        let changed = self.associated != associated;
        self.associated = associated;
        changed
    }

    /// Inverts emergency mode and returns the new value.
    pub fn toggle_emergency(&mut self) -> bool {
        self.emergency_mode = !self.emergency_mode;
        self.emergency_mode
    }

    pub fn transmission_interval_ms(&self) -> u32 {
        if self.emergency_mode {
            SEND_EMERGENCY_MS
        } else {
            SEND_NORMAL_MS
        }
    }
}
