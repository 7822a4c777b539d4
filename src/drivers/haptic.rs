// LeGuardian Bracelet - Haptic Motor Driver
//
// Simple GPIO-driven vibration motor.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use crate::capabilities::Haptic;
use crate::events::HapticPattern;

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    /// Vibrate for a custom duration (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) {
        let _ = self.pin.set_high();
        thread::sleep(duration);
        let _ = self.pin.set_low();
    }
}

impl Haptic for HapticDriver<'_> {
    fn play(&mut self, pattern: HapticPattern) {
        for (i, &ms) in pattern.segments().iter().enumerate() {
            if i % 2 == 0 {
                self.buzz(Duration::from_millis(ms as u64));
            } else {
                thread::sleep(Duration::from_millis(ms as u64));
            }
        }
    }
}
