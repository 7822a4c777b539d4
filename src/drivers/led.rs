// LeGuardian Bracelet - Indicator LEDs

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use crate::capabilities::IndicatorPins;
use crate::events::Channel;

pub struct LedPair<'d> {
    pins: [PinDriver<'d, AnyOutputPin, Output>; 2],
}

impl<'d> LedPair<'d> {
    pub fn new(
        primary: PinDriver<'d, AnyOutputPin, Output>,
        secondary: PinDriver<'d, AnyOutputPin, Output>,
    ) -> Self {
        Self { pins: [primary, secondary] }
    }
}

impl IndicatorPins for LedPair<'_> {
    fn set(&mut self, channel: Channel, on: bool) {
        let pin = &mut self.pins[channel.index()];
        let result = if on { pin.set_high() } else { pin.set_low() };
        if let Err(e) = result {
            log::warn!("LED {channel:?} write failed: {e}");
        }
    }
}
