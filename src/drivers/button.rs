// LeGuardian Bracelet - User Button

use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};

use crate::capabilities::ButtonInput;

/// Active-LOW button with the internal pull-up enabled.
pub struct Button<'d> {
    pin: PinDriver<'d, AnyIOPin, Input>,
}

impl<'d> Button<'d> {
    pub fn new(pin: AnyIOPin) -> anyhow::Result<Self> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(Pull::Up)?;
        Ok(Self { pin })
    }
}

impl ButtonInput for Button<'_> {
    fn is_pressed(&mut self) -> bool {
        self.pin.is_low()
    }
}
