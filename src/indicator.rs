// LeGuardian Bracelet - Indicator State Machine
//
// Two LED channels. `Blinking` toggles each channel on its own timestamp, so
// the channels are not phase-locked.

use crate::capabilities::IndicatorPins;
use crate::config::INDICATOR_BLINK_MS;
use crate::events::{Channel, IndicatorState};
use crate::time::Tick;

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    on: bool,
    last_toggle: Tick,
}

#[derive(Debug, Default)]
pub struct Indicator {
    state: Option<IndicatorState>,
    channels: [ChannelState; 2],
}

impl Indicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> IndicatorState {
        self.state.unwrap_or_default()
    }

    pub fn is_on(&self, channel: Channel) -> bool {
        self.channels[channel.index()].on
    }

    /// Drive the pins towards `desired`. Pins are only written on change.
    pub fn update<P: IndicatorPins>(&mut self, desired: IndicatorState, now: Tick, pins: &mut P) {
        let entering = self.state != Some(desired);
        self.state = Some(desired);

        match desired {
            IndicatorState::Off => {
                for channel in Channel::ALL {
                    self.drive(channel, false, now, pins, entering);
                }
            }
            IndicatorState::Normal => {
                for channel in Channel::ALL {
                    self.drive(channel, true, now, pins, entering);
                }
            }
            IndicatorState::Blinking => {
                for channel in Channel::ALL {
                    let slot = self.channels[channel.index()];
                    if entering {
                        self.drive(channel, true, now, pins, true);
                    } else if now.has_elapsed(slot.last_toggle, INDICATOR_BLINK_MS) {
                        self.drive(channel, !slot.on, now, pins, false);
                    }
                }
            }
        }
    }

    fn drive<P: IndicatorPins>(
        &mut self,
        channel: Channel,
        on: bool,
        now: Tick,
        pins: &mut P,
        force: bool,
    ) {
        let slot = &mut self.channels[channel.index()];
        if force || slot.on != on {
            pins.set(channel, on);
            slot.on = on;
            slot.last_toggle = now;
        }
    }
}
