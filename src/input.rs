// LeGuardian Bracelet - Button Input
//
// Edge + dwell-time detector, polled once per control-loop iteration. There is
// no settle timer: the loop period is the only debounce.

use crate::config::LONG_PRESS_MS;
use crate::time::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Released before the long-press threshold. No state change.
    ShortPress { held_ms: u32 },
    /// Held for at least the long-press threshold, emitted on release.
    LongPress { held_ms: u32 },
}

#[derive(Debug, Default)]
pub struct ButtonDebouncer {
    pressed: bool,
    press_start: Option<Tick>,
}

impl ButtonDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed the current raw level; returns an event on the release edge.
    pub fn update(&mut self, pressed: bool, now: Tick) -> Option<ButtonEvent> {
        // ---- button pressed edge ----
        if pressed && !self.pressed {
            self.pressed = true;
            self.press_start = Some(now);
            return None;
        }

        // ---- button released edge ----
        if !pressed && self.pressed {
            self.pressed = false;
            let held_ms = self
                .press_start
                .take()
                .map(|start| now.elapsed_since(start))
                .unwrap_or(0);

            return Some(if held_ms >= LONG_PRESS_MS {
                ButtonEvent::LongPress { held_ms }
            } else {
                ButtonEvent::ShortPress { held_ms }
            });
        }

        None
    }
}
