// LeGuardian Bracelet - Monotonic Ticks
//
// Millisecond counter that wraps at ~49.7 days. All interval checks go through
// `Tick::elapsed_since`, which subtracts with wraparound.

/// Milliseconds since boot, truncated to 32 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tick(pub u32);

impl Tick {
    /// Milliseconds from `earlier` to `self`, correct across one counter wrap.
    pub const fn elapsed_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    pub const fn has_elapsed(self, since: Tick, interval_ms: u32) -> bool {
        self.elapsed_since(since) >= interval_ms
    }

    pub const fn wrapping_add(self, ms: u32) -> Tick {
        Tick(self.0.wrapping_add(ms))
    }
}

/// Milliseconds since boot. Wraps after ~49 days; compare with `elapsed_since`.
#[cfg(target_os = "espidf")]
pub fn now_ms() -> Tick {
    Tick(unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 })
}

#[cfg(not(target_os = "espidf"))]
pub fn now_ms() -> Tick {
    use std::sync::OnceLock;
    use std::time::Instant;

    static BOOT: OnceLock<Instant> = OnceLock::new();
    let boot = BOOT.get_or_init(Instant::now);
    Tick(boot.elapsed().as_millis() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_survives_counter_overflow() {
        let before_wrap = Tick(u32::MAX - 999);
        let after_wrap = before_wrap.wrapping_add(5_000);
        assert_eq!(after_wrap, Tick(4_000));
        assert_eq!(after_wrap.elapsed_since(before_wrap), 5_000);
        assert!(after_wrap.has_elapsed(before_wrap, 5_000));
        assert!(!after_wrap.has_elapsed(before_wrap, 5_001));
    }

    #[test]
    fn zero_interval_is_always_elapsed() {
        assert!(Tick(42).has_elapsed(Tick(42), 0));
    }
}
