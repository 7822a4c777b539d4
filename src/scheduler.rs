// LeGuardian Bracelet - Collection / Transmission Scheduler
//
// A timer that has never fired is due immediately, so the first loop
// iteration collects and (if associated) transmits.

use crate::config::{ASSOCIATION_TTL_MS, COLLECTION_INTERVAL_MS, COMMAND_POLL_INTERVAL_MS};
use crate::time::Tick;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerTimers {
    last_collection: Option<Tick>,
    last_transmission: Option<Tick>,
    last_association_check: Option<Tick>,
    last_command_poll: Option<Tick>,
}

fn due(last: Option<Tick>, now: Tick, interval_ms: u32) -> bool {
    last.map_or(true, |last| now.has_elapsed(last, interval_ms))
}

impl SchedulerTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection_due(&self, now: Tick) -> bool {
        due(self.last_collection, now, COLLECTION_INTERVAL_MS)
    }

    pub fn mark_collection(&mut self, now: Tick) {
        self.last_collection = Some(now);
    }

    pub fn transmission_due(&self, now: Tick, interval_ms: u32) -> bool {
        due(self.last_transmission, now, interval_ms)
    }

    /// Advanced whether or not anything is actually sent.
    pub fn mark_transmission(&mut self, now: Tick) {
        self.last_transmission = Some(now);
    }

    pub fn association_due(&self, now: Tick) -> bool {
        due(self.last_association_check, now, ASSOCIATION_TTL_MS)
    }

    pub fn mark_association_check(&mut self, now: Tick) {
        self.last_association_check = Some(now);
    }

    pub fn command_poll_due(&self, now: Tick) -> bool {
        due(self.last_command_poll, now, COMMAND_POLL_INTERVAL_MS)
    }

    pub fn mark_command_poll(&mut self, now: Tick) {
        self.last_command_poll = Some(now);
    }
}
