// LeGuardian Bracelet - Telemetry Lifecycle Controller
//
// One cooperative loop. Each `tick` runs, in this order and without
// re-entrance: button, indicator, collection, association refresh,
// transmission, command poll. Network calls block the loop until they return
// or time out.

use crate::association;
use crate::at_reply::parse_network_time;
use crate::capabilities::{
    ButtonInput, Connector, Haptic, IndicatorPins, MotionSensor, NetworkClock, Positioning,
    RegistrationStore, SignalMonitor,
};
use crate::collector::{CollectionReport, TelemetryCollector};
use crate::commands::{self, RemoteCommand};
use crate::config::{HEARTBEAT_TIMEOUT_MS, PATH_DANGER_UPDATE, PATH_HEARTBEAT};
use crate::events::{HapticPattern, IndicatorState, TelemetrySample};
use crate::http::{HttpClient, ReadMode, Request, StatusOutcome};
use crate::indicator::Indicator;
use crate::input::{ButtonDebouncer, ButtonEvent};
use crate::payload::{build_payload, resolve_timestamp};
use crate::registration;
use crate::scheduler::SchedulerTimers;
use crate::state::DeviceState;
use crate::time::Tick;

/// Concrete hardware types for one board.
pub trait Platform {
    type Button: ButtonInput;
    type Modem: Positioning + SignalMonitor + NetworkClock;
    type Motion: MotionSensor;
    type Haptic: Haptic;
    type Indicator: IndicatorPins;
    type Store: RegistrationStore;
    type Connector: Connector;
}

pub struct Peripherals<P: Platform> {
    pub button: P::Button,
    pub modem: P::Modem,
    pub motion: P::Motion,
    pub haptic: P::Haptic,
    pub indicator: P::Indicator,
    pub store: P::Store,
}

/// Result of the transmission step of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transmission {
    /// Interval elapsed but the device is not associated; no stream opened.
    SkippedUnassociated,
    Sent(StatusOutcome),
    Failed,
}

/// What one `tick` did, in execution order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub button: Option<ButtonEvent>,
    /// New emergency mode when a long press toggled it.
    pub emergency_toggled: Option<bool>,
    /// Set when the collection step ran.
    pub collection: Option<CollectionReport>,
    pub association_refreshed: bool,
    pub transmission: Option<Transmission>,
    pub command_polled: bool,
}

pub struct Controller<P: Platform> {
    hw: Peripherals<P>,
    client: HttpClient<P::Connector>,
    state: DeviceState,
    sample: TelemetrySample,
    timers: SchedulerTimers,
    button: ButtonDebouncer,
    indicator: Indicator,
    indicator_override: Option<IndicatorState>,
    collector: Option<TelemetryCollector>,
    boot: Tick,
}

impl<P: Platform> Controller<P> {
    pub fn new(hw: Peripherals<P>, client: HttpClient<P::Connector>, boot: Tick) -> Self {
        Self {
            hw,
            client,
            state: DeviceState::default(),
            sample: TelemetrySample::default(),
            timers: SchedulerTimers::new(),
            button: ButtonDebouncer::new(),
            indicator: Indicator::new(),
            indicator_override: None,
            collector: None,
            boot,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn sample(&self) -> &TelemetrySample {
        &self.sample
    }

    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    pub fn peripherals(&self) -> &Peripherals<P> {
        &self.hw
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals<P> {
        &mut self.hw
    }

    pub fn transmission_interval_ms(&self) -> u32 {
        self.state.transmission_interval_ms()
    }

    /// Force an indicator state regardless of association (e.g. `Off`).
    pub fn set_indicator_override(&mut self, state: Option<IndicatorState>) {
        self.indicator_override = state;
    }

    /// One-time startup: registration, motion probe, first association check.
    pub fn start(&mut self, now: Tick) {
        registration::ensure_registered(&mut self.client, &mut self.hw.store, &mut self.state);
        self.collector = Some(TelemetryCollector::probe(&mut self.hw.motion));
        self.refresh_association(now);
        log::info!(
            "Controller started (registered: {}, associated: {})",
            self.state.registered(),
            self.state.associated()
        );
    }

    pub fn tick(&mut self, now: Tick) -> TickReport {
        let mut report = TickReport::default();

        // 1. Button
        let pressed = self.hw.button.is_pressed();
        report.button = self.button.update(pressed, now);
        if let Some(ButtonEvent::LongPress { held_ms }) = report.button {
            report.emergency_toggled = Some(self.toggle_emergency(held_ms));
        }

        // 2. Indicator
        let desired = self.desired_indicator();
        self.indicator.update(desired, now, &mut self.hw.indicator);

        // 3. Collection
        if self.timers.collection_due(now) {
            self.timers.mark_collection(now);
            let collector = *self
                .collector
                .get_or_insert_with(|| TelemetryCollector::probe(&mut self.hw.motion));
            report.collection =
                Some(collector.collect(&mut self.sample, &mut self.hw.modem, &mut self.hw.motion));
        }

        // 4. Association
        if self.timers.association_due(now) {
            self.refresh_association(now);
            report.association_refreshed = true;
        }

        // 5. Transmission
        if self.timers.transmission_due(now, self.state.transmission_interval_ms()) {
            self.timers.mark_transmission(now);
            report.transmission = Some(self.transmit(now));
        }

        // 6. Remote commands
        if self.state.associated() && self.timers.command_poll_due(now) {
            self.timers.mark_command_poll(now);
            self.poll_commands();
            report.command_polled = true;
        }

        report
    }

    fn desired_indicator(&self) -> IndicatorState {
        self.indicator_override.unwrap_or(if self.state.associated() {
            IndicatorState::Normal
        } else {
            IndicatorState::Blinking
        })
    }

    fn toggle_emergency(&mut self, held_ms: u32) -> bool {
        let emergency = self.state.toggle_emergency();
        let pattern = if emergency {
            HapticPattern::EnterEmergency
        } else {
            HapticPattern::ExitEmergency
        };
        log::info!(
            "Long press ({held_ms} ms): emergency mode {}, sending every {} s",
            if emergency { "ON" } else { "OFF" },
            self.state.transmission_interval_ms() / 1000
        );
        self.hw.haptic.play(pattern);
        emergency
    }

    fn refresh_association(&mut self, now: Tick) {
        self.timers.mark_association_check(now);
        let associated = match association::refresh(&mut self.client) {
            Ok(associated) => associated,
            Err(e) => {
                log::warn!("Association check failed, treating as unassociated: {e}");
                false
            }
        };
        if self.state.set_associated(associated) {
            log::info!("Association changed: {associated}");
        }
    }

    fn transmit(&mut self, now: Tick) -> Transmission {
        if !self.state.associated() {
            log::debug!("Not associated, skipping transmission");
            return Transmission::SkippedUnassociated;
        }

        let network_time = self
            .hw
            .modem
            .network_time()
            .ok()
            .and_then(|reply| parse_network_time(&reply));
        let uptime_secs = u64::from(now.elapsed_since(self.boot) / 1000);
        let (timestamp, source) = resolve_timestamp(network_time, &self.sample.gps, uptime_secs);

        let emergency = self.state.emergency_mode();
        let body = match build_payload(&self.sample, emergency, &timestamp) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Payload serialization failed: {e}");
                return Transmission::Failed;
            }
        };

        let path = if emergency { PATH_DANGER_UPDATE } else { PATH_HEARTBEAT };
        let request = Request::post(path, &body)
            .read_mode(ReadMode::StatusLine)
            .timeout_ms(HEARTBEAT_TIMEOUT_MS);

        match self.client.send(&request) {
            Ok(outcome) => {
                match outcome {
                    StatusOutcome::Accepted => {
                        log::info!("Telemetry sent to {path} ({} bytes, time from {source:?})", body.len())
                    }
                    StatusOutcome::Rejected => log::warn!("Telemetry rejected by {path}"),
                }
                Transmission::Sent(outcome)
            }
            Err(e) => {
                log::warn!("Telemetry send to {path} failed: {e}");
                Transmission::Failed
            }
        }
    }

    fn poll_commands(&mut self) {
        let (id, name) = match commands::fetch_pending(&mut self.client) {
            Ok(Some(pending)) => pending,
            Ok(None) => return,
            Err(e) => {
                log::warn!("Command poll failed: {e}");
                return;
            }
        };

        match RemoteCommand::from_name(&name).haptic_pattern() {
            Some(pattern) => {
                log::info!("Executing remote command {name} (#{id})");
                self.hw.haptic.play(pattern);
            }
            None => log::warn!("Unsupported remote command {name} (#{id}), acknowledging anyway"),
        }

        if let Err(e) = commands::acknowledge(&mut self.client, id) {
            log::warn!("Command #{id} acknowledgement failed: {e}");
        }
    }
}
