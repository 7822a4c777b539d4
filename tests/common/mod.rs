// Shared fakes for the controller integration tests.
//
// `FakeServer` answers each connection from a per-path route table and records
// every request. The peripherals are plain structs reachable through
// `Controller::peripherals_mut`.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{self, ErrorKind, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use bracelet::capabilities::{
    ButtonInput, Connector, Haptic, IndicatorPins, MotionSensor, NetworkClock, Positioning,
    RegistrationStore, SignalMonitor, Stream,
};
use bracelet::config::ServerConfig;
use bracelet::controller::{Controller, Peripherals, Platform};
use bracelet::error::{SensorUnavailable, TransportError};
use bracelet::events::{Channel, HapticPattern, MotionReading, Vector3};
use bracelet::http::HttpClient;
use bracelet::time::Tick;

pub const OK: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n";
pub const FIX: &str = "1,8,,,,4851.1234,N,00223.4567,E,251224,120000.00,123.4,0.0";

pub fn ok_json(body: &str) -> String {
    format!("{OK}{body}")
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub head: String,
    pub body: String,
}

#[derive(Default)]
pub struct ServerState {
    routes: HashMap<String, VecDeque<String>>,
    pub requests: Vec<Recorded>,
    pub connects: usize,
    pub closes: usize,
    pub offline: bool,
}

impl ServerState {
    /// Queue responses for `path`; the last one repeats.
    pub fn route(&mut self, path: &str, responses: &[&str]) {
        self.routes
            .insert(path.to_string(), responses.iter().map(|r| r.to_string()).collect());
    }

    pub fn requests_to(&self, path: &str) -> Vec<&Recorded> {
        self.requests.iter().filter(|r| r.path == path).collect()
    }

    fn respond(&mut self, path: &str) -> String {
        match self.routes.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => "HTTP/1.1 404 Not Found\r\n\r\n".to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeServer(pub Rc<RefCell<ServerState>>);

impl FakeServer {
    pub fn state(&self) -> std::cell::RefMut<'_, ServerState> {
        self.0.borrow_mut()
    }
}

pub struct FakeStream {
    server: Rc<RefCell<ServerState>>,
    written: Vec<u8>,
    reply: Option<VecDeque<u8>>,
}

impl FakeStream {
    fn answer(&mut self) -> &mut VecDeque<u8> {
        if self.reply.is_none() {
            let text = String::from_utf8_lossy(&self.written).into_owned();
            let (head, body) = text.split_once("\r\n\r\n").unwrap_or((text.as_str(), ""));
            let mut words = head.split_whitespace();
            let recorded = Recorded {
                method: words.next().unwrap_or_default().to_string(),
                path: words.next().unwrap_or_default().to_string(),
                head: head.to_string(),
                body: body.to_string(),
            };
            let mut server = self.server.borrow_mut();
            let response = server.respond(&recorded.path);
            server.requests.push(recorded);
            self.reply = Some(response.into_bytes().into());
        }
        self.reply.get_or_insert_with(VecDeque::new)
    }
}

impl Read for FakeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let reply = self.answer();
        let n = buf.len().min(reply.len());
        for (slot, byte) in buf.iter_mut().zip(reply.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for FakeStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Stream for FakeStream {
    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) {
        self.server.borrow_mut().closes += 1;
    }
}

impl Connector for FakeServer {
    type Stream = FakeStream;

    fn connect(&mut self, host: &str, port: u16, _timeout: Duration) -> Result<FakeStream, TransportError> {
        let mut state = self.0.borrow_mut();
        state.connects += 1;
        if state.offline {
            return Err(TransportError::Connect {
                host: host.into(),
                port,
                source: io::Error::new(ErrorKind::ConnectionRefused, "offline"),
            });
        }
        Ok(FakeStream {
            server: Rc::clone(&self.0),
            written: Vec::new(),
            reply: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Peripherals
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeButton {
    pub pressed: bool,
}

impl ButtonInput for FakeButton {
    fn is_pressed(&mut self) -> bool {
        self.pressed
    }
}

pub struct FakeModem {
    pub gnss: Option<String>,
    pub csq: u8,
    pub clock: Option<String>,
}

impl Default for FakeModem {
    fn default() -> Self {
        Self { gnss: Some(FIX.into()), csq: 18, clock: None }
    }
}

impl Positioning for FakeModem {
    fn gnss_info(&mut self) -> Result<String, SensorUnavailable> {
        self.gnss.clone().ok_or(SensorUnavailable::NoFix)
    }
}

impl SignalMonitor for FakeModem {
    fn signal_quality(&mut self) -> u8 {
        self.csq
    }
}

impl NetworkClock for FakeModem {
    fn network_time(&mut self) -> Result<String, SensorUnavailable> {
        self.clock.clone().ok_or(SensorUnavailable::ClockUnavailable)
    }
}

pub struct FakeImu {
    pub present: bool,
}

impl MotionSensor for FakeImu {
    fn is_available(&mut self) -> bool {
        self.present
    }

    fn read(&mut self) -> Result<MotionReading, SensorUnavailable> {
        if !self.present {
            return Err(SensorUnavailable::MotionSensorAbsent);
        }
        Ok(MotionReading {
            accel: Vector3 { x: 0.1, y: -0.2, z: 9.81 },
            gyro: Vector3 { x: 0.5, y: 0.0, z: -0.5 },
            temperature_c: 30.5,
        })
    }
}

#[derive(Default)]
pub struct FakeHaptic {
    pub played: Vec<HapticPattern>,
}

impl Haptic for FakeHaptic {
    fn play(&mut self, pattern: HapticPattern) {
        self.played.push(pattern);
    }
}

#[derive(Default)]
pub struct FakePins {
    pub level: [bool; 2],
    pub writes: usize,
}

impl IndicatorPins for FakePins {
    fn set(&mut self, channel: Channel, on: bool) {
        self.level[channel.index()] = on;
        self.writes += 1;
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub registered: bool,
    pub fail_commit: bool,
    pub commits: usize,
}

impl FakeStore {
    pub fn registered() -> Self {
        Self { registered: true, ..Self::default() }
    }
}

impl RegistrationStore for FakeStore {
    fn is_registered(&self) -> bool {
        self.registered
    }

    fn mark_registered(&mut self) -> anyhow::Result<()> {
        self.commits += 1;
        if self.fail_commit {
            anyhow::bail!("flash write failed");
        }
        self.registered = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rig
// ---------------------------------------------------------------------------

pub struct FakeBoard;

impl Platform for FakeBoard {
    type Button = FakeButton;
    type Modem = FakeModem;
    type Motion = FakeImu;
    type Haptic = FakeHaptic;
    type Indicator = FakePins;
    type Store = FakeStore;
    type Connector = FakeServer;
}

pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        host: "api.test".into(),
        port: 8080,
        device_id: "BRACELET-TEST".into(),
    }
}

pub fn client(server: &FakeServer) -> HttpClient<FakeServer> {
    HttpClient::new(server.clone(), test_server_config())
}

pub fn peripherals(store: FakeStore) -> Peripherals<FakeBoard> {
    Peripherals {
        button: FakeButton::default(),
        modem: FakeModem::default(),
        motion: FakeImu { present: true },
        haptic: FakeHaptic::default(),
        indicator: FakePins::default(),
        store,
    }
}

/// Registered controller whose association check answers `associated`.
pub fn controller(associated: bool) -> (Controller<FakeBoard>, FakeServer) {
    let server = FakeServer::default();
    server.state().route(
        "/api/devices/check-association",
        &[ok_json(&format!(r#"{{"associated":{associated}}}"#)).as_str()],
    );
    server.state().route("/api/devices/heartbeat", &[OK]);
    server.state().route("/api/devices/danger/update", &[OK]);
    server.state().route("/api/devices/commands", &[ok_json(r#"{"command":null}"#).as_str()]);

    let controller = Controller::new(peripherals(FakeStore::registered()), client(&server), Tick(0));
    (controller, server)
}
