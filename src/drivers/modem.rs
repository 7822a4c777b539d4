// LeGuardian Bracelet - Cellular/GNSS Modem Driver
//
// AT command transport over UART. The modem provides GPS, signal quality and
// the network clock; the packet data link is brought up by the modem firmware
// and not managed here.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use esp_idf_hal::delay::TickType;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::uart::UartDriver;

use crate::at_reply::{parse_signal_quality, strip_tag};
use crate::capabilities::{NetworkClock, Positioning, SignalMonitor};
use crate::config::*;
use crate::error::SensorUnavailable;

const READ_CHUNK: usize = 128;
const REPLY_MAX: usize = 512;
const PWRKEY_PULSE_MS: u64 = 1_000;
const BOOT_SETTLE_MS: u64 = 3_000;

pub struct Modem<'d> {
    uart: UartDriver<'d>,
    pwrkey: PinDriver<'d, AnyOutputPin, Output>,
    power: PinDriver<'d, AnyOutputPin, Output>,
    dtr: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Modem<'d> {
    pub fn new(
        uart: UartDriver<'d>,
        pwrkey: PinDriver<'d, AnyOutputPin, Output>,
        power: PinDriver<'d, AnyOutputPin, Output>,
        dtr: PinDriver<'d, AnyOutputPin, Output>,
    ) -> Self {
        Self { uart, pwrkey, power, dtr }
    }

    /// Enable the supply and pulse PWRKEY.
    pub fn power_on(&mut self) -> anyhow::Result<()> {
        self.power.set_high()?;
        self.dtr.set_low()?; // keep the modem awake
        self.pwrkey.set_low()?;
        thread::sleep(Duration::from_millis(100));
        self.pwrkey.set_high()?;
        thread::sleep(Duration::from_millis(PWRKEY_PULSE_MS));
        self.pwrkey.set_low()?;
        thread::sleep(Duration::from_millis(BOOT_SETTLE_MS));
        Ok(())
    }

    /// Handshake, configure the APN, wait for attach and enable GNSS.
    pub fn init(&mut self) -> anyhow::Result<()> {
        let mut alive = false;
        for attempt in 1..=MODEM_INIT_ATTEMPTS {
            if self.command("AT", AT_TIMEOUT_MS).is_ok() {
                alive = true;
                break;
            }
            log::warn!("Modem not responding (attempt {attempt}/{MODEM_INIT_ATTEMPTS})");
            self.power_on()?;
        }
        if !alive {
            bail!("modem did not answer AT after {MODEM_INIT_ATTEMPTS} attempts");
        }

        self.command("ATE0", AT_TIMEOUT_MS)?;
        self.command(&format!("AT+CGDCONT=1,\"IP\",\"{APN}\""), AT_TIMEOUT_MS)
            .context("setting APN")?;

        let attached = |r: &str| r.ends_with(",1") || r.ends_with(",5");
        if !self.wait_for("AT+CEREG?", "+CEREG", attached, NETWORK_ATTACH_TIMEOUT_MS) {
            log::warn!("Network not attached after {NETWORK_ATTACH_TIMEOUT_MS} ms, continuing");
        }

        self.command("AT+CGNSSPWR=1", AT_TIMEOUT_MS).context("enabling GNSS")?;
        let powered = |r: &str| r.starts_with('1');
        if !self.wait_for("AT+CGNSSPWR?", "+CGNSSPWR", powered, GNSS_READY_TIMEOUT_MS) {
            log::warn!("GNSS not ready after {GNSS_READY_TIMEOUT_MS} ms, continuing");
        }

        log::info!("Modem initialised");
        Ok(())
    }

    /// Send one AT command and collect the reply up to `OK`/`ERROR`.
    pub fn command(&mut self, cmd: &str, timeout_ms: u64) -> anyhow::Result<String> {
        self.drain();
        self.uart.write(cmd.as_bytes())?;
        self.uart.write(b"\r\n")?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut reply = String::new();
        let mut chunk = [0u8; READ_CHUNK];

        while Instant::now() < deadline {
            let n = self.uart.read(&mut chunk, TickType::new_millis(50).ticks())?;
            if n == 0 {
                continue;
            }
            reply.push_str(&String::from_utf8_lossy(&chunk[..n]));
            if reply.contains("\r\nOK\r\n") || reply.trim_end().ends_with("OK") {
                return Ok(reply);
            }
            if reply.contains("ERROR") {
                bail!("{cmd} -> {}", reply.trim());
            }
            if reply.len() > REPLY_MAX {
                bail!("{cmd}: reply overflow");
            }
        }
        bail!("{cmd}: no reply within {timeout_ms} ms")
    }

    /// Run `cmd` and return the body of the first `tag` line.
    fn query(&mut self, cmd: &str, tag: &str) -> Option<String> {
        let reply = match self.command(cmd, AT_TIMEOUT_MS) {
            Ok(reply) => reply,
            Err(e) => {
                log::debug!("{e:#}");
                return None;
            }
        };
        reply
            .lines()
            .find(|line| line.trim_start().starts_with(tag))
            .map(|line| strip_tag(line, tag).to_string())
    }

    fn wait_for(
        &mut self,
        cmd: &str,
        tag: &str,
        ready: impl Fn(&str) -> bool,
        timeout_ms: u64,
    ) -> bool {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        while Instant::now() < deadline {
            if self.query(cmd, tag).is_some_and(|r| ready(&r)) {
                return true;
            }
            thread::sleep(Duration::from_millis(1_000));
        }
        false
    }

    fn drain(&mut self) {
        let mut scratch = [0u8; READ_CHUNK];
        while matches!(self.uart.read(&mut scratch, 0), Ok(n) if n > 0) {}
    }
}

impl Positioning for Modem<'_> {
    fn gnss_info(&mut self) -> Result<String, SensorUnavailable> {
        self.query("AT+CGNSSINFO", "+CGNSSINFO").ok_or(SensorUnavailable::NoFix)
    }
}

impl SignalMonitor for Modem<'_> {
    fn signal_quality(&mut self) -> u8 {
        self.query("AT+CSQ", "+CSQ")
            .and_then(|r| parse_signal_quality(&r))
            .unwrap_or(0)
    }
}

impl NetworkClock for Modem<'_> {
    fn network_time(&mut self) -> Result<String, SensorUnavailable> {
        self.query("AT+CCLK?", "+CCLK").ok_or(SensorUnavailable::ClockUnavailable)
    }
}
