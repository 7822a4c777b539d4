// LeGuardian Bracelet - Hardware & System Configuration
// Target: LilyGO T-A7670E (ESP32 + SIMCom A7670E LTE/GNSS modem)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_BUTTON: i32 = 0;        // BOOT button (INPUT_PULLUP, active LOW)
pub const PIN_HAPTIC: i32 = 32;       // Vibration motor driver
pub const PIN_LED_PRIMARY: i32 = 33;  // Indicator channel 1
pub const PIN_LED_SECONDARY: i32 = 14; // Indicator channel 2
pub const PIN_I2C_SDA: i32 = 21;
pub const PIN_I2C_SCL: i32 = 22;
pub const PIN_MODEM_TX: i32 = 26;
pub const PIN_MODEM_RX: i32 = 27;
pub const PIN_MODEM_PWRKEY: i32 = 4;
pub const PIN_MODEM_POWER: i32 = 12;
pub const PIN_MODEM_DTR: i32 = 25;

// ---------------------------------------------------------------------------
// I2C Bus / Modem UART
// ---------------------------------------------------------------------------
pub const I2C_ADDR_LSM6DS3: u8 = 0x6A;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks
pub const MODEM_BAUDRATE: u32 = 115_200;
pub const MODEM_INIT_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// Remote service
// ---------------------------------------------------------------------------
pub const SERVER_HOST: &str = match option_env!("BRACELET_SERVER_HOST") {
    Some(host) => host,
    None => "api.leguardian.fr",
};
pub const SERVER_PORT: u16 = parse_port(option_env!("BRACELET_SERVER_PORT"), 80);
pub const DEVICE_ID: &str = match option_env!("BRACELET_DEVICE_ID") {
    Some(id) => id,
    None => "BRACELET-0001",
};
pub const APN: &str = match option_env!("BRACELET_APN") {
    Some(apn) => apn,
    None => "orange",
};

pub const PATH_REGISTER: &str = "/api/devices/register";
pub const PATH_CHECK_ASSOCIATION: &str = "/api/devices/check-association";
pub const PATH_HEARTBEAT: &str = "/api/devices/heartbeat";
pub const PATH_DANGER_UPDATE: &str = "/api/devices/danger/update";
pub const PATH_COMMANDS: &str = "/api/devices/commands";

/// Reported in every payload; the A7670E only attaches over LTE Cat-1.
pub const NETWORK_TYPE: &str = "4G";

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const LOOP_INTERVAL_MS: u64 = 10;
pub const COLLECTION_INTERVAL_MS: u32 = 5_000;
pub const SEND_NORMAL_MS: u32 = 180_000;       // 3 minutes
pub const SEND_EMERGENCY_MS: u32 = 60_000;     // 1 minute
pub const ASSOCIATION_TTL_MS: u32 = 3_600_000; // 1 hour
pub const COMMAND_POLL_INTERVAL_MS: u32 = 30_000;
pub const LONG_PRESS_MS: u32 = 3_000;          // 3-second hold
pub const INDICATOR_BLINK_MS: u32 = 500;

pub const CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const HEARTBEAT_TIMEOUT_MS: u64 = 5_000;
pub const REGISTRATION_TIMEOUT_MS: u64 = 10_000;
pub const ASSOCIATION_TIMEOUT_MS: u64 = 10_000;
pub const COMMAND_TIMEOUT_MS: u64 = 10_000;

pub const AT_TIMEOUT_MS: u64 = 2_000;
pub const GNSS_READY_TIMEOUT_MS: u64 = 30_000;
pub const NETWORK_ATTACH_TIMEOUT_MS: u64 = 30_000;

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------
pub const HTTP_RESPONSE_MAX: usize = 2048;

/// Fixed endpoint and identity used by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub device_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: SERVER_HOST.into(),
            port: SERVER_PORT,
            device_id: DEVICE_ID.into(),
        }
    }
}

const fn parse_port(value: Option<&str>, fallback: u16) -> u16 {
    let bytes = match value {
        Some(v) => v.as_bytes(),
        None => return fallback,
    };
    if bytes.is_empty() {
        return fallback;
    }
    let mut port: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            return fallback;
        }
        port = port * 10 + (b - b'0') as u32;
        if port > u16::MAX as u32 {
            return fallback;
        }
        i += 1;
    }
    port as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_override_parses_digits_only() {
        assert_eq!(parse_port(None, 80), 80);
        assert_eq!(parse_port(Some("8080"), 80), 8080);
        assert_eq!(parse_port(Some(""), 80), 80);
        assert_eq!(parse_port(Some("80a"), 80), 80);
        assert_eq!(parse_port(Some("70000"), 80), 80);
    }

    #[test]
    fn emergency_cadence_is_faster_than_normal() {
        assert!(SEND_EMERGENCY_MS < SEND_NORMAL_MS);
        assert!(COLLECTION_INTERVAL_MS < SEND_EMERGENCY_MS);
    }
}
