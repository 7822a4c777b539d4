// LeGuardian Bracelet - Remote Command Poll
//
// The service queues haptic commands for the device. Each poll fetches at
// most one pending command; it is executed and then acknowledged.

use serde::Deserialize;

use crate::capabilities::Connector;
use crate::config::{COMMAND_TIMEOUT_MS, PATH_COMMANDS};
use crate::error::{NetworkError, ProtocolError};
use crate::events::HapticPattern;
use crate::http::{HttpClient, ReadMode, Request, StatusOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PendingCommand {
    pub command: Option<String>,
    #[serde(default)]
    pub command_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    VibrateShort,
    VibrateMedium,
    VibrateSos,
    Unsupported,
}

impl RemoteCommand {
    pub fn from_name(name: &str) -> Self {
        match name {
            "vibrate_short" => Self::VibrateShort,
            "vibrate_medium" => Self::VibrateMedium,
            "vibrate_sos" => Self::VibrateSos,
            _ => Self::Unsupported,
        }
    }

    pub fn haptic_pattern(&self) -> Option<HapticPattern> {
        match self {
            Self::VibrateShort => Some(HapticPattern::Short),
            Self::VibrateMedium => Some(HapticPattern::Medium),
            Self::VibrateSos => Some(HapticPattern::Sos),
            Self::Unsupported => None,
        }
    }
}

/// Decode the poll response body. `Ok(None)` when nothing is pending.
pub fn parse_pending(body: &str) -> Result<Option<(u64, String)>, ProtocolError> {
    let pending: PendingCommand =
        serde_json::from_str(body.trim()).map_err(|e| ProtocolError::MalformedBody(e.to_string()))?;

    match (pending.command, pending.command_id) {
        (Some(name), Some(id)) => Ok(Some((id, name))),
        (Some(_), None) => Err(ProtocolError::MissingToken("command_id")),
        (None, _) => Ok(None),
    }
}

pub fn fetch_pending<C: Connector>(client: &mut HttpClient<C>) -> Result<Option<(u64, String)>, NetworkError> {
    let request = Request::get(PATH_COMMANDS)
        .read_mode(ReadMode::UntilClose)
        .timeout_ms(COMMAND_TIMEOUT_MS);
    let response = client.exchange(&request)?;
    match response.status_code() {
        Some(200) => Ok(parse_pending(response.body())?),
        Some(_) => Err(ProtocolError::Rejected(response.status_line().to_string()).into()),
        None => Err(ProtocolError::MalformedStatusLine(response.status_line().to_string()).into()),
    }
}

pub fn acknowledge<C: Connector>(client: &mut HttpClient<C>, command_id: u64) -> Result<(), NetworkError> {
    let path = format!("{PATH_COMMANDS}/{command_id}/ack");
    let request = Request::post(&path, "")
        .read_mode(ReadMode::StatusLine)
        .timeout_ms(COMMAND_TIMEOUT_MS);
    let response = client.exchange(&request)?;
    match response.outcome() {
        StatusOutcome::Accepted => Ok(()),
        StatusOutcome::Rejected => Err(ProtocolError::Rejected(response.status_line().to_string()).into()),
    }
}
