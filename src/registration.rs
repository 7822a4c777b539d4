// LeGuardian Bracelet - First-Boot Registration
//
// One-shot POST of the device code. The durable flag is written only after the
// service confirms; any failure leaves the device unregistered so the next boot
// retries.

use serde::Serialize;

use crate::capabilities::{Connector, RegistrationStore};
use crate::config::{PATH_REGISTER, REGISTRATION_TIMEOUT_MS};
use crate::error::{NetworkError, ProtocolError};
use crate::http::{HttpClient, ReadMode, Request};
use crate::state::DeviceState;

const ID_TOKEN: &str = "\"id\"";

#[derive(Serialize)]
struct RegisterBody<'a> {
    unique_code: &'a str,
}

/// Registration flag held in RAM. Used when flash storage cannot be opened;
/// registration is then retried on every boot.
#[derive(Debug, Default, Clone)]
pub struct VolatileStore {
    registered: bool,
}

impl RegistrationStore for VolatileStore {
    fn is_registered(&self) -> bool {
        self.registered
    }

    fn mark_registered(&mut self) -> anyhow::Result<()> {
        self.registered = true;
        Ok(())
    }
}

/// POST the registration request; succeeds when the body carries `"id"`.
pub fn register_device<C: Connector>(client: &mut HttpClient<C>) -> Result<(), NetworkError> {
    let body = serde_json::to_string(&RegisterBody {
        unique_code: &client.server().device_id,
    })
    .map_err(|e| ProtocolError::MalformedBody(e.to_string()))?;

    let request = Request::post(PATH_REGISTER, &body)
        .read_mode(ReadMode::UntilClose)
        .timeout_ms(REGISTRATION_TIMEOUT_MS);
    let response = client.exchange(&request)?;

    if response.body().contains(ID_TOKEN) {
        Ok(())
    } else {
        Err(ProtocolError::MissingToken(ID_TOKEN).into())
    }
}

/// Bring `state` in line with the store, registering first if needed.
pub fn ensure_registered<C: Connector, S: RegistrationStore>(
    client: &mut HttpClient<C>,
    store: &mut S,
    state: &mut DeviceState,
) -> bool {
    if store.is_registered() {
        state.mark_registered();
        return true;
    }

    log::info!("Device not registered, registering as {}", client.server().device_id);
    if let Err(e) = register_device(client) {
        log::warn!("Registration failed: {e}");
        return false;
    }

    match store.mark_registered() {
        Ok(()) => {
            state.mark_registered();
            log::info!("Registration confirmed and persisted");
            true
        }
        Err(e) => {
            log::warn!("Registration accepted but flag commit failed: {e:#}");
            false
        }
    }
}
