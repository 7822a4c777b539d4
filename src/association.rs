// LeGuardian Bracelet - Association Check
//
// The service answers with free-form text; only the boolean literal following
// the first `associated` token matters. Unknown means not associated.

use crate::capabilities::Connector;
use crate::config::{ASSOCIATION_TIMEOUT_MS, PATH_CHECK_ASSOCIATION};
use crate::error::{NetworkError, ProtocolError};
use crate::http::{HttpClient, ReadMode, Request};

const TOKEN: &str = "associated";

/// Locate `associated` and read the boolean literal that follows it.
pub fn extract_associated(body: &str) -> Option<bool> {
    let at = body.find(TOKEN)?;
    let rest = body[at + TOKEN.len()..]
        .trim_start_matches(|c: char| c == '"' || c == '\'' || c == ':' || c == '=' || c.is_whitespace());

    if rest.starts_with("true") {
        Some(true)
    } else if rest.starts_with("false") {
        Some(false)
    } else {
        None
    }
}

/// Query the service once. Callers map any error to "not associated".
pub fn refresh<C: Connector>(client: &mut HttpClient<C>) -> Result<bool, NetworkError> {
    let request = Request::get(PATH_CHECK_ASSOCIATION)
        .read_mode(ReadMode::UntilClose)
        .timeout_ms(ASSOCIATION_TIMEOUT_MS);
    let response = client.exchange(&request)?;

    extract_associated(response.body())
        .ok_or(ProtocolError::MissingToken(TOKEN))
        .map_err(NetworkError::from)
}
