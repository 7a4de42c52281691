//! Response classification shared by all strategies.

use crate::error::{Result, StrategyError};
use lantern_auth::SessionContext;
use lantern_net::{HttpResponse, PacedClient};

/// Body marker of the platform's soft throttle page.
pub const THROTTLE_MARKER: &str = "Please wait a few minutes";

/// Body marker of an API call rejected for lack of a session.
pub const LOGIN_REQUIRED_MARKER: &str = "login_required";

/// Send an authenticated GET through the pacer and classify the response.
pub async fn fetch(
    client: &PacedClient,
    context: &SessionContext,
    url: String,
) -> Result<HttpResponse> {
    let response = client.send(context.request(url)).await?;
    check_response(&response)?;
    Ok(response)
}

/// Map a raw response onto the strategy error taxonomy.
///
/// # Errors
/// Returns the matching [`StrategyError`] for anything but a usable 2xx.
pub fn check_response(response: &HttpResponse) -> Result<()> {
    let status = response.status;

    if status == 401 || response.is_login_redirect() || is_login_required(&response.body) {
        return Err(StrategyError::Unauthorized(format!("HTTP {status}")));
    }
    if status == 429 || response.body.contains(THROTTLE_MARKER) {
        return Err(StrategyError::Throttled(format!("HTTP {status}")));
    }
    if status == 404 {
        return Err(StrategyError::NotFound);
    }
    if status >= 500 {
        return Err(StrategyError::Transport(format!("HTTP {status}")));
    }
    if !response.is_success() {
        return Err(StrategyError::Parse(format!("unexpected HTTP {status}")));
    }
    Ok(())
}

// Only JSON bodies carry the marker as a status; HTML pages may mention it in scripts.
fn is_login_required(body: &str) -> bool {
    body.trim_start().starts_with('{') && body.contains(LOGIN_REQUIRED_MARKER)
}
