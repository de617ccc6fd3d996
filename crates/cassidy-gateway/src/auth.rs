//! Shared-secret auth gate.

use actix_web::HttpRequest;
use cassidy_providers::SecretString;
use secrecy::ExposeSecret;

use crate::GatewayError;

pub const PROXY_KEY_HEADER: &str = "X-Proxy-Key";

/// Compare the `X-Proxy-Key` header against the configured secret.
/// An absent or non-UTF-8 header is a mismatch, never a panic.
pub fn require_proxy_key(req: &HttpRequest, secret: &SecretString) -> Result<(), GatewayError> {
    let supplied = req
        .headers()
        .get(PROXY_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match supplied {
        Some(value) if value == secret.expose_secret() => Ok(()),
        _ => Err(GatewayError::Unauthorized),
    }
}
