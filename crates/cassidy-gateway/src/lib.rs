//! Cassidy Gateway - the relay's HTTP surface.
//!
//! A Roblox game script talks to this server with a static shared-secret
//! header. The gateway validates the secret, normalizes the request for the
//! configured upstream (OpenRouter or Gemini), makes exactly one upstream
//! call, and reshapes the reply into the envelope the game expects.
//!
//! Design goals:
//! - Accept game traffic on `/cassidy`, `/cassidy-vision`, and `/memory`.
//! - Forward to the configured upstream without retries or buffering.
//! - Keep upstream failure detail in the server log, never in the client
//!   body.

pub mod auth;
pub mod config;
pub mod error;
pub mod reply;
pub mod server;

pub use config::ProxyConfig;
pub use error::GatewayError;
pub use server::{serve, AppState};
