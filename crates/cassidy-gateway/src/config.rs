//! Configuration from environment variables.
//!
//! Everything is resolved once at startup into an immutable `ProxyConfig`
//! that is passed explicitly into the server; there are no ambient globals.
//!
//! **Environment variables:**
//! - `PORT`: listen port (default: 3000)
//! - `PROXY_SECRET`: shared secret checked against `X-Proxy-Key`
//! - `UPSTREAM`: `openrouter` (default) or `gemini`
//! - `OPENROUTER_API_KEY` / `GEMINI_API_KEY`: key for the chosen upstream
//! - `UPSTREAM_BASE_URL`: base URL override (testing / self-hosted proxies)
//! - `UPSTREAM_MODEL`: model override
//! - `REQUEST_TIMEOUT_SECS`: upstream request timeout (default: 60)
//! - `MEMORY_PATH`: memory bank file (default: `~/.cassidy/memory_bank.json`)
//! - `MEMORY_INJECTION`: set to `false`/`0` to disable persona injection
//! - `ENVELOPE`: `flat` (default) or `openai`, for flatten-mode replies
//! - `BODY_LIMIT_BYTES`: JSON body size limit (default: 2 MiB)

use anyhow::{bail, Context, Result};
use cassidy_memory::MemoryStore;
use cassidy_providers::{ProviderConfig, SecretString, Upstream};
use std::env;
use std::path::PathBuf;

use crate::reply::ReplyEnvelope;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const FALLBACK_SECRET: &str = "changeme123";

#[derive(Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub shared_secret: SecretString,
    pub provider: ProviderConfig,
    pub envelope: ReplyEnvelope,
    pub memory_injection: bool,
    pub memory_path: PathBuf,
    pub body_limit_bytes: usize,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self> {
        let upstream = match env::var("UPSTREAM").ok().as_deref() {
            None | Some("openrouter") => Upstream::OpenRouter,
            Some("gemini") => Upstream::Gemini,
            Some(other) => bail!("unknown UPSTREAM value: {}", other),
        };

        let mut provider = match upstream {
            Upstream::OpenRouter => ProviderConfig::openrouter(
                env::var("OPENROUTER_API_KEY").context("OPENROUTER_API_KEY not set")?,
            ),
            Upstream::Gemini => ProviderConfig::gemini(
                env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?,
            ),
        };
        if let Ok(model) = env::var("UPSTREAM_MODEL") {
            provider = provider.with_model(model);
        }
        if let Ok(base_url) = env::var("UPSTREAM_BASE_URL") {
            provider = provider.with_base_url(base_url);
        }
        provider = provider.with_timeout(
            env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        let shared_secret = env::var("PROXY_SECRET").unwrap_or_else(|_| {
            tracing::warn!("PROXY_SECRET not set, using the well-known fallback secret");
            FALLBACK_SECRET.to_string()
        });

        let envelope = match env::var("ENVELOPE").ok().as_deref() {
            None | Some("flat") => ReplyEnvelope::Flat,
            Some("openai") => ReplyEnvelope::OpenAi,
            Some(other) => bail!("unknown ENVELOPE value: {}", other),
        };

        let memory_path = match env::var("MEMORY_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => MemoryStore::default_path().context("no usable memory bank location")?,
        };

        let memory_injection = !matches!(
            env::var("MEMORY_INJECTION").ok().as_deref(),
            Some("false") | Some("0") | Some("off")
        );

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            shared_secret: SecretString::from(shared_secret),
            provider,
            envelope,
            memory_injection,
            memory_path,
            body_limit_bytes: env::var("BODY_LIMIT_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BODY_LIMIT),
        })
    }
}
