//! Actix Web HTTP server.
//!
//! Exposes the relay endpoints:
//! - `GET /` (banner)
//! - `POST /cassidy` (chat)
//! - `POST /cassidy-vision` (vision)
//! - `GET /memory` / `POST /memory` (memory bank management)

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use cassidy_memory::{render_system_instruction, MemoryBank, MemoryStore};
use cassidy_providers::{
    ChatRequest, Upstream, UpstreamClient, UpstreamClientBuilder, VisionRequest,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{auth, config::ProxyConfig, error::GatewayError, reply};

pub struct AppState {
    pub config: ProxyConfig,
    pub client: Arc<dyn UpstreamClient>,
    pub memory: MemoryStore,
}

impl AppState {
    pub fn from_config(config: ProxyConfig) -> Result<Self, GatewayError> {
        let client = UpstreamClientBuilder::new()
            .with_config(config.provider.clone())
            .build()?;
        let memory = MemoryStore::new(config.memory_path.clone());
        Ok(Self {
            config,
            client,
            memory,
        })
    }

    /// Rendered persona instruction, or `None` when injection is disabled.
    /// An unreadable bank degrades to the empty persona instead of failing
    /// the chat request.
    fn persona(&self) -> Option<String> {
        if !self.config.memory_injection {
            return None;
        }
        let bank = match self.memory.load() {
            Ok(value) => MemoryBank::from_value(&value),
            Err(e) => {
                warn!(error = %e, "memory bank unreadable, continuing with empty persona");
                MemoryBank::default()
            }
        };
        Some(render_system_instruction(&bank))
    }
}

pub async fn serve(config: ProxyConfig) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    let body_limit = config.body_limit_bytes;
    info!(
        addr = %addr,
        provider = %match config.provider.upstream {
            Upstream::OpenRouter => "openrouter",
            Upstream::Gemini => "gemini",
        },
        "cassidy relay listening"
    );

    let state = web::Data::new(AppState::from_config(config).context("failed to build app state")?);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(json_config(body_limit))
            .wrap(cors())
            .configure(routes)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {}", addr))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/cassidy", web::post().to(handle_chat))
        .route("/cassidy-vision", web::post().to(handle_vision))
        .route("/memory", web::get().to(handle_memory_get))
        .route("/memory", web::post().to(handle_memory_replace));
}

pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            GatewayError::InvalidRequest(format!("invalid JSON body: {}", err)).into()
        })
}

fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec!["Content-Type", auth::PROXY_KEY_HEADER])
        .max_age(3600)
}

async fn index() -> &'static str {
    "Cassidy relay running."
}

async fn handle_chat(
    state: web::Data<AppState>,
    req_http: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse, GatewayError> {
    auth::require_proxy_key(&req_http, &state.config.shared_secret)?;

    let mut body = body.into_inner();
    let chat: ChatRequest = serde_json::from_value(body.clone()).map_err(|_| {
        GatewayError::InvalidRequest(
            "messages must be an ordered array of {role, content} objects".into(),
        )
    })?;
    if chat.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "messages must not be empty".into(),
        ));
    }

    let persona = state.persona();

    match state.config.provider.upstream {
        // Pass-through mode: the client already speaks the upstream schema,
        // so the body goes out verbatim (plus the persona system message
        // when injection is enabled) and the upstream envelope comes back
        // untouched.
        Upstream::OpenRouter => {
            if let Some(persona) = &persona {
                inject_system_message(&mut body, persona);
            }
            let upstream = state.client.forward(&body).await?;
            Ok(HttpResponse::Ok().json(upstream))
        }
        // Flatten mode: collapse the message list into one prompt, make a
        // single-turn call, and wrap the extracted text in the envelope
        // this deployment promises.
        Upstream::Gemini => {
            let prompt = chat.flatten();
            let generation = state.client.generate(&prompt, persona.as_deref()).await?;
            let text = generation
                .text
                .unwrap_or_else(|| reply::CHAT_FALLBACK.to_string());
            Ok(HttpResponse::Ok().json(reply::chat_reply(state.config.envelope, &text)))
        }
    }
}

/// Prepend the persona as a `role: system` message, the persona channel of
/// the OpenAI-style schema.
fn inject_system_message(body: &mut Value, persona: &str) {
    if let Some(messages) = body.get_mut("messages").and_then(Value::as_array_mut) {
        messages.insert(0, json!({ "role": "system", "content": persona }));
    }
}

async fn handle_vision(
    state: web::Data<AppState>,
    req_http: HttpRequest,
    body: web::Json<VisionRequest>,
) -> Result<HttpResponse, GatewayError> {
    auth::require_proxy_key(&req_http, &state.config.shared_secret)?;

    let vision = body.into_inner();
    let image = vision.image().ok_or(GatewayError::MissingImage)?;

    let generation = state
        .client
        .generate_vision(vision.instruction(), vision.mime_type(), image)
        .await?;
    let text = generation
        .text
        .unwrap_or_else(|| reply::VISION_FALLBACK.to_string());
    Ok(HttpResponse::Ok().json(reply::vision_reply(&text)))
}

async fn handle_memory_get(
    state: web::Data<AppState>,
    req_http: HttpRequest,
) -> Result<HttpResponse, GatewayError> {
    auth::require_proxy_key(&req_http, &state.config.shared_secret)?;

    let bank = state.memory.load()?;
    Ok(HttpResponse::Ok().json(bank))
}

async fn handle_memory_replace(
    state: web::Data<AppState>,
    req_http: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse, GatewayError> {
    auth::require_proxy_key(&req_http, &state.config.shared_secret)?;

    let stored = state.memory.replace(body.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "current": stored })))
}
