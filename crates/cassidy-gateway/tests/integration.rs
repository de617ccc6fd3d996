use actix_web::{test, web, App};
use base64::Engine;
use cassidy_gateway::reply::{ReplyEnvelope, CHAT_FALLBACK};
use cassidy_gateway::server::{self, AppState};
use cassidy_gateway::ProxyConfig;
use cassidy_memory::default_bank;
use cassidy_providers::{ProviderConfig, SecretString, Upstream};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "sekrit";
const BODY_LIMIT: usize = 2 * 1024 * 1024;

fn test_config(upstream: Upstream, base_url: &str, memory_path: PathBuf) -> ProxyConfig {
    let provider = match upstream {
        Upstream::OpenRouter => ProviderConfig::openrouter("test-key"),
        Upstream::Gemini => ProviderConfig::gemini("test-key"),
    };
    ProxyConfig {
        port: 0,
        shared_secret: SecretString::from(SECRET),
        provider: provider.with_base_url(base_url),
        envelope: ReplyEnvelope::Flat,
        memory_injection: true,
        memory_path,
        body_limit_bytes: BODY_LIMIT,
    }
}

macro_rules! init_app {
    ($config:expr) => {{
        let state = web::Data::new(AppState::from_config($config).unwrap());
        test::init_service(
            App::new()
                .app_data(state)
                .app_data(server::json_config(BODY_LIMIT))
                .configure(server::routes),
        )
        .await
    }};
}

fn chat_body() -> Value {
    json!({"messages": [{"role": "user", "content": "hello"}]})
}

// -- Banner & auth -------------------------------------------------------

#[actix_web::test]
async fn test_banner_requires_no_auth() {
    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::OpenRouter,
        "http://localhost:1",
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    let req = test::TestRequest::get().uri("/").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "Cassidy relay running.");
}

#[actix_web::test]
async fn test_protected_routes_reject_bad_proxy_key() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let memory_path = dir.path().join("memory_bank.json");
    let config = test_config(Upstream::OpenRouter, &upstream.uri(), memory_path.clone());
    let app = init_app!(config);

    let attempts = [
        test::TestRequest::post().uri("/cassidy").set_json(chat_body()),
        test::TestRequest::post()
            .uri("/cassidy-vision")
            .set_json(json!({"image": "Zm9v"})),
        test::TestRequest::get().uri("/memory"),
        test::TestRequest::post().uri("/memory").set_json(json!({"a": "b"})),
        test::TestRequest::post()
            .uri("/cassidy")
            .insert_header(("X-Proxy-Key", "wrong"))
            .set_json(chat_body()),
    ];

    for req in attempts {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    // No upstream call was made (wiremock verifies on drop) and no memory
    // bank was created or mutated.
    assert!(!memory_path.exists());
}

// -- Chat validation -----------------------------------------------------

#[actix_web::test]
async fn test_chat_rejects_empty_and_non_array_messages() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::OpenRouter,
        &upstream.uri(),
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    for body in [
        json!({"messages": []}),
        json!({"messages": "not an array"}),
        json!({"messages": {"role": "user"}}),
        json!({}),
    ] {
        let req = test::TestRequest::post()
            .uri("/cassidy")
            .insert_header(("X-Proxy-Key", SECRET))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}

#[actix_web::test]
async fn test_vision_rejects_missing_image() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::OpenRouter,
        &upstream.uri(),
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    for body in [json!({}), json!({"image": ""}), json!({"context": "look"})] {
        let req = test::TestRequest::post()
            .uri("/cassidy-vision")
            .insert_header(("X-Proxy-Key", SECRET))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}

// -- Pass-through mode ---------------------------------------------------

#[actix_web::test]
async fn test_passthrough_forwards_body_and_returns_upstream_envelope() {
    let upstream = MockServer::start().await;
    let reply = json!({"choices": [{"message": {"role": "assistant", "content": "ahoy"}}]});

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_json(chat_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
        .expect(1)
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(
        Upstream::OpenRouter,
        &upstream.uri(),
        dir.path().join("memory_bank.json"),
    );
    config.memory_injection = false;
    let app = init_app!(config);

    let req = test::TestRequest::post()
        .uri("/cassidy")
        .insert_header(("X-Proxy-Key", SECRET))
        .set_json(chat_body())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, reply);
}

#[actix_web::test]
async fn test_passthrough_injects_persona_system_message() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .expect(1)
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let memory_path = dir.path().join("memory_bank.json");
    std::fs::write(
        &memory_path,
        serde_json::to_string(&json!({
            "core_memories": "met the player at the docks",
            "user_facts": "",
            "current_context": "",
        }))
        .unwrap(),
    )
    .unwrap();

    let config = test_config(Upstream::OpenRouter, &upstream.uri(), memory_path);
    let app = init_app!(config);

    let req = test::TestRequest::post()
        .uri("/cassidy")
        .insert_header(("X-Proxy-Key", SECRET))
        .set_json(chat_body())
        .to_request();
    test::call_service(&app, req).await;

    let received = upstream.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    let messages = sent["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"]
        .as_str()
        .unwrap()
        .contains("met the player at the docks"));
    assert_eq!(messages[1]["content"], "hello");
}

#[actix_web::test]
async fn test_upstream_failure_returns_generic_500() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("super secret detail"))
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::OpenRouter,
        &upstream.uri(),
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    let req = test::TestRequest::post()
        .uri("/cassidy")
        .insert_header(("X-Proxy-Key", SECRET))
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("super secret detail"));
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["error"], "Proxy error occurred.");
}

// -- Flatten mode --------------------------------------------------------

#[actix_web::test]
async fn test_flatten_mode_returns_flat_reply_with_injected_persona() {
    let upstream = MockServer::start().await;
    let reply = json!({"candidates": [{"content": {"parts": [{"text": "yarr"}]}}]});

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
        .expect(1)
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::Gemini,
        &upstream.uri(),
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    let req = test::TestRequest::post()
        .uri("/cassidy")
        .insert_header(("X-Proxy-Key", SECRET))
        .set_json(json!({"messages": [
            {"role": "user", "content": "a"},
            {"role": "user", "content": "b"},
        ]}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"reply": "yarr"}));

    // The flattened prompt keeps the blank-line separator convention and
    // carries the persona in front (no system channel in flatten mode).
    let received = upstream.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    let text = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("You are Cassidy"));
    assert!(text.ends_with("a\n\nb\n\n"));
}

#[actix_web::test]
async fn test_flatten_mode_falls_back_when_no_candidate_text() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::Gemini,
        &upstream.uri(),
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    let req = test::TestRequest::post()
        .uri("/cassidy")
        .insert_header(("X-Proxy-Key", SECRET))
        .set_json(chat_body())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"reply": CHAT_FALLBACK}));
}

// -- Vision --------------------------------------------------------------

#[actix_web::test]
async fn test_vision_returns_vision_envelope() {
    let upstream = MockServer::start().await;
    let reply = json!({"choices": [{"message": {"role": "assistant", "content": "a dog"}}]});

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
        .expect(1)
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::OpenRouter,
        &upstream.uri(),
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    let image = base64::engine::general_purpose::STANDARD.encode(b"fake-image-bytes");
    let req = test::TestRequest::post()
        .uri("/cassidy-vision")
        .insert_header(("X-Proxy-Key", SECRET))
        .set_json(json!({"image": image, "context": "what is this?"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"vision": "a dog"}));

    let received = upstream.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    let parts = sent["messages"][0]["content"].as_array().unwrap();
    assert_eq!(parts[0]["text"], "what is this?");
    assert!(parts[1]["image_url"]["url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

// -- Memory management ---------------------------------------------------

#[actix_web::test]
async fn test_memory_first_get_returns_documented_defaults() {
    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::OpenRouter,
        "http://localhost:1",
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    let req = test::TestRequest::get()
        .uri("/memory")
        .insert_header(("X-Proxy-Key", SECRET))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, default_bank());
}

#[actix_web::test]
async fn test_memory_round_trip_is_full_replace() {
    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::OpenRouter,
        "http://localhost:1",
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    let bank = json!({"user_facts": "captains the ferry", "mood": "cheerful"});
    let req = test::TestRequest::post()
        .uri("/memory")
        .insert_header(("X-Proxy-Key", SECRET))
        .set_json(&bank)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"success": true, "current": bank}));

    let req = test::TestRequest::get()
        .uri("/memory")
        .insert_header(("X-Proxy-Key", SECRET))
        .to_request();
    let loaded: Value = test::call_and_read_body_json(&app, req).await;
    // Exactly what was posted: replaced, not merged with defaults.
    assert_eq!(loaded, bank);
}

#[actix_web::test]
async fn test_memory_rejects_non_object_payloads() {
    let dir = TempDir::new().unwrap();
    let config = test_config(
        Upstream::OpenRouter,
        "http://localhost:1",
        dir.path().join("memory_bank.json"),
    );
    let app = init_app!(config);

    for bad in [json!([1, 2, 3]), json!("text"), json!(42), json!(null)] {
        let req = test::TestRequest::post()
            .uri("/memory")
            .insert_header(("X-Proxy-Key", SECRET))
            .set_json(&bad)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
