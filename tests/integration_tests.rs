use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use frontdesk::config::{AppConfig, ProviderKind, ProviderSettings};
use frontdesk::db;
use frontdesk::handlers;
use frontdesk::models::BusinessProfile;
use frontdesk::services::ai::chain::ProviderChain;
use frontdesk::services::ai::{LlmProvider, Message};
use frontdesk::services::conversation::{ConversationEngine, EngineSettings};
use frontdesk::services::scheduling::OperatingRules;
use frontdesk::services::sessions::{SessionStore, SqliteSessionStore};
use frontdesk::state::AppState;

// ── Mock Providers ──

/// Deterministic extraction keyed on the caller's words; translations echo the source text.
struct MockLlm;

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, messages: &[Message], json_mode: bool) -> anyhow::Result<String> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");

        if !json_mode {
            if messages[0].content.contains("translator") {
                return Ok(last.to_string());
            }
            return Ok("We are open Monday to Friday, 10:00 to 18:00.".to_string());
        }

        if last.contains("book") {
            Ok(r#"{"intent":"BOOKING","name":null,"service_request":null,"detected_language":"English"}"#.to_string())
        } else if last.contains("'Asha Rao'") {
            Ok(r#"{"name":"Asha Rao"}"#.to_string())
        } else if last.contains("'Cleaning'") {
            Ok(r#"{"service_request":"Cleaning"}"#.to_string())
        } else if last.contains("'saturday'") {
            Ok(r#"{"date":"2099-01-03","time":"11:00"}"#.to_string())
        } else if last.contains("'wednesday'") {
            Ok(r#"{"date":"2099-01-07","time":"11:00"}"#.to_string())
        } else {
            Ok(r#"{"intent":"FAQ","name":null,"service_request":null,"detected_language":"English"}"#.to_string())
        }
    }

    fn label(&self) -> &str {
        "mock"
    }
}

struct DownLlm;

#[async_trait]
impl LlmProvider for DownLlm {
    async fn chat(&self, _messages: &[Message], _json_mode: bool) -> anyhow::Result<String> {
        anyhow::bail!("connection refused")
    }

    fn label(&self) -> &str {
        "down"
    }
}

// ── Helpers ──

const PROFILE: &str = r#"
clinic_info:
  name: Sharma Dental Care
  contact: "+91 98765 43210"
  hours: "Mon-Fri 10:00-18:00"
services:
  - name: Cleaning
  - name: Root Canal
"#;

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        business_profile_path: "config/business_profile.yaml".to_string(),
        booking_lead_minutes: 30,
        session_ttl_minutes: 30,
        max_slot_retries: 0,
        providers: vec![ProviderSettings {
            name: "mock".to_string(),
            kind: ProviderKind::OpenAi,
            base_url: "http://localhost".to_string(),
            api_key: String::new(),
            model: "mock".to_string(),
        }],
        chat_caller_id: "terminal".to_string(),
    }
}

fn test_state_with(providers: Vec<Box<dyn LlmProvider>>) -> Arc<AppState> {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let store = Arc::new(SqliteSessionStore::new(
        Arc::new(Mutex::new(conn)),
        config.session_ttl_minutes,
    ));
    let chain = Arc::new(ProviderChain::new(providers));
    let engine = ConversationEngine::new(
        Arc::clone(&chain),
        Arc::new(BusinessProfile::from_yaml_str(PROFILE).unwrap()),
        Arc::clone(&store) as Arc<dyn SessionStore>,
        EngineSettings {
            rules: OperatingRules {
                lead_time_minutes: config.booking_lead_minutes,
            },
            max_slot_retries: config.max_slot_retries,
        },
    );

    Arc::new(AppState {
        config,
        engine,
        chain,
        store,
    })
}

fn test_state() -> Arc<AppState> {
    test_state_with(vec![Box::new(MockLlm)])
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn message_request(from: &str, message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/message")
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::json!({ "from": from, "message": message }).to_string(),
        ))
        .unwrap()
}

fn admin_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn say(state: &Arc<AppState>, from: &str, message: &str) -> serde_json::Value {
    let (status, json) = send(test_app(state.clone()), message_request(from, message)).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {json}");
    json
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let res = test_app(test_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ok");
}

// ── Conversation Flow Tests ──

#[tokio::test]
async fn test_full_booking_flow() {
    let state = test_state();
    let caller = "+15550001111";

    let json = say(&state, caller, "I want to book an appointment").await;
    assert_eq!(json["state"], "AWAITING_NAME");
    assert!(json["reply"].as_str().unwrap().contains("full name"));

    let json = say(&state, caller, "Asha Rao").await;
    assert_eq!(json["state"], "AWAITING_SERVICE");
    assert!(json["reply"].as_str().unwrap().contains("Cleaning, Root Canal"));

    let json = say(&state, caller, "Cleaning").await;
    assert_eq!(json["state"], "AWAITING_TIME");
    assert!(json["reply"].as_str().unwrap().contains("Mon-Fri 10:00-18:00"));

    let json = say(&state, caller, "saturday").await;
    assert_eq!(json["state"], "AWAITING_TIME");
    assert!(json["reply"].as_str().unwrap().contains("closed on weekends"));

    let json = say(&state, caller, "wednesday").await;
    assert_eq!(json["state"], "START");
    let reply = json["reply"].as_str().unwrap();
    assert!(reply.contains("2099-01-07"));
    assert!(reply.contains("Asha Rao"));
    assert!(reply.contains("Cleaning"));

    let (status, bookings) = send(test_app(state.clone()), admin_request("GET", "/api/bookings")).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = bookings.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["caller_id"], caller);
    assert_eq!(bookings[0]["time"], "11:00");
}

#[tokio::test]
async fn test_callers_are_independent() {
    let state = test_state();

    say(&state, "+15550001111", "I want to book").await;
    let json = say(&state, "+15550002222", "When are you open?").await;

    assert_eq!(json["state"], "START");
    assert_eq!(json["reply"], "We are open Monday to Friday, 10:00 to 18:00.");
    assert_eq!(
        state.store.load("+15550001111").state.as_str(),
        "AWAITING_NAME"
    );
}

#[tokio::test]
async fn test_all_providers_down_apologises() {
    let state = test_state_with(vec![Box::new(DownLlm), Box::new(DownLlm)]);

    let json = say(&state, "+15550001111", "I want to book").await;
    assert_eq!(json["state"], "START");
    assert!(json["reply"].as_str().unwrap().contains("+91 98765 43210"));

    let (status, json) = send(test_app(state.clone()), admin_request("GET", "/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["chain"]["exhausted"].as_u64().unwrap() >= 1);
    assert_eq!(json["providers"], serde_json::json!(["down", "down"]));
}

#[tokio::test]
async fn test_fallback_provider_answers() {
    let state = test_state_with(vec![Box::new(DownLlm), Box::new(MockLlm)]);

    let json = say(&state, "+15550001111", "I want to book").await;
    assert_eq!(json["state"], "AWAITING_NAME");
    assert!(state.chain.stats().fallbacks >= 1);
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let (status, json) = send(test_app(test_state()), message_request("+15550001111", "   ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("message"));

    let (status, _) = send(test_app(test_state()), message_request("", "hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Admin API Tests ──

#[tokio::test]
async fn test_admin_requires_auth() {
    for uri in ["/api/status", "/api/bookings", "/api/sessions/+15550001111"] {
        let res = test_app(test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_admin_wrong_token() {
    let res = test_app(test_state())
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_status() {
    let state = test_state();
    say(&state, "+15550001111", "I want to book").await;

    let (status, json) = send(test_app(state), admin_request("GET", "/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["clinic"], "Sharma Dental Care");
    assert_eq!(json["providers"], serde_json::json!(["mock"]));
    assert_eq!(json["active_sessions"], 1);
    assert!(json["chain"]["calls"].as_u64().unwrap() >= 2);
    assert_eq!(json["chain"]["exhausted"], 0);
}

#[tokio::test]
async fn test_admin_session_view_and_reset() {
    let state = test_state();
    say(&state, "+15550001111", "I want to book").await;
    say(&state, "+15550001111", "Asha Rao").await;

    let (status, json) = send(
        test_app(state.clone()),
        admin_request("GET", "/api/sessions/+15550001111"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "AWAITING_SERVICE");
    assert_eq!(json["context"]["name"], "Asha Rao");

    for _ in 0..2 {
        let (status, json) = send(
            test_app(state.clone()),
            admin_request("POST", "/api/sessions/+15550001111/reset"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], "START");
        assert!(json["context"]["name"].is_null());
    }

    let json = say(&state, "+15550001111", "Asha Rao").await;
    assert_eq!(json["state"], "START");
}

#[tokio::test]
async fn test_unknown_session_is_fresh() {
    let (status, json) = send(
        test_app(test_state()),
        admin_request("GET", "/api/sessions/nobody"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "nobody");
    assert_eq!(json["state"], "START");
}
