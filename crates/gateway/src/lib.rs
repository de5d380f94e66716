//! HTTP API gateway for Brewline.
//!
//! Exposes the chat endpoint plus session, history, user, analytics and
//! health routes. Built on Axum.

pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use brewline_agent::TurnOrchestrator;
use brewline_core::error::TurnError;
use brewline_core::message::{Role, SessionKey};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

pub use users::{CustomerRecord, CustomerRegistry};

const MAX_USERNAME_CHARS: usize = 50;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<TurnOrchestrator>,
    pub registry: Arc<CustomerRegistry>,
    /// Session label used for every HTTP conversation
    pub session_label: String,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Permissive CORS
/// - Request body size limit (64 KB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/session/{username}", delete(clear_session_handler))
        .route("/history/{username}", get(history_handler))
        .route("/users", get(users_handler))
        .route("/analytics", get(analytics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Provider, knowledge store, PII engine and session store are built once
/// and shared by every request.
pub async fn start(config: brewline_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let orchestrator = brewline_agent::build_orchestrator(&config)?;
    info!(
        model = %orchestrator.model(),
        rag_enabled = orchestrator.retriever().is_enabled(),
        pii_protection = orchestrator.privacy().is_enabled(),
        "Turn pipeline ready"
    );

    let state = Arc::new(GatewayState {
        orchestrator: Arc::new(orchestrator),
        registry: Arc::new(CustomerRegistry::with_demo_users()),
        session_label: config.memory.default_session.clone(),
    });

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Request / response types ---

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn default_username() -> String {
    "demo".into()
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default = "default_username")]
    username: String,
}

#[derive(Serialize, Deserialize)]
struct ChatResponse {
    response: String,
    username: String,
    customer_id: String,
    timestamp: String,
    pii_masked: bool,
    context_retrieved: bool,
}

#[derive(Serialize, Deserialize)]
struct ClearSessionResponse {
    message: String,
    customer_id: String,
}

#[derive(Serialize, Deserialize)]
struct HistoryMessage {
    #[serde(rename = "type")]
    kind: String,
    content: String,
}

#[derive(Serialize, Deserialize)]
struct HistoryResponse {
    username: String,
    customer_id: String,
    messages: Vec<HistoryMessage>,
    count: usize,
}

#[derive(Serialize, Deserialize)]
struct UserEntry {
    customer_id: String,
    name: String,
}

#[derive(Serialize, Deserialize)]
struct UsersResponse {
    users: BTreeMap<String, UserEntry>,
    count: usize,
}

#[derive(Serialize, Deserialize)]
struct AnalyticsResponse {
    total_users: usize,
    active_conversations: usize,
    total_messages: usize,
    messages_per_user: BTreeMap<String, usize>,
    rag_enabled: bool,
    timestamp: String,
}

#[derive(Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    model: String,
    rag_enabled: bool,
    pii_protection: bool,
}

// --- Handlers ---

fn validate_username(username: &str) -> Result<&str, ApiError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_CHARS {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Username must be 1 to {MAX_USERNAME_CHARS} characters"),
        ));
    }
    Ok(username)
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let username = validate_username(&payload.username)?;
    let customer = state.registry.get_or_create(username).await;

    info!(
        customer_id = %customer.customer_id,
        message_len = payload.message.len(),
        "Chat request"
    );

    let result = state
        .orchestrator
        .handle_turn(&customer.customer_id, &state.session_label, &payload.message)
        .await
        .map_err(|e| match e {
            TurnError::Validation(reason) => {
                warn!(customer_id = %customer.customer_id, reason = %reason, "Chat request rejected");
                api_error(StatusCode::BAD_REQUEST, reason)
            }
            TurnError::Completion(err) => {
                error!(customer_id = %customer.customer_id, error = %err, "Chat turn failed");
                api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Sorry, I couldn't come up with a reply just now. Please try again.",
                )
            }
        })?;

    Ok(Json(ChatResponse {
        response: result.reply_text,
        username: username.to_string(),
        customer_id: customer.customer_id.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        pii_masked: result.pii_masked,
        context_retrieved: result.context_retrieved,
    }))
}

async fn clear_session_handler(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<Json<ClearSessionResponse>, ApiError> {
    let username = validate_username(&username)?;
    let customer = state.registry.get_or_create(username).await;
    let key = SessionKey::new(customer.customer_id.clone(), state.session_label.as_str());

    let existed = state.orchestrator.sessions().clear(&key);
    info!(customer_id = %customer.customer_id, existed, "Session cleared");

    Ok(Json(ClearSessionResponse {
        message: format!("Session cleared for {username}"),
        customer_id: customer.customer_id.to_string(),
    }))
}

async fn history_handler(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let username = validate_username(&username)?;
    let customer = state.registry.get_or_create(username).await;
    let key = SessionKey::new(customer.customer_id.clone(), state.session_label.as_str());

    let history = state
        .orchestrator
        .sessions()
        .get(&key)
        .await
        .unwrap_or_default();
    let messages: Vec<HistoryMessage> = history
        .iter()
        .map(|m| HistoryMessage {
            kind: match m.role {
                Role::User => "human".into(),
                Role::Assistant => "ai".into(),
                Role::System => "system".into(),
            },
            content: m.content.clone(),
        })
        .collect();

    Ok(Json(HistoryResponse {
        username: username.to_string(),
        customer_id: customer.customer_id.to_string(),
        count: messages.len(),
        messages,
    }))
}

async fn users_handler(State(state): State<SharedState>) -> Json<UsersResponse> {
    let users: BTreeMap<String, UserEntry> = state
        .registry
        .list()
        .await
        .into_iter()
        .map(|(username, record)| {
            (
                username,
                UserEntry {
                    customer_id: record.customer_id.to_string(),
                    name: record.name,
                },
            )
        })
        .collect();

    Json(UsersResponse {
        count: users.len(),
        users,
    })
}

async fn analytics_handler(State(state): State<SharedState>) -> Json<AnalyticsResponse> {
    let sessions = state.orchestrator.sessions().list().await;
    let users = state.registry.list().await;

    let mut messages_per_user = BTreeMap::new();
    let mut total_messages = 0;
    for (key, history) in &sessions {
        let label = users
            .iter()
            .find(|(_, record)| record.customer_id == key.customer)
            .map(|(username, _)| username.clone())
            .unwrap_or_else(|| key.customer.to_string());
        *messages_per_user.entry(label).or_insert(0) += history.len();
        total_messages += history.len();
    }

    Json(AnalyticsResponse {
        total_users: users.len(),
        active_conversations: sessions.len(),
        total_messages,
        messages_per_user,
        rag_enabled: state.orchestrator.retriever().is_enabled(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        model: state.orchestrator.model().to_string(),
        rag_enabled: state.orchestrator.retriever().is_enabled(),
        pii_protection: state.orchestrator.privacy().is_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use brewline_core::error::{ProviderError, RetrievalError};
    use brewline_core::knowledge::{Document, Passage, VectorStore};
    use brewline_core::message::Message;
    use brewline_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use brewline_memory::{KnowledgeRetriever, SessionStore};
    use brewline_privacy::{PatternEngine, PrivacyGuard};
    use brewline_providers::CompletionClient;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ProviderResponse {
                message: Message::assistant(format!("You said: {last}")),
                usage: None,
                model: "echo".into(),
            })
        }
    }

    struct DownProvider;

    #[async_trait]
    impl Provider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::ApiError {
                status_code: 503,
                message: "upstream secret detail".into(),
            })
        }
    }

    struct ProfileStore;

    #[async_trait]
    impl VectorStore for ProfileStore {
        fn name(&self) -> &str {
            "profiles"
        }
        async fn similarity_search(&self, _q: &str, _k: usize) -> Result<Vec<Passage>, RetrievalError> {
            Ok(vec![Passage {
                id: "p1".into(),
                content: "CUST-001 John Doe. Usual: Hot Cocoa.".into(),
                source: "cust_001.txt".into(),
                score: 0.9,
                embedding: None,
            }])
        }
        async fn add_documents(&self, _d: Vec<Document>) -> Result<usize, RetrievalError> {
            Ok(0)
        }
        async fn count(&self) -> Result<usize, RetrievalError> {
            Ok(1)
        }
        async fn clear(&self) -> Result<(), RetrievalError> {
            Ok(())
        }
    }

    fn state_with(provider: Arc<dyn Provider>) -> SharedState {
        let orchestrator = TurnOrchestrator::new(
            PrivacyGuard::new(Arc::new(PatternEngine::new().unwrap()), "en"),
            KnowledgeRetriever::new(Arc::new(ProfileStore)),
            CompletionClient::new(provider, "test-model").with_max_retries(0),
            Arc::new(SessionStore::new(20)),
        );
        Arc::new(GatewayState {
            orchestrator: Arc::new(orchestrator),
            registry: Arc::new(CustomerRegistry::with_demo_users()),
            session_label: "default".into(),
        })
    }

    fn test_state() -> SharedState {
        state_with(Arc::new(EchoProvider))
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = build_router(test_state())
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = body_json(response).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.model, "test-model");
        assert!(health.rag_enabled);
        assert!(health.pii_protection);
    }

    #[tokio::test]
    async fn chat_masks_pii_and_reports_flags() {
        let response = build_router(test_state())
            .oneshot(chat_request(serde_json::json!({
                "message": "My phone is 9876543210 and I want my usual hot cocoa",
                "username": "john"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let chat: ChatResponse = body_json(response).await;
        assert_eq!(chat.username, "john");
        assert_eq!(chat.customer_id, "CUST-001");
        assert!(chat.pii_masked);
        assert!(chat.context_retrieved);
        assert!(!chat.response.contains("9876543210"));
    }

    #[tokio::test]
    async fn chat_defaults_to_demo_user() {
        let response = build_router(test_state())
            .oneshot(chat_request(serde_json::json!({"message": "hi"})))
            .await
            .unwrap();
        let chat: ChatResponse = body_json(response).await;
        assert_eq!(chat.username, "demo");
        assert_eq!(chat.customer_id, "CUST-999");
    }

    #[tokio::test]
    async fn empty_message_is_bad_request() {
        let response = build_router(test_state())
            .oneshot(chat_request(serde_json::json!({"message": "   ", "username": "john"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = body_json(response).await;
        assert_eq!(err.error, "Message cannot be empty");
    }

    #[tokio::test]
    async fn completion_failure_hides_details() {
        let response = build_router(state_with(Arc::new(DownProvider)))
            .oneshot(chat_request(serde_json::json!({"message": "hello", "username": "john"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorResponse = body_json(response).await;
        assert!(!err.error.contains("secret"));
        assert!(!err.error.contains("503"));
    }

    #[tokio::test]
    async fn history_then_clear_session() {
        let state = test_state();

        build_router(state.clone())
            .oneshot(chat_request(serde_json::json!({"message": "hello", "username": "sarah"})))
            .await
            .unwrap();

        let history: HistoryResponse = body_json(
            build_router(state.clone())
                .oneshot(get_request("/history/sarah"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(history.customer_id, "CUST-002");
        assert_eq!(history.count, 2);
        assert_eq!(history.messages[0].kind, "human");
        assert_eq!(history.messages[0].content, "hello");
        assert_eq!(history.messages[1].kind, "ai");

        let response = build_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/session/sarah")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cleared: ClearSessionResponse = body_json(response).await;
        assert_eq!(cleared.customer_id, "CUST-002");

        let history: HistoryResponse = body_json(
            build_router(state)
                .oneshot(get_request("/history/sarah"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(history.count, 0);
    }

    #[tokio::test]
    async fn users_lists_seeded_and_provisioned() {
        let state = test_state();
        build_router(state.clone())
            .oneshot(chat_request(serde_json::json!({"message": "hi", "username": "maria"})))
            .await
            .unwrap();

        let users: UsersResponse = body_json(
            build_router(state)
                .oneshot(get_request("/users"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(users.count, 4);
        assert_eq!(users.users["maria"].customer_id, "CUST-004");
        assert_eq!(users.users["maria"].name, "Maria");
        assert_eq!(users.users["john"].name, "John Doe");
    }

    #[tokio::test]
    async fn analytics_counts_messages() {
        let state = test_state();
        for (user, msg) in [("john", "one"), ("john", "two"), ("sarah", "three")] {
            build_router(state.clone())
                .oneshot(chat_request(serde_json::json!({"message": msg, "username": user})))
                .await
                .unwrap();
        }

        let analytics: AnalyticsResponse = body_json(
            build_router(state)
                .oneshot(get_request("/analytics"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(analytics.total_users, 3);
        assert_eq!(analytics.active_conversations, 2);
        assert_eq!(analytics.total_messages, 6);
        assert_eq!(analytics.messages_per_user["john"], 4);
        assert_eq!(analytics.messages_per_user["sarah"], 2);
        assert!(analytics.rag_enabled);
    }

    #[tokio::test]
    async fn history_lookup_does_not_open_a_conversation() {
        let state = test_state();

        let history: HistoryResponse = body_json(
            build_router(state.clone())
                .oneshot(get_request("/history/john"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(history.count, 0);

        let analytics: AnalyticsResponse = body_json(
            build_router(state)
                .oneshot(get_request("/analytics"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(analytics.active_conversations, 0);
        assert_eq!(analytics.total_messages, 0);
    }

    #[tokio::test]
    async fn overlong_username_is_rejected() {
        let response = build_router(test_state())
            .oneshot(chat_request(serde_json::json!({
                "message": "hi",
                "username": "x".repeat(51)
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
