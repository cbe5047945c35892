//! Axum-based gateway: flight/maintenance data routes, squadron summary, and
//! AI chat brokering. Config-driven via AppConfig.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hangar_core::{
    classify_greeting, summarize, AppConfig, AuditLog, AzureClient, ChatOrchestrator, ChatRequest,
    ChatTurn, CompletionClient, FlightStore, HangarError, Intent, NeuroClient, PromptLibrary,
    GREETING_REPLY, SHORT_CIRCUIT_CONFIDENCE,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[hangar-gateway] .env not loaded: {e} (using system environment)");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::load().expect("load AppConfig"));
    let data_dir = PathBuf::from(&config.data_dir);
    let store = Arc::new(FlightStore::new(&data_dir));
    let prompts = Arc::new(PromptLibrary::load(&config.prompts_file));

    let logs_dir = data_dir.join("logs");
    let ai_audit = AuditLog::new(logs_dir.join("ai.log"));
    let neuro_audit = AuditLog::new(logs_dir.join("ai_chat.log"));
    let gesture_log = AuditLog::new(logs_dir.join("gesture.log"));

    let azure = Arc::new(AzureClient::new(config.azure.clone()).expect("build azure client"));
    let neuro: Arc<dyn CompletionClient> =
        Arc::new(NeuroClient::new(config.neuro.clone()).expect("build neuro client"));
    let chat = Arc::new(ChatOrchestrator::new(Arc::clone(&store), prompts, ai_audit, azure));

    let app = build_app(AppState {
        config: Arc::clone(&config),
        store,
        chat,
        neuro,
        neuro_audit,
        gesture_log,
    });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        "{} listening on {} (env={})",
        config.app_name,
        addr,
        config.environment
    );
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) store: Arc<FlightStore>,
    pub(crate) chat: Arc<ChatOrchestrator>,
    pub(crate) neuro: Arc<dyn CompletionClient>,
    pub(crate) neuro_audit: AuditLog,
    pub(crate) gesture_log: AuditLog,
}

fn build_app(state: AppState) -> Router {
    let public_dir = PathBuf::from(&state.config.public_dir);
    // Single-page app shell for all unmatched routes, served as 200
    let spa = ServeDir::new(&public_dir).fallback(ServeFile::new(public_dir.join("index.html")));

    Router::new()
        .route("/api/flights", get(list_flights))
        .route("/api/flights/:id", get(get_flight).put(put_flight))
        .route("/api/squadron-summary", get(squadron_summary))
        .route("/api/tuner", get(get_tuner).put(put_tuner))
        .route("/api/gesture-log", post(append_gesture_log))
        .route("/api/ai-chat", post(ai_chat))
        .route("/api/neuro-chat", post(neuro_chat))
        .fallback_service(spa)
        .with_state(state)
}

/// Structured error response: `{ "error": kind, "detail": message }` with the
/// status dictated by the error kind.
struct ApiError(HangarError);

impl From<HangarError> for ApiError {
    fn from(e: HangarError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = Json(json!({ "error": self.0.kind(), "detail": self.0.detail() }));
        (status, body).into_response()
    }
}

/// GET /api/flights – the master flights document, verbatim.
async fn list_flights(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.store.load_flights_raw().await?))
}

/// GET /api/flights/:id – override file preferred over the master record.
async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.store.load_flight_raw(&id).await?))
}

/// PUT /api/flights/:id – overwrite the override file for this id.
async fn put_flight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.store.save_override(&id, &body).await?;
    Ok(Json(json!({ "saved": true })))
}

/// GET /api/squadron-summary – current rollup with per-flight worst status.
async fn squadron_summary(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let doc = state.store.load_flights().await?;
    let summary = summarize(&doc.flights);
    Ok(Json(serde_json::to_value(&summary).map_err(|e| {
        HangarError::Storage(format!("failed to encode summary: {e}"))
    })?))
}

/// GET /api/tuner – opaque settings blob; read failure reads as `{}`.
async fn get_tuner(State(state): State<AppState>) -> Json<Value> {
    Json(state.store.load_tuner().await)
}

/// PUT /api/tuner – persist the settings blob verbatim.
async fn put_tuner(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.store.save_tuner(&body).await?;
    Ok(Json(json!({ "saved": true })))
}

/// POST /api/gesture-log – fire-and-forget timestamped trace line.
async fn append_gesture_log(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.gesture_log.append(json!({ "payload": body })).await;
    Json(json!({ "saved": true }))
}

/// POST /api/ai-chat – full decision policy: local short-circuit or Azure
/// delegation (see ChatOrchestrator).
async fn ai_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    let reply = state.chat.handle(req).await?;
    Ok(Json(json!({ "reply": reply })))
}

/// POST /api/neuro-chat – alternate provider route: greeting short-circuit,
/// otherwise direct delegation with no system prompt enrichment.
async fn neuro_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.message.is_empty() {
        return Err(HangarError::BadRequest("missing message".to_string()).into());
    }
    state
        .neuro_audit
        .append(json!({ "event": "request", "message": req.message.chars().take(512).collect::<String>() }))
        .await;

    let cls = classify_greeting(&req.message);
    state
        .neuro_audit
        .append(json!({ "event": "classification", "classification": cls }))
        .await;
    tracing::info!(intent = ?cls.intent, confidence = cls.confidence, "neuro classification");

    if cls.intent == Intent::Greeting && cls.confidence >= SHORT_CIRCUIT_CONFIDENCE {
        state
            .neuro_audit
            .append(json!({ "event": "local-reply", "reply": GREETING_REPLY }))
            .await;
        return Ok(Json(json!({ "reply": GREETING_REPLY })));
    }

    let mut messages = Vec::with_capacity(req.history.len() + 1);
    messages.extend(req.history.iter().cloned());
    messages.push(ChatTurn::user(req.message.clone()));

    match state.neuro.complete(&messages).await {
        Ok(reply) => {
            state
                .neuro_audit
                .append(json!({ "event": "api-reply", "reply": reply.chars().take(2000).collect::<String>() }))
                .await;
            Ok(Json(json!({ "reply": reply })))
        }
        Err(e) => {
            state
                .neuro_audit
                .append(json!({ "event": "api-error", "kind": e.kind(), "detail": e.detail() }))
                .await;
            Err(e.into())
        }
    }
}
