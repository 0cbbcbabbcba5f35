use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::analytics::{consulta_stats, metrics_window_start, system_metrics};
use crate::auth::{bearer_matches, verify_login};
pub use crate::chat::CATEGORY_NOT_FOUND_MESSAGE;
use crate::chat::{ChatError, ChatService};
use crate::matching::RulesHandle;
use crate::store::DataStore;

pub const INVALID_QUERY_MESSAGE: &str = "La consulta es requerida y debe ser un texto";
pub const BAD_CREDENTIALS_MESSAGE: &str = "Usuario o contraseña incorrectos.";

#[derive(Clone)]
pub struct AppState {
    chat: ChatService,
    store: Arc<dyn DataStore>,
    admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, rules: RulesHandle, admin_token: Option<String>) -> Self {
        Self {
            chat: ChatService::new(Arc::clone(&store), rules),
            store,
            admin_token: admin_token.map(Arc::from),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/chat", post(chat))
        .route("/api/admin/consultas", get(admin_consultas))
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/metrics", get(admin_metrics))
        .route("/api/admin/login", post(admin_login))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// JSON error body with a status code.
struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Deserialize)]
struct ChatReq {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatReq>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Ok(Json(req)) = payload else {
        return Err(ApiError::error(StatusCode::BAD_REQUEST, INVALID_QUERY_MESSAGE));
    };

    match state.chat.respond(&req.query, req.session_id).await {
        Ok(reply) => Ok(Json(reply).into_response()),
        Err(ChatError::InvalidInput) => {
            Err(ApiError::error(StatusCode::BAD_REQUEST, INVALID_QUERY_MESSAGE))
        }
        Err(ChatError::CategoryNotFound(_)) => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            body: json!({ "response": CATEGORY_NOT_FOUND_MESSAGE }),
        }),
    }
}

async fn admin_consultas(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if !bearer_matches(&headers, state.admin_token.as_deref()) {
        return Err(ApiError::error(StatusCode::UNAUTHORIZED, "No autorizado"));
    }
    match state.store.list_consultas().await {
        Ok(rows) => Ok(Json(json!({ "consultas": rows })).into_response()),
        Err(e) => {
            error!(error = %e, "listing consultas failed");
            Err(ApiError::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al obtener datos",
            ))
        }
    }
}

async fn admin_stats(State(state): State<AppState>) -> Result<Response, ApiError> {
    match state.store.list_consultas().await {
        Ok(rows) => Ok(Json(consulta_stats(&rows)).into_response()),
        Err(e) => {
            error!(error = %e, "consulta stats failed");
            Err(ApiError::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al obtener estadísticas",
            ))
        }
    }
}

async fn admin_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let now = Utc::now();
    match state.store.consultas_since(metrics_window_start(now)).await {
        Ok(rows) => Ok(Json(system_metrics(&rows, now)).into_response()),
        Err(e) => {
            error!(error = %e, "system metrics failed");
            Err(ApiError::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al obtener métricas",
            ))
        }
    }
}

#[derive(Deserialize)]
struct LoginReq {
    email: String,
    password: String,
}

async fn admin_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginReq>, JsonRejection>,
) -> Result<Response, ApiError> {
    let unauthorized = || ApiError::error(StatusCode::UNAUTHORIZED, BAD_CREDENTIALS_MESSAGE);
    let Ok(Json(req)) = payload else {
        return Err(unauthorized());
    };
    match verify_login(&*state.store, &req.email, &req.password).await {
        Ok(true) => Ok(Json(json!({ "success": true })).into_response()),
        Ok(false) => Err(unauthorized()),
        Err(e) => {
            warn!(error = %e, "admin lookup failed");
            Err(unauthorized())
        }
    }
}
