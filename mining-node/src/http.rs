// HTTP submit/poll bridge: same router/state/error shape as a typical
// axum REST bridge, narrowed to the worker's two operations instead of
// a wallet/chain query surface.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chainweb_mining_core::Supervisor;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::header_codec::{ChainwebHeaderCodec, MinedHeader};
use crate::metrics::WorkerMetrics;

#[derive(Clone)]
pub struct AppState {
    pub supervisor: Supervisor<MinedHeader, ChainwebHeaderCodec>,
    pub metrics: Arc<Mutex<WorkerMetrics>>,
}

pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    info!("starting submit/poll bridge on {}", addr);

    let app = Router::new()
        .route("/health", get(health))
        .route("/submit", post(submit))
        .route("/poll/:chain_id/:block_height", get(poll))
        .route("/metrics", get(metrics))
        .with_state(state);

    let addr: SocketAddr = addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("submit/poll bridge listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "chainweb-mining-node",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    #[serde(with = "hex_bytes")]
    header: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    accepted: bool,
}

async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    state
        .supervisor
        .submit(req.header)
        .map_err(|e| ApiError::InvalidHeader(e.to_string()))?;
    Ok(Json(SubmitResponse { accepted: true }))
}

async fn poll(
    State(state): State<AppState>,
    Path((chain_id, block_height)): Path<(u32, u64)>,
) -> Result<Json<MinedHeader>, ApiError> {
    match state.supervisor.poll((chain_id, block_height)) {
        Some(header) => Ok(Json(header)),
        None => Err(ApiError::NotFound),
    }
}

async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let buffer = state
        .metrics
        .lock()
        .unwrap()
        .gather()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        buffer,
    )
        .into_response())
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        hex::decode(&text).map_err(serde::de::Error::custom)
    }
}

enum ApiError {
    InvalidHeader(String),
    NotFound,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidHeader(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "job not ready".to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
