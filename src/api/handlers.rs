//! Read-only service endpoints
//!
//! Health, pool statistics and per-address analytics. These never sign
//! anything; chain failures degrade to zeroed statistics instead of errors.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use super::error::{RelayerError, RelayerResult};
use super::state::AppState;
use super::types::{ExportQuery, HealthResponse};
use crate::analytics::{export_user_data, fetch_pool_stats, fetch_user_analytics, PoolStats, UserAnalytics};
use crate::validation::is_account_address;

pub const SERVICE_NAME: &str = "flowshield-relayer";

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: state.network.to_string(),
        relayer_configured: state.has_relayer(),
        timestamp: Utc::now().timestamp(),
    })
}

pub async fn pool_stats(State(state): State<Arc<AppState>>) -> Json<PoolStats> {
    Json(fetch_pool_stats(state.reader.as_ref(), &state.pool).await)
}

pub async fn user_analytics(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> RelayerResult<Json<UserAnalytics>> {
    if !is_account_address(&address) {
        return Err(RelayerError::InvalidAddress);
    }
    let analytics =
        fetch_user_analytics(state.reader.as_ref(), &state.pool, &address, Utc::now()).await;
    Ok(Json(analytics))
}

/// Pretty-printed export, private sections hidden unless requested
pub async fn export_analytics(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(query): Query<ExportQuery>,
) -> RelayerResult<Response> {
    if !is_account_address(&address) {
        return Err(RelayerError::InvalidAddress);
    }
    let now = Utc::now();
    let analytics = fetch_user_analytics(state.reader.as_ref(), &state.pool, &address, now).await;
    let body = export_user_data(&analytics, query.include_private, now).map_err(|e| {
        log::error!("Failed to serialize export for {}: {}", address, e);
        RelayerError::Export
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

pub async fn method_not_allowed() -> RelayerError {
    RelayerError::MethodNotAllowed
}
