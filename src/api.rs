//! HTTP boundary for the presentation layer.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregate::{DegradedSource, EmptyState};
use crate::error::HubError;
use crate::hub::{ContentHub, ReloadStatus};
use crate::record::{DeleteOutcome, NormalizedRecord, SourceKey};

#[derive(Clone)]
pub struct AppState {
    hub: Arc<ContentHub>,
}

impl AppState {
    pub fn new(hub: Arc<ContentHub>) -> Self {
        Self { hub }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/content", get(content))
        .route("/content/reload", post(reload))
        .route("/content/{source}/{id}", delete(delete_item))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ContentOut {
    records: Vec<NormalizedRecord>,
    degraded: bool,
    degraded_sources: Vec<DegradedSource>,
    empty_state: EmptyState,
}

async fn content(State(state): State<AppState>) -> Json<ContentOut> {
    let snap = state.hub.snapshot();
    Json(ContentOut {
        degraded: snap.is_degraded(),
        degraded_sources: snap.degraded_sources().to_vec(),
        empty_state: snap.empty_state(),
        records: snap.records(),
    })
}

#[derive(serde::Serialize)]
struct ReloadOut {
    status: &'static str,
    records: usize,
    degraded: bool,
}

async fn reload(State(state): State<AppState>) -> (StatusCode, Json<ReloadOut>) {
    let result = state.hub.reload().await;
    let snap = state.hub.snapshot();
    let (code, status) = match result {
        Ok(ReloadStatus::Applied) => (StatusCode::OK, "applied"),
        Ok(ReloadStatus::Superseded) => (StatusCode::OK, "superseded"),
        Err(HubError::Unauthenticated) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        Err(e) => {
            tracing::warn!(error = %e, "reload failed");
            (StatusCode::SERVICE_UNAVAILABLE, "identity_unavailable")
        }
    };
    (
        code,
        Json(ReloadOut {
            status,
            records: snap.len(),
            degraded: snap.is_degraded(),
        }),
    )
}

#[derive(serde::Serialize)]
struct DeleteOut {
    outcome: DeleteOutcome,
    removed_from_view: bool,
}

async fn delete_item(
    State(state): State<AppState>,
    Path((source, id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<DeleteOut>), (StatusCode, String)> {
    let key: SourceKey = source
        .parse()
        .map_err(|e: crate::record::UnknownSourceKey| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let outcome = state.hub.request_delete(&id, key).await;
    let code = match outcome {
        DeleteOutcome::Deleted | DeleteOutcome::NotFound => StatusCode::OK,
        DeleteOutcome::Forbidden => StatusCode::FORBIDDEN,
        DeleteOutcome::TransientFailure => StatusCode::SERVICE_UNAVAILABLE,
    };
    Ok((
        code,
        Json(DeleteOut {
            outcome,
            removed_from_view: outcome.removes_from_view(),
        }),
    ))
}
