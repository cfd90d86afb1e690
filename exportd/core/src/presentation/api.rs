// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP API for the volume host.
//!
//! Routes:
//! - `GET /` - plain-text usage message naming the base volume path
//! - `GET /volumes/{*name}` - provision a volume, return its descriptor
//! - `GET /health` - liveness probe with uptime
//!
//! The volume route is a tail-matched wildcard: a request like
//! `/volumes/a/b` reaches the handler with `a/b` as the name and is then
//! rejected by name validation, so multi-segment names fail loudly instead
//! of matching nothing.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::application::{ProvisionError, ProvisionService};

pub struct AppState {
    pub provisioner: Arc<dyn ProvisionService>,
    pub base_volume_path: PathBuf,
    pub start_time: Instant,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(usage))
        .route("/health", get(health))
        .route("/volumes/{*name}", get(provision_volume))
        .with_state(Arc::new(state))
}

async fn usage(State(state): State<Arc<AppState>>) -> String {
    format!(
        "exportd provisions NFS-backed volumes. GET /volumes/{{name}} to provision one; \
         volumes are created under {}.\n",
        state.base_volume_path.display()
    )
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn provision_volume(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");

    match state.provisioner.provision(&name, host).await {
        Ok(provisioned) => (StatusCode::OK, Json(provisioned.descriptor)).into_response(),
        Err(err) => {
            let status = match &err {
                ProvisionError::InvalidName(_) => StatusCode::BAD_REQUEST,
                ProvisionError::Directory { .. } | ProvisionError::Export { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}
