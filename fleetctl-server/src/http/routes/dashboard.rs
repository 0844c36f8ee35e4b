//! Admin dashboard endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};

use crate::db::{DashboardRepo, DashboardSummary};
use crate::http::envelope::{ApiResponse, ApiResult};
use crate::http::server::AppState;

/// GET /api/dashboard
async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<DashboardSummary> {
    let summary = DashboardRepo::new(&state.pool).summary().await?;
    Ok(ApiResponse::ok(summary))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard", get(dashboard))
}
