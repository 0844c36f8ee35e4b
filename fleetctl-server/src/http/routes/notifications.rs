//! Notification endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, patch, post},
    Router,
};
use fleetctl_core::Paginated;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::page;
use crate::db::{Notification, NotificationFilter, NotificationRepo};
use crate::http::envelope::{ApiResponse, ApiResult};
use crate::http::extractors::{JsonBody, ValidQuery, ValidUuid};
use crate::http::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    pub user_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    /// Only unread notifications
    #[serde(default)]
    pub unread: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `PATCH /api/notifications/{id}` body; defaults to marking read
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default = "default_read")]
    pub read: bool,
}

fn default_read() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ReadAllQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadAllResponse {
    pub user_id: Uuid,
    pub updated: u64,
}

/// GET /api/notifications
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<ListNotificationsQuery>,
) -> ApiResult<Paginated<Notification>> {
    let filter = NotificationFilter {
        user_id: query.user_id,
        order_id: query.order_id,
        unread_only: query.unread,
    };
    let notifications = NotificationRepo::new(&state.pool)
        .list(filter, page(query.page, query.per_page))
        .await?;
    Ok(ApiResponse::ok(notifications))
}

/// PATCH /api/notifications/{id}
async fn mark_read(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<MarkReadRequest>,
) -> ApiResult<Notification> {
    let notification = NotificationRepo::new(&state.pool).set_read(id, req.read).await?;
    Ok(ApiResponse::ok(notification))
}

/// POST /api/notifications/read-all?user_id=
async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<ReadAllQuery>,
) -> ApiResult<ReadAllResponse> {
    let updated = NotificationRepo::new(&state.pool)
        .mark_all_read(query.user_id)
        .await?;
    tracing::debug!(user_id = %query.user_id, updated, "notifications marked read");

    Ok(ApiResponse::ok(ReadAllResponse {
        user_id: query.user_id,
        updated,
    }))
}

/// Notification routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/{id}", patch(mark_read))
}
