//! User endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use fleetctl_core::models::{optional_phone, Email, Name, UserRole};
use fleetctl_core::{Paginated, ValidationError};
use serde::Deserialize;
use serde_with::rust::double_option;

use super::{page, parse_filter};
use crate::db::{NewUser, User, UserChanges, UserRepo};
use crate::http::envelope::{ApiResponse, ApiResult, CreatedResult};
use crate::http::extractors::{JsonBody, ValidQuery, ValidUuid};
use crate::http::server::AppState;

/// Create user request
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Defaults to `client`
    pub role: Option<String>,
}

impl CreateUserRequest {
    fn validate(self) -> Result<NewUser, ValidationError> {
        Ok(NewUser {
            name: Name::new("name", &self.name)?,
            email: Email::new(&self.email)?,
            phone: optional_phone("phone", self.phone.as_deref())?,
            role: parse_filter(self.role.as_deref())?.unwrap_or(UserRole::Client),
        })
    }
}

/// Update user request; omitted fields are unchanged, `"phone": null` clears
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, with = "double_option")]
    pub phone: Option<Option<String>>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    fn validate(self) -> Result<UserChanges, ValidationError> {
        let changes = UserChanges {
            name: self.name.map(|n| Name::new("name", &n)).transpose()?,
            email: self.email.map(|e| Email::new(&e)).transpose()?,
            phone: self
                .phone
                .map(|p| optional_phone("phone", p.as_deref()))
                .transpose()?,
            role: parse_filter(self.role.as_deref())?,
        };

        if changes.is_empty() {
            return Err(ValidationError::Empty { field: "update" });
        }
        Ok(changes)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/users
async fn list_users(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<ListUsersQuery>,
) -> ApiResult<Paginated<User>> {
    let role = parse_filter(query.role.as_deref())?;
    let users = UserRepo::new(&state.pool)
        .list(role, page(query.page, query.per_page))
        .await?;
    Ok(ApiResponse::ok(users))
}

/// POST /api/users
async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> CreatedResult<User> {
    let user = UserRepo::new(&state.pool).create(req.validate()?).await?;
    Ok(ApiResponse::created(user))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> ApiResult<User> {
    Ok(ApiResponse::ok(UserRepo::new(&state.pool).get(id).await?))
}

/// PUT /api/users/{id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> ApiResult<User> {
    let user = UserRepo::new(&state.pool).update(id, req.validate()?).await?;
    Ok(ApiResponse::ok(user))
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> ApiResult<serde_json::Value> {
    UserRepo::new(&state.pool).delete(id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "id": id })))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}
