//! Success envelope: `{"success": true, "data": ...}`

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with `data`
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }

    /// 201 with `data`
    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok(data))
    }
}

/// Handler result for 200 responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Handler result for 201 responses
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;
