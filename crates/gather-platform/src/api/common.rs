//! Common API types and utilities

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::GatherError;

/// Standard API error response: `{"error": message}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn into_response(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Success response for operations without a payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Success response carrying a human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for GatherError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatherError::Validation { .. }
            | GatherError::Duplicate { .. }
            | GatherError::Conflict { .. }
            | GatherError::Json(_) => StatusCode::BAD_REQUEST,
            GatherError::Unauthorized { .. }
            | GatherError::InvalidToken { .. }
            | GatherError::TokenExpired
            | GatherError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GatherError::Forbidden { .. } => StatusCode::FORBIDDEN,
            GatherError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatherError::Database(_)
            | GatherError::Serialization(_)
            | GatherError::Deserialization(_)
            | GatherError::Configuration { .. }
            | GatherError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(self.to_string()).into_response(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_shape() {
        let body = serde_json::to_value(ApiError::new("Event is full")).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Event is full" }));
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (GatherError::conflict("Event is full"), StatusCode::BAD_REQUEST),
            (GatherError::validation("bad"), StatusCode::BAD_REQUEST),
            (GatherError::not_found("Event", "x"), StatusCode::NOT_FOUND),
            (GatherError::unauthorized("no token"), StatusCode::UNAUTHORIZED),
            (GatherError::forbidden("admins only"), StatusCode::FORBIDDEN),
            (GatherError::TokenExpired, StatusCode::UNAUTHORIZED),
            (GatherError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
