//! API Middleware
//!
//! Authentication and admin-gate extractors for Axum.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::common::ApiError;
use crate::repository::{EventRepository, UserRepository};
use crate::service::{extract_bearer_token, AuthService, PasswordService, RegistrationService, UploadService};

/// Application state containing shared services and repositories.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub password_service: Arc<PasswordService>,
    pub registration_service: Arc<RegistrationService>,
    pub upload_service: Arc<UploadService>,
    pub users: Arc<UserRepository>,
    pub events: Arc<EventRepository>,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

/// Extractor for authenticated requests.
///
/// Validates the bearer token and loads the user record so handlers
/// see a resolved identity (including the admin flag).
pub struct Authenticated(pub AuthContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::new("Access denied").into_response(StatusCode::UNAUTHORIZED)
            })?;

        let token = extract_bearer_token(auth_header).ok_or_else(|| {
            ApiError::new("Access denied").into_response(StatusCode::UNAUTHORIZED)
        })?;

        let claims = state
            .auth_service
            .validate_token(token)
            .map_err(|e| e.into_response())?;

        let user = state
            .users
            .find_by_id(&claims.sub)
            .await
            .map_err(|e| e.into_response())?
            .ok_or_else(|| ApiError::new("Invalid token").into_response(StatusCode::UNAUTHORIZED))?;

        Ok(Authenticated(AuthContext {
            user_id: user.id,
            email: user.email,
            name: user.name,
            is_admin: user.is_admin,
        }))
    }
}

/// Extractor for admin-only requests: authenticated + admin flag set.
pub struct AdminOnly(pub AuthContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authenticated(ctx) = Authenticated::from_request_parts(parts, state).await?;
        if !ctx.is_admin {
            return Err(ApiError::new("Admin access required").into_response(StatusCode::FORBIDDEN));
        }
        Ok(AdminOnly(ctx))
    }
}
