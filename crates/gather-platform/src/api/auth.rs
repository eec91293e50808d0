//! Auth API Endpoints
//!
//! Account registration, login, profile management.
//! - POST /register - Create an account
//! - POST /login - Password-based login, returns an access token
//! - PUT /profile - Update profile fields and photo (multipart)
//! - GET /user/me - Current user info

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::middleware::{AppState, Authenticated};
use crate::api::common::SuccessResponse;
use crate::domain::{validate_signup, User};
use crate::error::{GatherError, Result};

/// Account registration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: access token plus a user projection
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// User projection returned by auth endpoints. Never carries the
/// password hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub location: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            location: user.location.clone(),
            is_admin: user.is_admin,
            profile_image: user.profile_image_url(),
        }
    }
}

/// Profile update response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = SuccessResponse),
        (status = 400, description = "Validation failure or duplicate email")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<SuccessResponse>> {
    let errors = validate_signup(&req.email, &req.password, &req.name);
    if !errors.is_empty() {
        return Err(GatherError::validation(errors.join(", ")));
    }

    if state.users.exists_by_email(&req.email).await? {
        return Err(GatherError::duplicate("User", "email", &req.email));
    }

    let password_hash = state.password_service.hash_password(&req.password)?;
    let user = User::new(req.email.trim().to_lowercase(), password_hash, req.name.trim());
    state.users.insert(&user).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Unknown user or wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = state
        .users
        .find_by_email(&req.email.trim().to_lowercase())
        .await?
        .ok_or_else(|| GatherError::validation("User not found"))?;

    let valid = state
        .password_service
        .verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(GatherError::validation("Invalid password"));
    }

    let token = state.auth_service.generate_access_token(&user.id)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Update profile fields and photo
///
/// Multipart form with optional `name`, `phone`, `location` text fields
/// and an optional `profileImage` file. A replaced photo's previous
/// file is removed best-effort.
#[utoipa::path(
    put,
    path = "/profile",
    tag = "auth",
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    mut multipart: Multipart,
) -> Result<Json<ProfileResponse>> {
    let mut user = state
        .users
        .find_by_id(&ctx.user_id)
        .await?
        .ok_or_else(|| GatherError::not_found("User", &ctx.user_id))?;

    let mut new_image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatherError::validation(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "profileImage" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| GatherError::validation(format!("Invalid multipart payload: {}", e)))?;
                new_image = Some((filename, bytes.to_vec()));
            }
            "name" => user.name = field_text(field).await?,
            "phone" => user.phone = field_text(field).await?,
            "location" => user.location = field_text(field).await?,
            _ => {}
        }
    }

    if let Some((filename, bytes)) = new_image {
        if let Some(old) = user.profile_image.take() {
            state.upload_service.delete_image(&old).await;
        }
        let stored = state.upload_service.store_profile_image(&filename, &bytes).await?;
        user.profile_image = Some(stored.relative_path);
    }

    state.users.update(&user).await?;

    Ok(Json(ProfileResponse {
        user: UserResponse::from(&user),
    }))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/user/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user info", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .find_by_id(&ctx.user_id)
        .await?
        .ok_or_else(|| GatherError::not_found("User", &ctx.user_id))?;
    Ok(Json(UserResponse::from(&user)))
}

pub(crate) async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| GatherError::validation(format!("Invalid multipart payload: {}", e)))
}

/// Create the auth router
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", put(update_profile))
        .route("/user/me", get(current_user))
        .layer(DefaultBodyLimit::max(crate::service::uploads::MAX_IMAGE_BYTES + 1024 * 1024))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_deserialization() {
        let json = r#"{"email":"test@example.com","password":"secret1","name":"Test"}"#;
        let req: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.email, "test@example.com");
        assert_eq!(req.name, "Test");
    }

    #[test]
    fn user_response_hides_password_hash() {
        let user = User::new("a@example.com", "supersecret-hash", "Alice");
        let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
        assert!(!json.contains("supersecret-hash"));
        assert!(json.contains("isAdmin"));
    }

    #[test]
    fn login_response_serialization() {
        let user = User::new("a@example.com", "hash", "Alice");
        let response = LoginResponse {
            token: "token123".to_string(),
            user: UserResponse::from(&user),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "token123");
        assert_eq!(json["user"]["email"], "a@example.com");
    }
}
