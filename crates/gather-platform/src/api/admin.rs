//! Admin API
//!
//! Every route requires an authenticated admin. Covers platform-wide
//! event management, user management with cascade delete, dashboard
//! counts, and the flattened registrations report.

use std::collections::HashMap;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::api::common::MessageResponse;
use crate::api::events::{
    apply_event_form, event_from_form, parse_event_form, populate_event, populate_events,
    EventResponse,
};
use crate::api::middleware::{AdminOnly, AppState};
use crate::domain::Event;
use crate::error::{GatherError, Result};
use crate::repository::{DashboardStats, RegistrationReportRow};
use crate::service::uploads::MAX_IMAGE_BYTES;

/// User row for the admin user list. Password hash never leaves the
/// repository layer; registered events carry title and date only.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub is_admin: bool,
    pub registered_events: Vec<RegisteredEventRef>,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredEventRef {
    pub id: String,
    pub title: String,
    pub date: String,
}

/// Whitelisted fields for an admin user update. Anything else in the
/// payload is ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub is_admin: Option<bool>,
}

/// List all events with creator and registered users populated
#[utoipa::path(
    get,
    path = "/events",
    tag = "admin",
    responses(
        (status = 200, description = "All events with resolved references", body = Vec<EventResponse>)
    )
)]
pub async fn admin_list_events(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
) -> Result<Json<Vec<EventResponse>>> {
    let events = state.events.find_all_by_date().await?;
    let responses = populate_events(&events, &state.users, true).await?;
    Ok(Json(responses))
}

/// Get one event with resolved references
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "admin",
    responses(
        (status = 200, description = "Event detail", body = EventResponse),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn admin_get_event(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>> {
    let event = state
        .events
        .find_by_id(&id)
        .await?
        .ok_or_else(|| GatherError::not_found("Event", &id))?;
    let response = populate_event(&event, &state.users).await?;
    Ok(Json(response))
}

/// Create a platform event
#[utoipa::path(
    post,
    path = "/events",
    tag = "admin",
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn admin_create_event(
    State(state): State<AppState>,
    AdminOnly(ctx): AdminOnly,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<EventResponse>)> {
    let form = parse_event_form(&mut multipart).await?;
    let event = event_from_form(form, &ctx, true, &state).await?;
    state.events.insert(&event).await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from_event(&event))))
}

/// Update any event
#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "admin",
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn admin_update_event(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<EventResponse>> {
    let mut event = state
        .events
        .find_by_id(&id)
        .await?
        .ok_or_else(|| GatherError::not_found("Event", &id))?;

    let form = parse_event_form(&mut multipart).await?;
    apply_event_form(&mut event, form, &state).await?;
    state.events.update(&event).await?;

    Ok(Json(EventResponse::from_event(&event)))
}

/// Delete any event
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "admin",
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn admin_delete_event(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let event = state
        .events
        .find_by_id(&id)
        .await?
        .ok_or_else(|| GatherError::not_found("Event", &id))?;

    if let Some(image) = &event.image {
        state.upload_service.delete_image(image).await;
    }
    state.events.delete(&id).await?;

    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

/// List all users with their registered events resolved
#[utoipa::path(
    get,
    path = "/users",
    tag = "admin",
    responses(
        (status = 200, description = "All users", body = Vec<AdminUserResponse>)
    )
)]
pub async fn admin_list_users(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
) -> Result<Json<Vec<AdminUserResponse>>> {
    let users = state.users.find_all().await?;

    let mut event_ids: Vec<String> = users
        .iter()
        .flat_map(|u| u.registered_events.iter().cloned())
        .collect();
    event_ids.sort();
    event_ids.dedup();

    let events = state.events.find_by_ids(&event_ids).await?;
    let by_id: HashMap<&str, &Event> = events.iter().map(|e| (e.id.as_str(), e)).collect();

    let responses = users
        .iter()
        .map(|user| {
            let registered_events = user
                .registered_events
                .iter()
                .filter_map(|id| by_id.get(id.as_str()))
                .map(|event| RegisteredEventRef {
                    id: event.id.clone(),
                    title: event.title.clone(),
                    date: event.date.to_rfc3339(),
                })
                .collect();
            AdminUserResponse {
                id: user.id.clone(),
                email: user.email.clone(),
                name: user.name.clone(),
                phone: user.phone.clone(),
                location: user.location.clone(),
                profile_image: user.profile_image_url(),
                is_admin: user.is_admin,
                registered_events,
                created_at: user.created_at.to_rfc3339(),
            }
        })
        .collect();

    Ok(Json(responses))
}

/// Update a user's whitelisted fields
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "admin",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn admin_update_user(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<MessageResponse>> {
    let mut user = state
        .users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| GatherError::not_found("User", &id))?;

    if let Some(name) = request.name {
        user.name = name;
    }
    if let Some(email) = request.email {
        let email = email.trim().to_lowercase();
        if email != user.email && state.users.exists_by_email(&email).await? {
            return Err(GatherError::duplicate("User", "email", &email));
        }
        user.email = email;
    }
    if let Some(phone) = request.phone {
        user.phone = phone;
    }
    if let Some(location) = request.location {
        user.location = location;
    }
    if let Some(is_admin) = request.is_admin {
        user.is_admin = is_admin;
    }

    state.users.update(&user).await?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// Delete a user and everything they own
///
/// Pulls the user out of every event's registration list, deletes the
/// events they created along with stored images, then the user record.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "admin",
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn admin_delete_user(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let user = state
        .users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| GatherError::not_found("User", &id))?;

    state.events.pull_user_registrations(&user.id).await?;

    let created = state.events.find_by_creator(&user.id).await?;
    for event in &created {
        if let Some(image) = &event.image {
            state.upload_service.delete_image(image).await;
        }
        state.events.delete(&event.id).await?;
    }

    if let Some(image) = &user.profile_image {
        state.upload_service.delete_image(image).await;
    }
    state.users.delete(&user.id).await?;

    info!(user_id = %user.id, deleted_events = created.len(), "user deleted by admin");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Dashboard counts
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "admin",
    responses(
        (status = 200, description = "Collection totals and upcoming/past split", body = DashboardStats)
    )
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
) -> Result<Json<DashboardStats>> {
    let total_users = state.users.count().await?;
    let stats = state.events.dashboard_stats(total_users, Utc::now()).await?;
    Ok(Json(stats))
}

/// Flattened registrations report
#[utoipa::path(
    get,
    path = "/registrations",
    tag = "admin",
    responses(
        (status = 200, description = "One row per (event, registered user)", body = Vec<RegistrationReportRow>)
    )
)]
pub async fn registrations_report(
    State(state): State<AppState>,
    AdminOnly(_ctx): AdminOnly,
) -> Result<Json<Vec<RegistrationReportRow>>> {
    let rows = state.events.registrations_report().await?;
    Ok(Json(rows))
}

/// Create the admin router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(admin_list_events).post(admin_create_event))
        .route(
            "/events/:id",
            get(admin_get_event)
                .put(admin_update_event)
                .delete(admin_delete_event),
        )
        .route("/users", get(admin_list_users))
        .route("/users/:id", put(admin_update_user).delete(admin_delete_user))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/registrations", get(registrations_report))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1024 * 1024))
}
