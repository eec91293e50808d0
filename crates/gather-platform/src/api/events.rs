//! Events API
//!
//! Public catalog endpoints plus the authenticated registration,
//! favorite, and owner-mutation routes.

use std::collections::HashMap;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::auth::field_text;
use crate::api::common::MessageResponse;
use crate::api::middleware::{AppState, AuthContext, Authenticated};
use crate::domain::{Event, EventCategory, PaymentStatus, RegistrationEntry};
use crate::error::{GatherError, Result};
use crate::repository::{UserRepository, UserSummary};
use crate::service::uploads::MAX_IMAGE_BYTES;

/// Resolved user reference in a response: either the raw ID or the
/// populated display fields.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(String),
    Populated(UserRefFields),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRefFields {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl From<&UserSummary> for UserRefFields {
    fn from(s: &UserSummary) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            email: s.email.clone(),
            phone: s.phone.clone(),
            profile_image: s.profile_image.clone(),
        }
    }
}

/// One registration in a response. Legacy bare-string entries have no
/// recorded date.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationUser {
    pub user: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
}

/// Event response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub date: String,
    pub location: String,
    pub capacity: i64,
    pub price: f64,
    pub is_free: bool,
    #[schema(value_type = String)]
    pub payment_status: PaymentStatus,
    #[schema(value_type = Vec<Object>)]
    pub registered_users: Vec<RegistrationUser>,
    #[schema(value_type = Object)]
    pub creator: UserRef,
    pub is_admin_event: bool,
}

impl EventResponse {
    /// Raw projection: all references left as IDs.
    pub fn from_event(event: &Event) -> Self {
        Self::build(event, &HashMap::new())
    }

    fn build(event: &Event, users: &HashMap<String, UserSummary>) -> Self {
        let creator = match users.get(&event.creator) {
            Some(summary) => UserRef::Populated(summary.into()),
            None => UserRef::Id(event.creator.clone()),
        };

        let registered_users = event
            .registered_users
            .iter()
            .map(|entry| {
                let user = match users.get(entry.user_id()) {
                    Some(summary) => UserRef::Populated(summary.into()),
                    None => UserRef::Id(entry.user_id().to_string()),
                };
                let registration_date = match entry {
                    RegistrationEntry::Registration(r) => Some(r.registration_date.to_rfc3339()),
                    RegistrationEntry::LegacyRef(_) => None,
                };
                RegistrationUser {
                    user,
                    registration_date,
                }
            })
            .collect();

        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            category: event.category.as_str().to_string(),
            image: event.image.clone(),
            date: event.date.to_rfc3339(),
            location: event.location.clone(),
            capacity: event.capacity,
            price: event.price,
            is_free: event.is_free,
            payment_status: event.payment_status,
            registered_users,
            creator,
            is_admin_event: event.is_admin_event,
        }
    }
}

/// Resolve creator (and optionally registrant) references for a batch
/// of events in one `$in` query per batch.
pub(crate) async fn populate_events(
    events: &[Event],
    users: &UserRepository,
    include_registrants: bool,
) -> Result<Vec<EventResponse>> {
    let mut ids: Vec<String> = Vec::new();
    for event in events {
        ids.push(event.creator.clone());
        if include_registrants {
            ids.extend(event.registered_users.iter().map(|r| r.user_id().to_string()));
        }
    }
    ids.sort();
    ids.dedup();

    let summaries = users.find_summaries(&ids).await?;
    let by_id: HashMap<String, UserSummary> =
        summaries.into_iter().map(|s| (s.id.clone(), s)).collect();

    Ok(events.iter().map(|e| EventResponse::build(e, &by_id)).collect())
}

pub(crate) async fn populate_event(
    event: &Event,
    users: &UserRepository,
) -> Result<EventResponse> {
    let mut responses = populate_events(std::slice::from_ref(event), users, true).await?;
    Ok(responses.remove(0))
}

/// Registration check response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCheckResponse {
    pub is_registered: bool,
}

/// Parsed multipart event form. Create requires every field; update
/// applies only what was sent.
#[derive(Default)]
pub(crate) struct EventForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<EventCategory>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub price: Option<f64>,
    pub image: Option<(String, Vec<u8>)>,
}

pub(crate) async fn parse_event_form(multipart: &mut Multipart) -> Result<EventForm> {
    let mut form = EventForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatherError::validation(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| GatherError::validation(format!("Invalid multipart payload: {}", e)))?;
                form.image = Some((filename, bytes.to_vec()));
            }
            "title" => form.title = Some(field_text(field).await?),
            "description" => form.description = Some(field_text(field).await?),
            "category" => form.category = Some(field_text(field).await?.parse()?),
            "date" => form.date = Some(parse_event_date(&field_text(field).await?)?),
            "location" => form.location = Some(field_text(field).await?),
            "capacity" => form.capacity = Some(parse_capacity(&field_text(field).await?)?),
            "price" => form.price = Some(parse_price(&field_text(field).await?)?),
            _ => {}
        }
    }

    Ok(form)
}

pub(crate) fn parse_event_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    // HTML datetime-local inputs arrive without an offset.
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(GatherError::validation("Invalid date format"))
}

pub(crate) fn parse_capacity(value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|c| (1..=1000).contains(c))
        .ok_or_else(|| GatherError::validation("Capacity must be between 1 and 1000"))
}

pub(crate) fn parse_price(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| (0.0..=100_000.0).contains(p))
        .ok_or_else(|| GatherError::validation("Price must be between 0 and 100,000"))
}

fn require<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| GatherError::validation(format!("Missing required field: {}", field)))
}

/// Build an event from a complete form, store the image if present,
/// and validate before returning.
pub(crate) async fn event_from_form(
    form: EventForm,
    creator: &AuthContext,
    is_admin_event: bool,
    state: &AppState,
) -> Result<Event> {
    let mut event = Event::new(
        require(form.title, "title")?,
        require(form.description, "description")?,
        require(form.category, "category")?,
        require(form.date, "date")?,
        require(form.location, "location")?,
        require(form.capacity, "capacity")?,
        require(form.price, "price")?,
        creator.user_id.clone(),
    )
    .with_admin_event(is_admin_event);

    event.validate(Utc::now())?;

    if let Some((filename, bytes)) = form.image {
        let stored = state.upload_service.store_event_image(&filename, &bytes).await?;
        event.image = Some(stored.relative_path);
    }

    Ok(event)
}

/// Apply an update form to an existing event, handling image
/// replacement (old file removed best-effort).
pub(crate) async fn apply_event_form(
    event: &mut Event,
    form: EventForm,
    state: &AppState,
) -> Result<()> {
    if let Some(title) = form.title {
        event.title = title;
    }
    if let Some(description) = form.description {
        event.description = description;
    }
    if let Some(category) = form.category {
        event.category = category;
    }
    if let Some(date) = form.date {
        event.date = date;
    }
    if let Some(location) = form.location {
        event.location = location;
    }
    if let Some(capacity) = form.capacity {
        event.capacity = capacity;
    }
    if let Some(price) = form.price {
        event.price = price;
        event.is_free = price == 0.0;
    }

    event.validate(Utc::now())?;

    if let Some((filename, bytes)) = form.image {
        if let Some(old) = event.image.take() {
            state.upload_service.delete_image(&old).await;
        }
        let stored = state.upload_service.store_event_image(&filename, &bytes).await?;
        event.image = Some(stored.relative_path);
    }

    Ok(())
}

/// List all events, date ascending, creator populated
#[utoipa::path(
    get,
    path = "/",
    tag = "events",
    responses(
        (status = 200, description = "All events, date ascending", body = Vec<EventResponse>)
    )
)]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventResponse>>> {
    let events = state.events.find_all_by_date().await?;
    let responses = populate_events(&events, &state.users, false).await?;
    Ok(Json(responses))
}

/// Get one event by ID, creator populated
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "events",
    responses(
        (status = 200, description = "Event detail", body = EventResponse),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
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

/// Create an event (authenticated)
#[utoipa::path(
    post,
    path = "/",
    tag = "events",
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<EventResponse>)> {
    let form = parse_event_form(&mut multipart).await?;
    let event = event_from_form(form, &ctx, false, &state).await?;
    state.events.insert(&event).await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from_event(&event))))
}

/// Update an event (creator or admin)
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "events",
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 403, description = "Not the creator or an admin"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<EventResponse>> {
    let mut event = state
        .events
        .find_by_id(&id)
        .await?
        .ok_or_else(|| GatherError::not_found("Event", &id))?;

    if event.creator != ctx.user_id && !ctx.is_admin {
        return Err(GatherError::forbidden("Not authorized"));
    }

    let form = parse_event_form(&mut multipart).await?;
    apply_event_form(&mut event, form, &state).await?;
    state.events.update(&event).await?;

    Ok(Json(EventResponse::from_event(&event)))
}

/// Delete an event (creator or admin)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "events",
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 403, description = "Not the creator or an admin"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let event = state
        .events
        .find_by_id(&id)
        .await?
        .ok_or_else(|| GatherError::not_found("Event", &id))?;

    if event.creator != ctx.user_id && !ctx.is_admin {
        return Err(GatherError::forbidden("Not authorized"));
    }

    if let Some(image) = &event.image {
        state.upload_service.delete_image(image).await;
    }
    state.events.delete(&id).await?;

    Ok(Json(MessageResponse::new("Event deleted")))
}

/// Register the authenticated user for an event
#[utoipa::path(
    post,
    path = "/{id}/register",
    tag = "events",
    responses(
        (status = 200, description = "Updated event with resolved references", body = EventResponse),
        (status = 400, description = "Past event, full event, or duplicate registration"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn register_for_event(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>> {
    let event = state.registration_service.register(&id, &ctx.user_id).await?;
    let response = populate_event(&event, &state.users).await?;
    Ok(Json(response))
}

/// Check whether the authenticated user is registered for an event
#[utoipa::path(
    get,
    path = "/{id}/register/check",
    tag = "events",
    responses(
        (status = 200, description = "Registration status", body = RegistrationCheckResponse),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn check_registration(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<RegistrationCheckResponse>> {
    let is_registered = state
        .registration_service
        .is_registered(&id, &ctx.user_id)
        .await?;
    Ok(Json(RegistrationCheckResponse { is_registered }))
}

/// List the authenticated user's favorite events
#[utoipa::path(
    get,
    path = "/favorites",
    tag = "favorites",
    responses(
        (status = 200, description = "Favorite events", body = Vec<EventResponse>)
    )
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> Result<Json<Vec<EventResponse>>> {
    let user = state
        .users
        .find_by_id(&ctx.user_id)
        .await?
        .ok_or_else(|| GatherError::not_found("User", &ctx.user_id))?;
    let events = state.events.find_by_ids(&user.favorite_events).await?;
    let responses = populate_events(&events, &state.users, false).await?;
    Ok(Json(responses))
}

/// Add an event to favorites (idempotent)
#[utoipa::path(
    post,
    path = "/favorites/{id}",
    tag = "favorites",
    responses(
        (status = 200, description = "Updated favorite list", body = Vec<EventResponse>),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventResponse>>> {
    // Adding requires the event to exist; removal does not.
    if state.events.find_by_id(&id).await?.is_none() {
        return Err(GatherError::not_found("Event", &id));
    }

    let matched = state.users.add_favorite(&ctx.user_id, &id).await?;
    if !matched {
        return Err(GatherError::not_found("User", &ctx.user_id));
    }

    favorites_of(&state, &ctx.user_id).await.map(Json)
}

/// Remove an event from favorites (idempotent; no-op on non-members)
#[utoipa::path(
    delete,
    path = "/favorites/{id}",
    tag = "favorites",
    responses(
        (status = 200, description = "Updated favorite list", body = Vec<EventResponse>)
    )
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventResponse>>> {
    let matched = state.users.remove_favorite(&ctx.user_id, &id).await?;
    if !matched {
        return Err(GatherError::not_found("User", &ctx.user_id));
    }
    favorites_of(&state, &ctx.user_id).await.map(Json)
}

async fn favorites_of(state: &AppState, user_id: &str) -> Result<Vec<EventResponse>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| GatherError::not_found("User", user_id))?;
    let events = state.events.find_by_ids(&user.favorite_events).await?;
    populate_events(&events, &state.users, false).await
}

/// List events created by the authenticated user
#[utoipa::path(
    get,
    path = "/user/created",
    tag = "events",
    responses(
        (status = 200, description = "Events created by the caller", body = Vec<EventResponse>)
    )
)]
pub async fn list_created(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> Result<Json<Vec<EventResponse>>> {
    let events = state.events.find_by_creator(&ctx.user_id).await?;
    let responses = populate_events(&events, &state.users, true).await?;
    Ok(Json(responses))
}

/// List events the authenticated user registered for
#[utoipa::path(
    get,
    path = "/user/registered",
    tag = "events",
    responses(
        (status = 200, description = "Events the caller registered for", body = Vec<EventResponse>)
    )
)]
pub async fn list_registered(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> Result<Json<Vec<EventResponse>>> {
    let user = state
        .users
        .find_by_id(&ctx.user_id)
        .await?
        .ok_or_else(|| GatherError::not_found("User", &ctx.user_id))?;
    let events = state.events.find_by_ids(&user.registered_events).await?;
    let responses = populate_events(&events, &state.users, false).await?;
    Ok(Json(responses))
}

/// Create the events router
pub fn events_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/favorites", get(list_favorites))
        .route("/favorites/:id", post(add_favorite).delete(remove_favorite))
        .route("/user/created", get(list_created))
        .route("/user/registered", get(list_registered))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
        .route("/:id/register", post(register_for_event))
        .route("/:id/register/check", get(check_registration))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1024 * 1024))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn date_parsing_accepts_common_forms() {
        assert!(parse_event_date("2030-06-01T18:00:00Z").is_ok());
        assert!(parse_event_date("2030-06-01T18:00:00+02:00").is_ok());
        assert!(parse_event_date("2030-06-01T18:00").is_ok());
        assert!(parse_event_date("June 1st").is_err());
    }

    #[test]
    fn capacity_and_price_bounds() {
        assert_eq!(parse_capacity("1").unwrap(), 1);
        assert_eq!(parse_capacity("1000").unwrap(), 1000);
        assert!(parse_capacity("0").is_err());
        assert!(parse_capacity("1001").is_err());
        assert!(parse_capacity("ten").is_err());

        assert_eq!(parse_price("0").unwrap(), 0.0);
        assert!(parse_price("-1").is_err());
        assert!(parse_price("100001").is_err());
    }

    #[test]
    fn raw_response_keeps_references_as_ids() {
        let mut event = Event::new(
            "Rust Meetup",
            "An evening of systems programming talks.",
            EventCategory::Technology,
            Utc::now() + Duration::days(7),
            "Community Hall",
            10,
            0.0,
            "creator1",
        );
        event.add_registration("user1", Utc::now());

        let response = EventResponse::from_event(&event);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["creator"], "creator1");
        assert_eq!(json["registeredUsers"][0]["user"], "user1");
        assert!(json["registeredUsers"][0]["registrationDate"].is_string());
    }

    #[test]
    fn populated_response_resolves_display_fields() {
        let mut event = Event::new(
            "Rust Meetup",
            "An evening of systems programming talks.",
            EventCategory::Technology,
            Utc::now() + Duration::days(7),
            "Community Hall",
            10,
            0.0,
            "creator1",
        );
        event.add_registration("user1", Utc::now());

        let mut users = HashMap::new();
        users.insert(
            "creator1".to_string(),
            UserSummary {
                id: "creator1".to_string(),
                name: "Carol".to_string(),
                email: "carol@example.com".to_string(),
                phone: None,
                profile_image: None,
            },
        );

        let response = EventResponse::build(&event, &users);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["creator"]["name"], "Carol");
        // Registrant was not in the map, stays an ID.
        assert_eq!(json["registeredUsers"][0]["user"], "user1");
    }
}
