//! OpenAPI Documentation
//!
//! Central OpenAPI specification for the platform APIs.

use utoipa::OpenApi;

/// Platform API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gather Platform API",
        version = "1.0.0",
        description = "REST APIs for accounts, events, registrations, and administration"
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Accounts and authentication"),
        (name = "events", description = "Event catalog and registration"),
        (name = "favorites", description = "Favorite events"),
        (name = "admin", description = "Administration")
    ),
    paths(
        // Auth API
        super::auth::register,
        super::auth::login,
        super::auth::update_profile,
        super::auth::current_user,
        // Events API
        super::events::list_events,
        super::events::get_event,
        super::events::create_event,
        super::events::update_event,
        super::events::delete_event,
        super::events::register_for_event,
        super::events::check_registration,
        super::events::list_favorites,
        super::events::add_favorite,
        super::events::remove_favorite,
        super::events::list_created,
        super::events::list_registered,
        // Admin API
        super::admin::admin_list_events,
        super::admin::admin_get_event,
        super::admin::admin_create_event,
        super::admin::admin_update_event,
        super::admin::admin_delete_event,
        super::admin::admin_list_users,
        super::admin::admin_update_user,
        super::admin::admin_delete_user,
        super::admin::dashboard_stats,
        super::admin::registrations_report,
    ),
    components(
        schemas(
            // Auth schemas
            super::auth::RegisterRequest,
            super::auth::LoginRequest,
            super::auth::LoginResponse,
            super::auth::UserResponse,
            super::auth::ProfileResponse,
            // Event schemas
            super::events::EventResponse,
            super::events::RegistrationCheckResponse,
            // Admin schemas
            super::admin::AdminUserResponse,
            super::admin::RegisteredEventRef,
            super::admin::UpdateUserRequest,
            crate::repository::DashboardStats,
            crate::repository::RegistrationReportRow,
            // Common schemas
            super::common::SuccessResponse,
            super::common::MessageResponse,
            super::common::ApiError,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_includes_every_router() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/"));
        assert!(paths.contains_key("/login"));
        assert!(paths.contains_key("/{id}/register"));
        assert!(paths.contains_key("/users/{id}"));
        assert!(paths.contains_key("/dashboard/stats"));
    }
}
