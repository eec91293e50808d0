//! API Layer
//!
//! REST API endpoints: public auth/catalog routes and the admin API.

pub mod admin;
pub mod auth;
pub mod common;
pub mod events;
pub mod middleware;
pub mod openapi;

pub use common::*;
pub use middleware::{AdminOnly, AppState, AuthContext, Authenticated};

pub use admin::admin_router;
pub use auth::auth_router;
pub use events::events_router;
pub use openapi::ApiDoc;
