//! Registration Workflow
//!
//! The one multi-step stateful operation in the system. Preconditions
//! are evaluated in a fixed order (first failure wins): event exists,
//! legacy entries normalized, date still in the future, capacity not
//! reached, user not already registered. On success the event document
//! is persisted and the event ID is set-inserted into the user's
//! `registeredEvents`.
//!
//! The two writes are independent; there is no cross-document
//! transaction. A crash between them leaves the event updated with the
//! user's reverse reference missing, and concurrent registrations near
//! full capacity can both pass the capacity check before either write
//! commits. Both are accepted behavior at this system's scale.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::Event;
use crate::error::{GatherError, Result};
use crate::repository::{EventRepository, UserRepository};

pub struct RegistrationService {
    events: Arc<EventRepository>,
    users: Arc<UserRepository>,
}

impl RegistrationService {
    pub fn new(events: Arc<EventRepository>, users: Arc<UserRepository>) -> Self {
        Self { events, users }
    }

    /// Register `user_id` for `event_id`, returning the updated event.
    pub async fn register(&self, event_id: &str, user_id: &str) -> Result<Event> {
        let mut event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| GatherError::not_found("Event", event_id))?;

        let now = Utc::now();

        // Legacy records predate the (user, timestamp) pair shape;
        // rewrite them before any checks so counts and duplicate
        // detection see one shape.
        if event.normalize_registrations(now) {
            debug!(event_id, "normalized legacy registration entries");
            self.events.update(&event).await?;
        }

        event.check_registration(user_id, now)?;

        event.add_registration(user_id, now);
        self.events.update(&event).await?;

        // Second, independent write. Idempotent via $addToSet.
        self.users.add_registered_event(user_id, event_id).await?;

        info!(
            event_id,
            user_id,
            registered = event.registration_count(),
            capacity = event.capacity,
            "user registered for event"
        );
        Ok(event)
    }

    /// Whether the user currently appears in the event's registration list.
    pub async fn is_registered(&self, event_id: &str, user_id: &str) -> Result<bool> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| GatherError::not_found("Event", event_id))?;
        Ok(event.is_registered(user_id))
    }
}
