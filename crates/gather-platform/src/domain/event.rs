//! Event Entity
//!
//! Event catalog records with an embedded, ordered registration list.
//! Registration entries exist in two shapes: the current
//! (user, registrationDate) pair and a legacy bare user reference left
//! over from before the schema grew timestamps. `normalize_registrations`
//! coerces everything to the pair form and is idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GatherError, Result};

/// Fixed event category enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Technology,
    Business,
    Entertainment,
    Education,
    Sports,
    Food,
    Arts,
    Music,
    Networking,
    Health,
    Community,
    Charity,
}

impl EventCategory {
    pub const ALL: [EventCategory; 12] = [
        EventCategory::Technology,
        EventCategory::Business,
        EventCategory::Entertainment,
        EventCategory::Education,
        EventCategory::Sports,
        EventCategory::Food,
        EventCategory::Arts,
        EventCategory::Music,
        EventCategory::Networking,
        EventCategory::Health,
        EventCategory::Community,
        EventCategory::Charity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Technology => "Technology",
            EventCategory::Business => "Business",
            EventCategory::Entertainment => "Entertainment",
            EventCategory::Education => "Education",
            EventCategory::Sports => "Sports",
            EventCategory::Food => "Food",
            EventCategory::Arts => "Arts",
            EventCategory::Music => "Music",
            EventCategory::Networking => "Networking",
            EventCategory::Health => "Health",
            EventCategory::Community => "Community",
            EventCategory::Charity => "Charity",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = GatherError;

    fn from_str(s: &str) -> Result<Self> {
        EventCategory::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| GatherError::validation(format!("{} is not a supported category", s)))
    }
}

/// Payment status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Free,
    Paid,
    Pending,
}

/// A normalized registration: who and when.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// User TSID
    pub user: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub registration_date: DateTime<Utc>,
}

/// Registration list entry.
///
/// Untagged so legacy documents holding bare user IDs still
/// deserialize alongside the structured pair form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RegistrationEntry {
    Registration(Registration),
    LegacyRef(String),
}

impl RegistrationEntry {
    pub fn registration(user: impl Into<String>, registration_date: DateTime<Utc>) -> Self {
        Self::Registration(Registration {
            user: user.into(),
            registration_date,
        })
    }

    /// The referenced user ID, regardless of entry shape.
    pub fn user_id(&self) -> &str {
        match self {
            RegistrationEntry::Registration(r) => &r.user,
            RegistrationEntry::LegacyRef(id) => id,
        }
    }
}

/// Event catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,
    pub description: String,
    pub category: EventCategory,

    /// Relative path under the public directory, e.g. `uploads/...`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,

    pub location: String,
    pub capacity: i64,
    pub price: f64,

    #[serde(default)]
    pub is_free: bool,

    #[serde(default)]
    pub payment_status: PaymentStatus,

    /// Ordered registration list: insertion order = registration order.
    #[serde(default)]
    pub registered_users: Vec<RegistrationEntry>,

    /// Owning user TSID
    pub creator: String,

    #[serde(default)]
    pub is_admin_event: bool,
}

impl Event {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: EventCategory,
        date: DateTime<Utc>,
        location: impl Into<String>,
        capacity: i64,
        price: f64,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            title: title.into(),
            description: description.into(),
            category,
            image: None,
            date,
            location: location.into(),
            capacity,
            price,
            is_free: price == 0.0,
            payment_status: PaymentStatus::Free,
            registered_users: Vec::new(),
            creator: creator.into(),
            is_admin_event: false,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_admin_event(mut self, is_admin_event: bool) -> Self {
        self.is_admin_event = is_admin_event;
        self
    }

    /// Validate field constraints, collecting every failure.
    ///
    /// Failures are joined into a single message, matching the
    /// per-field-then-join error contract of the API.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        let mut errors = Vec::new();

        let title = self.title.trim().chars().count();
        if !(3..=100).contains(&title) {
            errors.push("Title must be between 3 and 100 characters".to_string());
        }
        let description = self.description.trim().chars().count();
        if !(10..=2000).contains(&description) {
            errors.push("Description must be between 10 and 2000 characters".to_string());
        }
        let location = self.location.trim().chars().count();
        if !(3..=200).contains(&location) {
            errors.push("Location must be between 3 and 200 characters".to_string());
        }
        if self.capacity < 1 || self.capacity > 1000 {
            errors.push("Capacity must be between 1 and 1000".to_string());
        }
        if self.price < 0.0 || self.price > 100_000.0 {
            errors.push("Price must be between 0 and 100,000".to_string());
        }
        if self.date <= now {
            errors.push("Event date must be in the future".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GatherError::validation(errors.join(", ")))
        }
    }

    /// Coerce legacy bare-reference entries into (user, timestamp) pairs.
    ///
    /// Timestamps for legacy entries default to `now`. Idempotent:
    /// running it against an already-normalized list changes nothing.
    /// Returns whether any entry was rewritten.
    pub fn normalize_registrations(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        for entry in &mut self.registered_users {
            if let RegistrationEntry::LegacyRef(user) = entry {
                *entry = RegistrationEntry::registration(std::mem::take(user), now);
                changed = true;
            }
        }
        changed
    }

    pub fn registration_count(&self) -> usize {
        self.registered_users.len()
    }

    pub fn is_registered(&self, user_id: &str) -> bool {
        self.registered_users.iter().any(|r| r.user_id() == user_id)
    }

    /// Evaluate the registration preconditions, first failure wins:
    /// past date, then capacity, then duplicate registration.
    ///
    /// Existence (404) is the caller's concern; everything here maps to
    /// a 400 conflict.
    pub fn check_registration(&self, user_id: &str, now: DateTime<Utc>) -> Result<()> {
        if self.date <= now {
            return Err(GatherError::conflict("Cannot register for past events"));
        }
        if self.registration_count() >= self.capacity as usize {
            return Err(GatherError::conflict("Event is full"));
        }
        if self.is_registered(user_id) {
            return Err(GatherError::conflict("Already registered for this event"));
        }
        Ok(())
    }

    /// Append a registration. Callers must have run `check_registration`.
    pub fn add_registration(&mut self, user_id: impl Into<String>, now: DateTime<Utc>) {
        self.registered_users
            .push(RegistrationEntry::registration(user_id, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn future_event(capacity: i64) -> Event {
        Event::new(
            "Rust Meetup",
            "An evening of systems programming talks.",
            EventCategory::Technology,
            Utc::now() + Duration::days(7),
            "Community Hall",
            capacity,
            0.0,
            "creator1",
        )
    }

    #[test]
    fn category_round_trip() {
        for cat in EventCategory::ALL {
            assert_eq!(cat.as_str().parse::<EventCategory>().unwrap(), cat);
        }
        let err = "Gaming".parse::<EventCategory>().unwrap_err();
        assert!(err.to_string().contains("not a supported category"));
    }

    #[test]
    fn validation_joins_all_messages() {
        let mut event = future_event(10);
        event.title = "ab".to_string();
        event.capacity = 0;
        let err = event.validate(Utc::now()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Title must be between 3 and 100 characters"));
        assert!(msg.contains("Capacity must be between 1 and 1000"));
    }

    #[test]
    fn validation_counts_characters_not_bytes() {
        // Two characters, four bytes in UTF-8.
        let mut event = future_event(10);
        event.title = "éé".to_string();
        let err = event.validate(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("Title must be between 3 and 100 characters"));

        // Three non-ASCII characters satisfy the minimum.
        event.title = "ééé".to_string();
        assert!(event.validate(Utc::now()).is_ok());
    }

    #[test]
    fn validation_rejects_past_date() {
        let mut event = future_event(10);
        event.date = Utc::now() - Duration::hours(1);
        assert!(event.validate(Utc::now()).is_err());
    }

    #[test]
    fn validation_accepts_well_formed_event() {
        assert!(future_event(10).validate(Utc::now()).is_ok());
    }

    #[test]
    fn normalization_converts_legacy_refs() {
        let mut event = future_event(10);
        let now = Utc::now();
        event.registered_users = vec![
            RegistrationEntry::LegacyRef("user1".to_string()),
            RegistrationEntry::registration("user2", now),
        ];

        assert!(event.normalize_registrations(now));
        assert_eq!(event.registration_count(), 2);
        assert!(event
            .registered_users
            .iter()
            .all(|r| matches!(r, RegistrationEntry::Registration(_))));
        // Order preserved
        assert_eq!(event.registered_users[0].user_id(), "user1");
        assert_eq!(event.registered_users[1].user_id(), "user2");
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut event = future_event(10);
        let now = Utc::now();
        event.registered_users = vec![RegistrationEntry::LegacyRef("user1".to_string())];

        assert!(event.normalize_registrations(now));
        let snapshot = event.registered_users.clone();
        assert!(!event.normalize_registrations(now));
        assert_eq!(event.registered_users, snapshot);
    }

    #[test]
    fn registration_rejects_past_event_regardless_of_capacity() {
        let mut event = future_event(100);
        event.date = Utc::now() - Duration::days(1);
        let err = event.check_registration("user1", Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot register for past events");
    }

    #[test]
    fn registration_rejects_when_full() {
        let mut event = future_event(1);
        let now = Utc::now();
        event.add_registration("user1", now);
        let err = event.check_registration("user2", now).unwrap_err();
        assert_eq!(err.to_string(), "Event is full");
    }

    #[test]
    fn registration_rejects_duplicate_user() {
        let mut event = future_event(5);
        let now = Utc::now();
        event.add_registration("user1", now);
        let err = event.check_registration("user1", now).unwrap_err();
        assert_eq!(err.to_string(), "Already registered for this event");
    }

    #[test]
    fn duplicate_detection_sees_legacy_entries() {
        let mut event = future_event(5);
        event.registered_users = vec![RegistrationEntry::LegacyRef("user1".to_string())];
        assert!(event.is_registered("user1"));
        assert!(event.check_registration("user1", Utc::now()).is_err());
    }

    #[test]
    fn precondition_order_past_beats_full() {
        // A past event that is also full reports the past-date conflict.
        let mut event = future_event(1);
        let now = Utc::now();
        event.add_registration("user1", now);
        event.date = now - Duration::days(1);
        let err = event.check_registration("user2", now).unwrap_err();
        assert_eq!(err.to_string(), "Cannot register for past events");
    }

    #[test]
    fn registration_entry_json_shapes() {
        let entry = RegistrationEntry::registration("user1", Utc::now());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("user").is_some());

        let legacy: RegistrationEntry = serde_json::from_value(serde_json::json!("user9")).unwrap();
        assert_eq!(legacy.user_id(), "user9");
    }

    #[test]
    fn free_flag_follows_price() {
        assert!(future_event(10).is_free);
        let paid = Event::new(
            "Gala",
            "A fancy dinner with a live band.",
            EventCategory::Music,
            Utc::now() + Duration::days(1),
            "Grand Hotel",
            50,
            120.0,
            "creator1",
        );
        assert!(!paid.is_free);
    }
}
