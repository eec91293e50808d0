//! Platform Integration Tests
//!
//! Tests for domain models, the registration preconditions, auth token
//! handling, and error mapping.

use chrono::{Duration, Utc};

use gather_platform::domain::{validate_signup, Event, EventCategory, RegistrationEntry, User};
use gather_platform::error::GatherError;
use gather_platform::service::AuthService;
use gather_platform::TsidGenerator;

fn future_event(capacity: i64) -> Event {
    Event::new(
        "Community Picnic",
        "An afternoon in the park with food and games.",
        EventCategory::Community,
        Utc::now() + Duration::days(3),
        "Riverside Park",
        capacity,
        0.0,
        TsidGenerator::generate(),
    )
}

// Unit tests for domain models
mod domain_tests {
    use super::*;

    #[test]
    fn test_signup_validation_accepts_well_formed_input() {
        assert!(validate_signup("ada@example.com", "hunter22", "Ada").is_empty());
    }

    #[test]
    fn test_signup_validation_collects_all_failures() {
        let errors = validate_signup("not-an-email", "short", " ");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_event_validation_rejects_short_title() {
        let mut event = future_event(10);
        event.title = "ab".to_string();
        let err = event.validate(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("Title must be between 3 and 100 characters"));
    }

    #[test]
    fn test_event_validation_rejects_past_date() {
        let mut event = future_event(10);
        event.date = Utc::now() - Duration::hours(1);
        assert!(event.validate(Utc::now()).is_err());
    }

    #[test]
    fn test_event_validation_joins_multiple_messages() {
        let mut event = future_event(10);
        event.title = "x".to_string();
        event.capacity = 0;
        let message = event.validate(Utc::now()).unwrap_err().to_string();
        assert!(message.contains(", "));
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Technology".parse::<EventCategory>().unwrap(), EventCategory::Technology);
        assert!("Knitting".parse::<EventCategory>().is_err());
    }

    #[test]
    fn test_user_profile_image_url() {
        let mut user = User::new("ada@example.com", "$argon2id$fake", "Ada");
        assert_eq!(user.profile_image_url(), None);
        user.profile_image = Some("profiles/123-456.png".to_string());
        assert_eq!(user.profile_image_url().as_deref(), Some("/profiles/123-456.png"));
    }

    #[test]
    fn test_user_defaults() {
        let user = User::new("ada@example.com", "$argon2id$fake", "Ada");
        assert!(!user.is_admin);
        assert!(user.registered_events.is_empty());
        assert!(user.favorite_events.is_empty());
        assert_eq!(user.id.len(), 13);
    }
}

// Registration precondition tests: first failure wins, in the order
// past date, capacity, duplicate.
mod registration_tests {
    use super::*;

    #[test]
    fn test_capacity_one_scenario() {
        let mut event = future_event(1);
        let user_a = TsidGenerator::generate();
        let user_b = TsidGenerator::generate();
        let now = Utc::now();

        event.check_registration(&user_a, now).unwrap();
        event.add_registration(&user_a, now);
        assert_eq!(event.registration_count(), 1);

        let err = event.check_registration(&user_b, now).unwrap_err();
        assert_eq!(err.to_string(), "Event is full");

        // A full event reports capacity before the duplicate check.
        let err = event.check_registration(&user_a, now).unwrap_err();
        assert_eq!(err.to_string(), "Event is full");
        assert_eq!(event.registration_count(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected_below_capacity() {
        let mut event = future_event(5);
        let user = TsidGenerator::generate();
        let now = Utc::now();

        event.check_registration(&user, now).unwrap();
        event.add_registration(&user, now);

        let err = event.check_registration(&user, now).unwrap_err();
        assert_eq!(err.to_string(), "Already registered for this event");
        assert_eq!(event.registration_count(), 1);
    }

    #[test]
    fn test_past_event_rejected_regardless_of_capacity() {
        let mut event = future_event(100);
        event.date = Utc::now() - Duration::days(1);

        let err = event
            .check_registration(&TsidGenerator::generate(), Utc::now())
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot register for past events");
    }

    #[test]
    fn test_legacy_entry_counts_toward_capacity_and_duplicates() {
        let mut event = future_event(2);
        let legacy_user = TsidGenerator::generate();
        event
            .registered_users
            .push(RegistrationEntry::LegacyRef(legacy_user.clone()));

        let err = event.check_registration(&legacy_user, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Already registered for this event");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut event = future_event(10);
        event
            .registered_users
            .push(RegistrationEntry::LegacyRef(TsidGenerator::generate()));
        event.add_registration(TsidGenerator::generate(), Utc::now());

        assert!(event.normalize_registrations(Utc::now()));
        let normalized = event.registered_users.clone();

        assert!(!event.normalize_registrations(Utc::now()));
        assert_eq!(event.registered_users, normalized);
        assert!(event
            .registered_users
            .iter()
            .all(|e| matches!(e, RegistrationEntry::Registration(_))));
    }
}

// Auth token tests
mod auth_tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let service = AuthService::new("test-secret", 3600);
        let user_id = TsidGenerator::generate();

        let token = service.generate_access_token(&user_id).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let issuing = AuthService::new("secret-a", 3600);
        let verifying = AuthService::new("secret-b", 3600);

        let token = issuing.generate_access_token("user1").unwrap();
        assert!(matches!(
            verifying.validate_token(&token),
            Err(GatherError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = AuthService::new("test-secret", -600);
        let token = service.generate_access_token("user1").unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(GatherError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = AuthService::new("test-secret", 3600);
        assert!(service.validate_token("not.a.jwt").is_err());
    }
}

// TSID tests
mod tsid_tests {
    use super::*;

    #[test]
    fn test_tsid_format() {
        let id = TsidGenerator::generate();
        assert_eq!(id.len(), 13);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tsid_uniqueness() {
        let ids: std::collections::HashSet<String> =
            (0..1000).map(|_| TsidGenerator::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }
}

// Error mapping tests
mod error_tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = GatherError::not_found("Event", "0123456789ABC");
        assert_eq!(err.to_string(), "Event not found");
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err = GatherError::validation("Capacity must be between 1 and 1000");
        assert_eq!(err.to_string(), "Capacity must be between 1 and 1000");
    }
}
