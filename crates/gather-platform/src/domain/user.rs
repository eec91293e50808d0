//! User Entity
//!
//! Account records: identity, profile fields, admin flag, and the two
//! reverse-reference lists (registered and favorite events). Both lists
//! are sets; inserts go through `$addToSet` so duplicates never land.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique email address
    pub email: String,

    /// Argon2id PHC hash. Never exposed through the API.
    pub password_hash: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub location: String,

    /// Relative path under the public directory, e.g. `uploads/...`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,

    #[serde(default)]
    pub is_admin: bool,

    /// Event IDs the user registered for (set semantics)
    #[serde(default)]
    pub registered_events: Vec<String>,

    /// Event IDs the user marked as favorites (set semantics)
    #[serde(default)]
    pub favorite_events: Vec<String>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            email: email.into(),
            password_hash: password_hash.into(),
            name: name.into(),
            phone: String::new(),
            location: String::new(),
            profile_image: None,
            is_admin: false,
            registered_events: Vec::new(),
            favorite_events: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Public URL for the stored profile image, if any.
    pub fn profile_image_url(&self) -> Option<String> {
        self.profile_image.as_ref().map(|p| format!("/{}", p))
    }
}

/// Validate a registration request body before creating the account.
pub fn validate_signup(email: &str, password: &str, name: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if email.trim().is_empty() || !email.contains('@') {
        errors.push("A valid email address is required".to_string());
    }
    if password.len() < 6 {
        errors.push("Password must be at least 6 characters long".to_string());
    }
    if name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_has_empty_reference_lists() {
        let user = User::new("a@example.com", "hash", "Alice");
        assert!(user.registered_events.is_empty());
        assert!(user.favorite_events.is_empty());
        assert!(!user.is_admin);
    }

    #[test]
    fn profile_image_url_prefixes_slash() {
        let mut user = User::new("a@example.com", "hash", "Alice");
        assert_eq!(user.profile_image_url(), None);
        user.profile_image = Some("uploads/123-456.png".to_string());
        assert_eq!(user.profile_image_url().as_deref(), Some("/uploads/123-456.png"));
    }

    #[test]
    fn signup_validation_collects_all_failures() {
        let errors = validate_signup("not-an-email", "123", "");
        assert_eq!(errors.len(), 3);
        assert!(validate_signup("a@example.com", "secret1", "Alice").is_empty());
    }
}
