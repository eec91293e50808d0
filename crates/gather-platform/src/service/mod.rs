//! Service Layer
//!
//! Business logic services: authentication, password hashing, the
//! event-registration workflow, and upload storage.

pub mod auth;
pub mod password;
pub mod registration;
pub mod uploads;

pub use auth::{extract_bearer_token, AccessTokenClaims, AuthService};
pub use password::PasswordService;
pub use registration::RegistrationService;
pub use uploads::{StoredImage, UploadService};
