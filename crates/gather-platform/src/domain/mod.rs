//! Domain Models
//!
//! Core domain entities for the event-management platform.
//! All entities use TSID (Crockford Base32) string IDs.

pub mod event;
pub mod user;

pub use event::*;
pub use user::*;
