//! Repository Layer
//!
//! MongoDB repositories for the domain entities.

pub mod event;
pub mod indexes;
pub mod user;

pub use event::{DashboardStats, EventRepository, RegistrationReportRow};
pub use indexes::ensure_indexes;
pub use user::{UserRepository, UserSummary};
