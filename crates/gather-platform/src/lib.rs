//! Gather Platform
//!
//! Core platform providing:
//! - User directory with token-based authentication
//! - Event catalog with capacity-bound registration
//! - Favorite tracking with idempotent set semantics
//! - Admin APIs with a cross-collection registrations report
//! - Disk-backed image upload storage

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;
pub mod tsid;

pub use config::AppConfig;
pub use error::GatherError;
pub use tsid::TsidGenerator;
