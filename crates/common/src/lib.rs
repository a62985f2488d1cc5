//! CampusRate Common Library
//!
//! Shared code for the CampusRate backend including:
//! - Database models, the Postgres repository and the in-memory store
//! - Rating aggregation and the review, vote and search services
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod rating;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use auth::{AuthContext, JwtManager};
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use rating::{ReviewableRef, ReviewableType};
pub use store::{create_store, MemoryStore, Store};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
