//! Shared types, errors, and configuration for Timebill.
//!
//! This crate provides common types used across all other crates:
//! - Typed integer IDs for type-safe entity references
//! - The `Clock` abstraction for timestamps
//! - Session wire types
//! - Application-wide error types
//! - Configuration management

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use auth::{LoginRequest, SessionToken};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::AppError;
