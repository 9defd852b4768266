//! Middleware and request guards.

pub mod auth;

pub use auth::CurrentUser;
