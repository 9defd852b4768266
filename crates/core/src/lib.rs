//! Core business logic for timebill.
//!
//! This crate contains pure business logic with no web or storage
//! dependencies. All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Clients, contracts, projects, time entries, payments, categories
//! - `reports` - Read models recomputed from the ledger
//! - `auth` - Users, roles, passwords, sessions

pub mod auth;
pub mod ledger;
pub mod reports;
