//! Read models.
//!
//! Views and reports recomputed from a `Book` on every request:
//! - Contract, project and time entry listings
//! - Client summary
//! - Monthly, active-contract and time entry reports
//! - Dashboard overview

pub mod service;
pub mod types;


pub use service::ReportService;
pub use types::*;
