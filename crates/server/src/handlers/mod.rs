//! Handlers for server
//!
//! Every handler returns `core::Result`, so failures leave as the JSON
//! envelope `{ success: false, message }` with a non-2xx status.

pub mod accounts;
pub mod company;
pub mod form;
pub mod jobs;
pub mod user;

// Re-export AppState from core
pub use crate::core::AppState;
