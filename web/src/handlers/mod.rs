//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by resource.

pub mod availability;
pub mod health;
pub mod reservations;
pub mod settings;

// Re-export common handler utilities
pub use health::health_check;
