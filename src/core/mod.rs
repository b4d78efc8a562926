//! Core types for prefetch
//!
//! Error handling shared by every other module: the [`PrefetchError`] taxonomy,
//! the [`ErrorContext`] wrapper used for CLI display, and the
//! [`user_friendly_error`] conversion the binary applies before exiting.

pub mod error;

pub use error::{ErrorContext, PrefetchError, user_friendly_error};
