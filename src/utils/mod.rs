//! Utility functions and helpers
//!
//! This module contains utility functions used throughout the crate.

pub mod version;

pub use version::{DEFAULT_USER_AGENT, VERSION, get_version, user_agent};
