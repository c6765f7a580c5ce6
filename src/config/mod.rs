//! Configuration management for the client
//!
//! This module handles loading and managing configuration settings
//! for both library consumers and the `mwclient` binary.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{ApiSettings, LoggingSettings, SessionSettings, Settings};
