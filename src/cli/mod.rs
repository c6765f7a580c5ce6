//! Command-line interface logic
//!
//! Shared by the `mwclient` binary and its tests.

pub mod client;

pub use client::{Cli, Command, execute, init_logging, load_settings, run};
