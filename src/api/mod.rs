//! HTTP plumbing for the Action API
//!
//! One call in, one decoded envelope out. Session concerns live in
//! [`crate::session`].

pub mod pipeline;

pub use pipeline::{ApiResponse, FilePart, Method, Outcome, Transport, classify, decode};
