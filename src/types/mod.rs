//! Type definitions for the MediaWiki client
//!
//! This module contains the request envelope and the shared response shapes.

pub mod params;
pub mod response;
pub mod serde_helpers;

pub use params::{ParamOption, Params, continuation, flag, list, param};
pub use response::{
    ApiError, Continuation, CoreResponse, Envelope, TokensQuery, TokensResponse, Warnings,
};
pub use serde_helpers::WireBool;
