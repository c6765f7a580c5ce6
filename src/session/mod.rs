//! Session management for the MediaWiki Action API
//!
//! This module handles the authenticated session: the login flows, the
//! per-session token cache, and the keep-alive logic that transparently
//! re-establishes an expired session.

pub mod login;
pub mod manager;
pub mod tokens;

pub use login::{
    BOT_LOGIN_SUCCESS, BotLoginResult, CLIENT_LOGIN_PASS, ClientLoginResult, Credentials,
    LoginMode, LoginResponse,
};
pub use manager::{SessionManager, SessionState};
pub use tokens::{TokenCache, TokenKind};
