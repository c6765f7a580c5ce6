//! MediaWiki API client - Rust Implementation
//!
//! A typed client for the MediaWiki Action API (`api.php`) with an
//! authenticated session that keeps itself alive and caches action tokens.
//!
//! # Architecture
//!
//! The crate is organised in two layers:
//! - **Request/Response Pipeline** ([`api`]): one HTTP exchange per call,
//!   returning the decoded envelope together with the raw JSON text
//! - **Session Manager** ([`session`]): cookie jar, token cache, login and
//!   transparent re-login when the session cookie expires
//!
//! Per-action builders in [`actions`] run on top of both.
//!
//! # Usage
//!
//! ```bash
//! MEDIAWIKI_URL=https://wiki.example.org/w/api.php mwclient token csrf
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use mediawiki_client::{Credentials, LoginMode, SessionManager, Settings};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::for_endpoint("https://wiki.example.org/w/api.php");
//! let session = SessionManager::new(settings)?;
//! session
//!     .login(Credentials::new("Example@bot", "bot-password"), LoginMode::Bot)
//!     .await?;
//!
//! let page = session.revisions().titles(["Main Page"]).prop(["content"]).send().await?;
//! println!("{:?}", page.content("Main Page"));
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod types;
pub mod utils;

pub use api::{ApiResponse, Method};
pub use config::Settings;
pub use error::{Error, Result};
pub use session::{Credentials, LoginMode, SessionManager, SessionState, TokenKind};
pub use types::Params;
