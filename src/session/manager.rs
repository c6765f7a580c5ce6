//! # Session Management Module
//!
//! The [`SessionManager`] owns everything that is shared between concurrent
//! calls against one wiki: the HTTP transport and its cookie jar, the token
//! cache, the stored login, and the keep-alive state machine.
//!
//! ## Keep-alive
//!
//! A logged-in session is considered alive while the cookie jar holds a
//! cookie whose name ends in `_session`. When that cookie disappears,
//! [`SessionManager::ensure_alive`] rebuilds the transport with an empty jar,
//! clears the token cache and replays the stored login. Re-initialization
//! happens under a per-session mutex; callers queued behind it re-check the
//! cookie and return without a second login.
//!
//! ```text
//! Unauthenticated --login--> Alive --cookie gone--> Reinitializing --ok--> Alive
//!                                                         |
//!                                                         +--failed--> Dead (cooldown)
//! ```
//!
//! ## Examples
//!
//! ```rust,no_run
//! use mediawiki_client::{Settings, SessionManager};
//! use mediawiki_client::session::{Credentials, LoginMode, TokenKind};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::for_endpoint("https://wiki.example.org/w/api.php");
//! let session = SessionManager::new(settings)?;
//!
//! session
//!     .login(Credentials::new("Example@bot", "bot-password"), LoginMode::Bot)
//!     .await?;
//!
//! session.ensure_alive().await?;
//! let csrf = session.get_token(TokenKind::Csrf).await?;
//! println!("CSRF token: {}", csrf);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

use crate::{
    Error, Result,
    api::{ApiResponse, FilePart, Method, Transport},
    config::Settings,
    types::{Params, TokensResponse},
    utils::user_agent,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::{Credentials, LoginMode, LoginResponse, TokenCache, TokenKind};

/// Observable keep-alive state of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Never logged in, or a re-login was cancelled part-way
    Unauthenticated,
    /// Logged in; the session cookie was present at last check
    Alive,
    /// A re-login is in progress
    Reinitializing,
    /// The last re-login failed
    Dead {
        since: DateTime<Utc>,
        reason: String,
    },
}

/// Login stored for keep-alive replay
#[derive(Debug, Clone)]
struct StoredLogin {
    credentials: Credentials,
    mode: LoginMode,
    logged_in_at: DateTime<Utc>,
}

/// Authenticated connection to one API endpoint
#[derive(Debug)]
pub struct SessionManager {
    /// Configuration settings
    settings: Arc<Settings>,
    /// Current transport; swapped wholesale on re-initialization
    transport: RwLock<Transport>,
    /// Bumped whenever the token cache is invalidated wholesale
    epoch: AtomicU64,
    /// Action tokens for the current server-side session
    tokens: TokenCache,
    /// Credentials and mode of the last successful login
    stored_login: RwLock<Option<StoredLogin>>,
    state: RwLock<SessionState>,
    /// Serializes logins and re-initializations
    reinit: Mutex<()>,
    /// Parent of every per-call cancellation token
    shutdown: CancellationToken,
}

impl SessionManager {
    /// Creates a new anonymous session for the configured endpoint.
    ///
    /// The cookie jar and token cache start empty and no network call is
    /// made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unparsable endpoint and
    /// [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new(settings: Settings) -> Result<Self> {
        let endpoint = settings.endpoint_url()?;
        let transport = Transport::new(
            endpoint,
            user_agent(settings.api.user_agent.as_deref()),
            settings.timeout(),
        )?;

        Ok(Self {
            settings: Arc::new(settings),
            transport: RwLock::new(transport),
            epoch: AtomicU64::new(0),
            tokens: TokenCache::new(),
            stored_login: RwLock::new(None),
            state: RwLock::new(SessionState::Unauthenticated),
            reinit: Mutex::new(()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// API endpoint this session talks to
    pub async fn endpoint(&self) -> Url {
        self.transport.read().await.endpoint().clone()
    }

    /// User-Agent sent with every request
    pub async fn user_agent(&self) -> String {
        self.transport.read().await.user_agent().to_string()
    }

    /// Snapshot of the current transport
    pub async fn transport(&self) -> Transport {
        self.transport.read().await.clone()
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Counter of wholesale token invalidations
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Whether credentials are stored for keep-alive
    pub async fn is_logged_in(&self) -> bool {
        self.stored_login.read().await.is_some()
    }

    /// Username of the stored login
    pub async fn username(&self) -> Option<String> {
        self.stored_login
            .read()
            .await
            .as_ref()
            .map(|stored| stored.credentials.username().to_string())
    }

    /// Time of the last successful login or re-login
    pub async fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        self.stored_login
            .read()
            .await
            .as_ref()
            .map(|stored| stored.logged_in_at)
    }

    /// Token cancelled by [`SessionManager::shutdown`]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Cancel every call in flight on this session
    pub fn shutdown(&self) {
        info!("Shutting down session, cancelling in-flight requests");
        self.shutdown.cancel();
    }

    /// Whether the jar holds the session marker cookie
    pub async fn has_session_cookie(&self) -> bool {
        self.transport
            .read()
            .await
            .has_cookie_with_suffix(&self.settings.session.session_cookie_suffix)
    }

    /// Drop the session cookie, as the server does when a session expires.
    /// Returns the number of cookies removed.
    pub async fn expire_session_cookie(&self) -> usize {
        self.transport
            .read()
            .await
            .expire_cookies_with_suffix(&self.settings.session.session_cookie_suffix)
    }

    /// Make sure the session is usable before a dependent call.
    ///
    /// Anonymous sessions are never kept alive and return immediately. For a
    /// logged-in session the cookie check is local; only a missing cookie
    /// leads to network traffic.
    pub async fn ensure_alive(&self) -> Result<()> {
        let cancel = self.cancellation_token();
        self.ensure_alive_with(&cancel).await
    }

    /// [`SessionManager::ensure_alive`] with a caller-supplied cancellation token
    pub async fn ensure_alive_with(&self, cancel: &CancellationToken) -> Result<()> {
        if !self.is_logged_in().await || self.has_session_cookie().await {
            return Ok(());
        }

        let _guard = self.reinit.lock().await;

        if self.has_session_cookie().await {
            debug!("Session was re-initialized while waiting");
            return Ok(());
        }

        self.check_cooldown().await?;

        let Some(stored) = self.stored_login.read().await.clone() else {
            return Ok(());
        };

        info!(
            "Session cookie missing, re-initializing session for {}",
            stored.credentials.username()
        );
        self.reinitialize_locked(&stored, cancel).await
    }

    /// Token of `kind`, from the cache or fetched once and cached.
    ///
    /// Call [`SessionManager::ensure_alive`] first.
    pub async fn get_token(&self, kind: TokenKind) -> Result<String> {
        let cancel = self.cancellation_token();
        self.get_token_with(kind, &cancel).await
    }

    /// [`SessionManager::get_token`] with a caller-supplied cancellation token
    pub async fn get_token_with(&self, kind: TokenKind, cancel: &CancellationToken) -> Result<String> {
        loop {
            if let Some(token) = self.tokens.get(kind).await {
                return Ok(token);
            }

            let _flight = self.tokens.flight(kind).await;
            if let Some(token) = self.tokens.get(kind).await {
                return Ok(token);
            }

            // Read before the transport so a swap in between shows up as a
            // changed epoch below.
            let epoch = self.epoch();
            debug!("Fetching {} token", kind);
            let params = Params::action("query")
                .with("meta", "tokens")
                .with("type", kind.as_str());
            let response = self
                .transport()
                .await
                .send::<TokensResponse>(Method::Get, params, cancel)
                .await?
                .into_result()?;

            let token = match response.token(kind.as_str()) {
                Some(token) => token.to_string(),
                None => return Err(Error::unexpected("query+tokens", response.raw)),
            };

            let mut entries = self.tokens.lock().await;
            if self.epoch() != epoch {
                debug!("Discarding {} token issued to a replaced session", kind);
                continue;
            }
            entries.insert(kind, token.clone());
            return Ok(token);
        }
    }

    /// Log in and store the credentials for keep-alive.
    ///
    /// Nothing is stored when the server refuses the login.
    ///
    /// # Errors
    ///
    /// [`Error::Login`] carries the server's status and message for a
    /// refused login; transport, decode and API errors pass through.
    pub async fn login(
        &self,
        credentials: Credentials,
        mode: LoginMode,
    ) -> Result<ApiResponse<LoginResponse>> {
        let cancel = self.cancellation_token();
        self.login_with(credentials, mode, &cancel).await
    }

    /// [`SessionManager::login`] with a caller-supplied cancellation token
    pub async fn login_with(
        &self,
        credentials: Credentials,
        mode: LoginMode,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<LoginResponse>> {
        let _guard = self.reinit.lock().await;

        let response = self.perform_login(&credentials, mode, cancel).await?;

        info!("Logged in as {} ({} login)", credentials.username(), mode);
        *self.stored_login.write().await = Some(StoredLogin {
            credentials,
            mode,
            logged_in_at: Utc::now(),
        });
        *self.state.write().await = SessionState::Alive;

        Ok(response)
    }

    /// Recover from a token or login rejection seen at `observed_epoch`.
    ///
    /// Clears the token cache and, for a logged-in session, re-initializes
    /// and logs in again. If another call already recovered since
    /// `observed_epoch`, this returns without doing anything. A session whose
    /// last re-login failed stays in its cooldown.
    pub async fn recover(&self, observed_epoch: u64, cancel: &CancellationToken) -> Result<()> {
        let _guard = self.reinit.lock().await;

        if self.epoch() != observed_epoch {
            debug!("Session already recovered by a concurrent call");
            return Ok(());
        }

        let stored = self.stored_login.read().await.clone();
        match stored {
            Some(stored) => {
                self.check_cooldown().await?;
                info!("Server rejected session state, logging in again");
                self.reinitialize_locked(&stored, cancel).await
            }
            None => {
                self.invalidate_tokens().await;
                Ok(())
            }
        }
    }

    /// Drop every cached token
    pub async fn invalidate_tokens(&self) {
        let mut entries = self.tokens.lock().await;
        entries.clear();
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Send `params` over the current transport
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        params: Params,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>> {
        self.transport().await.send(method, params, cancel).await
    }

    /// Send `params` and `file` as multipart over the current transport
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        params: Params,
        file: FilePart,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>> {
        self.transport().await.send_multipart(params, file, cancel).await
    }

    // Private helper methods...

    /// Refuse a re-login while the last one failed less than the configured
    /// cooldown ago
    async fn check_cooldown(&self) -> Result<()> {
        if let SessionState::Dead { since, reason } = &*self.state.read().await {
            let cooldown = self.settings.relogin_cooldown();
            let elapsed = (Utc::now() - *since).to_std().unwrap_or_default();
            if elapsed < cooldown {
                return Err(Error::keep_alive(format!(
                    "last re-login failed {}s ago: {}",
                    elapsed.as_secs(),
                    reason
                )));
            }
        }
        Ok(())
    }

    /// Fetch a login token and run the login flow. Caller holds `reinit`.
    async fn perform_login(
        &self,
        credentials: &Credentials,
        mode: LoginMode,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<LoginResponse>> {
        let token = self.get_token_with(TokenKind::Login, cancel).await?;

        let transport = self.transport().await;
        let params = mode.request(credentials, &token, transport.endpoint());
        let result = transport
            .send::<LoginResponse>(Method::Post, params, cancel)
            .await;

        // Login tokens are single-use whatever the outcome.
        self.tokens.remove(TokenKind::Login).await;

        let response = mode.check(result?)?;

        // Tokens from before the login belong to the old session.
        self.invalidate_tokens().await;

        if !transport.has_cookie_with_suffix(&self.settings.session.session_cookie_suffix) {
            warn!(
                "Login succeeded but no cookie ending in {:?} was set; keep-alive will re-login on every call",
                self.settings.session.session_cookie_suffix
            );
        }

        Ok(response)
    }

    /// Swap in a fresh transport, clear tokens and replay the stored login.
    /// Caller holds `reinit`.
    async fn reinitialize_locked(&self, stored: &StoredLogin, cancel: &CancellationToken) -> Result<()> {
        *self.state.write().await = SessionState::Reinitializing;

        let reset = {
            let mut entries = self.tokens.lock().await;
            let mut transport = self.transport.write().await;
            transport.reset().map(|fresh| {
                *transport = fresh;
                entries.clear();
                self.epoch.fetch_add(1, Ordering::SeqCst);
            })
        };

        let result = match reset {
            Ok(()) => self
                .perform_login(&stored.credentials, stored.mode, cancel)
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                if let Some(current) = self.stored_login.write().await.as_mut() {
                    current.logged_in_at = Utc::now();
                }
                *self.state.write().await = SessionState::Alive;
                info!("Session re-initialized for {}", stored.credentials.username());
                Ok(())
            }
            Err(Error::Cancelled) => {
                *self.state.write().await = SessionState::Unauthenticated;
                Err(Error::Cancelled)
            }
            Err(e) => {
                warn!("Keep-alive re-login failed: {}", e);
                *self.state.write().await = SessionState::Dead {
                    since: Utc::now(),
                    reason: e.to_string(),
                };
                Err(Error::keep_alive(format!("re-login failed: {}", e)))
            }
        }
    }
}
