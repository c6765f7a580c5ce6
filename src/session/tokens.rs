//! Action token cache
//!
//! Tokens are session-scoped secrets fetched with `meta=tokens`. An entry
//! stays valid until the server rejects it or the session is re-initialized,
//! at which point the whole cache is cleared.
//!
//! Fetches are single-flight per kind: a task fetching `csrf` holds only the
//! `csrf` flight guard, so cached reads of any kind never wait on I/O.

use crate::Error;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockWriteGuard};

/// Kinds of token the API hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Csrf,
    DeleteGlobalAccount,
    Patrol,
    Rollback,
    SetGlobalAccountStatus,
    UserRights,
    Watch,
    Login,
}

impl TokenKind {
    pub const ALL: [TokenKind; 8] = [
        TokenKind::Csrf,
        TokenKind::DeleteGlobalAccount,
        TokenKind::Patrol,
        TokenKind::Rollback,
        TokenKind::SetGlobalAccountStatus,
        TokenKind::UserRights,
        TokenKind::Watch,
        TokenKind::Login,
    ];

    /// Value of the `type` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Csrf => "csrf",
            TokenKind::DeleteGlobalAccount => "deleteglobalaccount",
            TokenKind::Patrol => "patrol",
            TokenKind::Rollback => "rollback",
            TokenKind::SetGlobalAccountStatus => "setglobalaccountstatus",
            TokenKind::UserRights => "userrights",
            TokenKind::Watch => "watch",
            TokenKind::Login => "login",
        }
    }

    /// Key of this token in `query.tokens`
    pub fn response_key(&self) -> String {
        format!("{}token", self.as_str())
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TokenKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| Error::config(format!("Unknown token kind: {}", s)))
    }
}

/// Per-session token storage
#[derive(Debug)]
pub struct TokenCache {
    entries: RwLock<HashMap<TokenKind, String>>,
    /// One fetch guard per kind, indexed by declaration order
    flights: [Mutex<()>; TokenKind::ALL.len()],
}

impl Default for TokenCache {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            flights: std::array::from_fn(|_| Mutex::new(())),
        }
    }
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token for `kind`
    pub async fn get(&self, kind: TokenKind) -> Option<String> {
        self.entries.read().await.get(&kind).cloned()
    }

    /// Exclusive right to fetch `kind`. Other kinds are unaffected.
    pub async fn flight(&self, kind: TokenKind) -> MutexGuard<'_, ()> {
        self.flights[kind as usize].lock().await
    }

    /// Exclusive access to the entries, for a fill or a wholesale clear
    pub async fn lock(&self) -> RwLockWriteGuard<'_, HashMap<TokenKind, String>> {
        self.entries.write().await
    }

    /// Drop one entry
    pub async fn remove(&self, kind: TokenKind) {
        self.entries.write().await.remove(&kind);
    }
}
