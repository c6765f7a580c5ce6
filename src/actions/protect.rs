//! `action=protect`

use super::{ActionResponse, ActionSpec, Call, execute};
use crate::{
    Result,
    api::{ApiResponse, Method},
    session::{SessionManager, TokenKind},
    types::{
        CoreResponse, Envelope, ParamOption, flag, list, param,
        serde_helpers::deserialize_flexible_bool,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "protect",
    action: "protect",
    method: Method::Post,
    token: Some(TokenKind::Csrf),
    base: &[],
};

/// One applied restriction, e.g. `{"edit": "sysop", "expiry": "infinite"}`
pub type Protection = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protect: Option<ProtectResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectResult {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub cascade: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protections: Vec<Protection>,
}

impl ProtectResult {
    /// Level and expiry applied to `kind` (`edit`, `move`, ...)
    pub fn level(&self, kind: &str) -> Option<(&str, Option<&str>)> {
        self.protections.iter().find_map(|p| {
            p.get(kind)
                .map(|level| (level.as_str(), p.get("expiry").map(String::as_str)))
        })
    }
}

impl Envelope for ProtectResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.protect.is_some()
    }
}

impl ActionResponse for ProtectResponse {}

/// Builder for `action=protect`
#[derive(Debug, Clone)]
pub struct Protect<'a> {
    call: Call<'a>,
}

impl<'a> Protect<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.call.push(param("title", title));
        self
    }

    pub fn pageid(mut self, pageid: u64) -> Self {
        self.call.push(param("pageid", pageid.to_string()));
        self
    }

    /// Restrictions as `action=level` pairs, e.g. `edit=sysop`
    pub fn protections<I, S>(mut self, protections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("protections", protections));
        self
    }

    /// One expiry per protection, or a single one for all
    pub fn expiry<I, S>(mut self, expiry: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("expiry", expiry));
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.call.push(param("reason", reason));
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("tags", tags));
        self
    }

    pub fn cascade(mut self, on: bool) -> Self {
        self.call.push(flag("cascade", on));
        self
    }

    pub fn watchlist(mut self, value: impl Into<String>) -> Self {
        self.call.push(param("watchlist", value));
        self
    }

    pub fn watchlistexpiry(mut self, expiry: impl Into<String>) -> Self {
        self.call.push(param("watchlistexpiry", expiry));
        self
    }

    pub fn option(mut self, option: ParamOption) -> Self {
        self.call.push(option);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.call.set_cancel(token);
        self
    }

    pub async fn send(self) -> Result<ApiResponse<ProtectResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

impl SessionManager {
    /// Start an `action=protect` call
    pub fn protect(&self) -> Protect<'_> {
        Protect::new(self)
    }
}
