//! `action=move`

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
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "move",
    action: "move",
    method: Method::Post,
    token: Some(TokenKind::Csrf),
    base: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub moved: Option<MoveResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveResult {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub redirectcreated: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub moveoverredirect: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talkfrom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talkto: Option<String>,
}

impl Envelope for MoveResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.moved.is_some()
    }
}

impl ActionResponse for MoveResponse {}

/// Builder for `action=move`
#[derive(Debug, Clone)]
pub struct Move<'a> {
    call: Call<'a>,
}

impl<'a> Move<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
        }
    }

    pub fn from(mut self, title: impl Into<String>) -> Self {
        self.call.push(param("from", title));
        self
    }

    pub fn fromid(mut self, pageid: u64) -> Self {
        self.call.push(param("fromid", pageid.to_string()));
        self
    }

    pub fn to(mut self, title: impl Into<String>) -> Self {
        self.call.push(param("to", title));
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.call.push(param("reason", reason));
        self
    }

    pub fn movetalk(mut self, on: bool) -> Self {
        self.call.push(flag("movetalk", on));
        self
    }

    pub fn movesubpages(mut self, on: bool) -> Self {
        self.call.push(flag("movesubpages", on));
        self
    }

    /// Don't leave a redirect behind
    pub fn noredirect(mut self, on: bool) -> Self {
        self.call.push(flag("noredirect", on));
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

    pub fn ignorewarnings(mut self, on: bool) -> Self {
        self.call.push(flag("ignorewarnings", on));
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

    pub fn option(mut self, option: ParamOption) -> Self {
        self.call.push(option);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.call.set_cancel(token);
        self
    }

    pub async fn send(self) -> Result<ApiResponse<MoveResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

impl SessionManager {
    /// Start an `action=move` call
    pub fn move_page(&self) -> Move<'_> {
        Move::new(self)
    }
}
