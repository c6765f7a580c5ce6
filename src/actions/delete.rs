//! `action=delete`

use super::{ActionResponse, ActionSpec, Call, execute};
use crate::{
    Result,
    api::{ApiResponse, Method},
    session::{SessionManager, TokenKind},
    types::{CoreResponse, Envelope, ParamOption, flag, list, param},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "delete",
    action: "delete",
    method: Method::Post,
    token: Some(TokenKind::Csrf),
    base: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<DeleteResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub title: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logid: Option<u64>,
}

impl Envelope for DeleteResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.delete.is_some()
    }
}

impl ActionResponse for DeleteResponse {}

/// Builder for `action=delete`
#[derive(Debug, Clone)]
pub struct Delete<'a> {
    call: Call<'a>,
}

impl<'a> Delete<'a> {
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

    /// Also delete the talk page
    pub fn deletetalk(mut self, on: bool) -> Self {
        self.call.push(flag("deletetalk", on));
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

    /// Archive name of a file version to delete
    pub fn oldimage(mut self, name: impl Into<String>) -> Self {
        self.call.push(param("oldimage", name));
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

    pub async fn send(self) -> Result<ApiResponse<DeleteResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

impl SessionManager {
    /// Start an `action=delete` call
    pub fn delete(&self) -> Delete<'_> {
        Delete::new(self)
    }
}
