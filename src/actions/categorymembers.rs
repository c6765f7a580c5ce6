//! `action=query&list=categorymembers`

use super::{ActionResponse, ActionSpec, Call, execute};
use crate::{
    Result,
    api::{ApiResponse, Method},
    session::SessionManager,
    types::{Continuation, CoreResponse, Envelope, ParamOption, continuation, list, param},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "categorymembers",
    action: "query",
    method: Method::Get,
    token: None,
    base: &[("list", "categorymembers")],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMembersResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<CategoryMembersQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMembersQuery {
    #[serde(default)]
    pub categorymembers: Vec<CategoryMember>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    pub ns: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortkeyprefix: Option<String>,
    /// `page`, `subcat` or `file`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl CategoryMembersResponse {
    pub fn members(&self) -> &[CategoryMember] {
        self.query
            .as_ref()
            .map(|q| q.categorymembers.as_slice())
            .unwrap_or_default()
    }
}

impl Envelope for CategoryMembersResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.query.is_some()
    }
}

impl ActionResponse for CategoryMembersResponse {}

/// Builder for `list=categorymembers`
#[derive(Debug, Clone)]
pub struct CategoryMembers<'a> {
    call: Call<'a>,
}

impl<'a> CategoryMembers<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
        }
    }

    /// Category title, including the `Category:` prefix
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.call.push(param("cmtitle", title));
        self
    }

    pub fn pageid(mut self, id: u64) -> Self {
        self.call.push(param("cmpageid", id.to_string()));
        self
    }

    /// Subset of `ids|title|sortkey|sortkeyprefix|type|timestamp`
    pub fn prop<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("cmprop", props));
        self
    }

    /// Only `page`, `subcat` or `file` members
    pub fn member_type<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("cmtype", types));
        self
    }

    pub fn namespace<I>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let namespaces: Vec<String> = namespaces.into_iter().map(|ns| ns.to_string()).collect();
        self.call.push(list("cmnamespace", namespaces));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.call.push(param("cmlimit", limit.to_string()));
        self
    }

    pub fn limit_max(mut self) -> Self {
        self.call.push(param("cmlimit", "max"));
        self
    }

    /// Raw `cmcontinue` value from a previous batch
    pub fn continue_from(mut self, token: impl Into<String>) -> Self {
        self.call.push(param("cmcontinue", token));
        self
    }

    /// Continue from the `continue` object of a previous response
    pub fn continue_with(mut self, next: &Continuation) -> Self {
        self.call.push(continuation(next));
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

    pub async fn send(self) -> Result<ApiResponse<CategoryMembersResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

impl SessionManager {
    /// List the members of a category
    pub fn categorymembers(&self) -> CategoryMembers<'_> {
        CategoryMembers::new(self)
    }
}
