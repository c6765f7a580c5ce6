//! `action=query&prop=revisions`: read page revisions and their content

use super::{ActionResponse, ActionSpec, Call, edit::format_timestamp, execute};
use crate::{
    Result,
    api::{ApiResponse, Method},
    session::SessionManager,
    types::{
        Continuation, CoreResponse, Envelope, ParamOption, continuation, flag, list, param,
        serde_helpers::deserialize_flexible_bool,
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "revisions",
    action: "query",
    method: Method::Get,
    token: None,
    base: &[("prop", "revisions"), ("rvslots", "main")],
};

/// Name of the slot holding the page's primary content
pub const MAIN_SLOT: &str = "main";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionsResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<RevisionsQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionsQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub normalized: Vec<Normalized>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<RevisionsPage>,
}

/// Title rewrite applied by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub fromencoded: Option<bool>,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionsPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    pub ns: i64,
    pub title: String,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub missing: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub invalid: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parentid: Option<u64>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub minor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, RevisionSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentmodel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentformat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RevisionsResponse {
    /// Page entry for `title`, following any normalization the server did
    pub fn page(&self, title: &str) -> Option<&RevisionsPage> {
        let query = self.query.as_ref()?;
        let title = query
            .normalized
            .iter()
            .find(|n| n.from == title)
            .map_or(title, |n| n.to.as_str());
        query.pages.iter().find(|page| page.title == title)
    }

    /// Main-slot content of the first returned revision of `title`
    pub fn content(&self, title: &str) -> Option<&str> {
        self.page(title)?
            .revisions
            .first()?
            .slots
            .get(MAIN_SLOT)?
            .content
            .as_deref()
    }
}

impl Envelope for RevisionsResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.query.is_some()
    }
}

impl ActionResponse for RevisionsResponse {}

/// Builder for `prop=revisions` queries
#[derive(Debug, Clone)]
pub struct Revisions<'a> {
    call: Call<'a>,
}

impl<'a> Revisions<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
        }
    }

    pub fn titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("titles", titles));
        self
    }

    pub fn pageids<I>(mut self, pageids: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        self.call
            .push(list("pageids", pageids.into_iter().map(|id| id.to_string())));
        self
    }

    pub fn revids<I>(mut self, revids: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        self.call
            .push(list("revids", revids.into_iter().map(|id| id.to_string())));
        self
    }

    /// Revision properties, e.g. `content`, `timestamp`, `user`
    pub fn prop<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("rvprop", props));
        self
    }

    /// Slots to return; defaults to `main`
    pub fn slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("rvslots", slots));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.call.push(param("rvlimit", limit.to_string()));
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.call.push(param("rvsection", section));
        self
    }

    pub fn startid(mut self, revid: u64) -> Self {
        self.call.push(param("rvstartid", revid.to_string()));
        self
    }

    pub fn endid(mut self, revid: u64) -> Self {
        self.call.push(param("rvendid", revid.to_string()));
        self
    }

    pub fn start(mut self, at: DateTime<Utc>) -> Self {
        self.call.push(param("rvstart", format_timestamp(at)));
        self
    }

    pub fn end(mut self, at: DateTime<Utc>) -> Self {
        self.call.push(param("rvend", format_timestamp(at)));
        self
    }

    /// `older` or `newer`
    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.call.push(param("rvdir", dir));
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.call.push(param("rvuser", user));
        self
    }

    pub fn excludeuser(mut self, user: impl Into<String>) -> Self {
        self.call.push(param("rvexcludeuser", user));
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.call.push(param("rvtag", tag));
        self
    }

    pub fn contentformat(mut self, format: impl Into<String>) -> Self {
        self.call.push(param("rvcontentformat", format));
        self
    }

    /// Resolve redirects in `titles`
    pub fn redirects(mut self, on: bool) -> Self {
        self.call.push(flag("redirects", on));
        self
    }

    pub fn continue_from(mut self, token: impl Into<String>) -> Self {
        self.call.push(param("rvcontinue", token));
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

    pub async fn send(self) -> Result<ApiResponse<RevisionsResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

impl SessionManager {
    /// Start a `prop=revisions` query
    pub fn revisions(&self) -> Revisions<'_> {
        Revisions::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BODY: &str = r#"{
        "batchcomplete": true,
        "query": {
            "normalized": [{"fromencoded": false, "from": "main_page", "to": "Main Page"}],
            "pages": [
                {"pageid": 1, "ns": 0, "title": "Main Page", "revisions": [
                    {"revid": 42, "parentid": 41, "minor": false, "user": "Admin",
                     "timestamp": "2024-05-01T10:00:00Z",
                     "slots": {"main": {"contentmodel": "wikitext", "contentformat": "text/x-wiki", "content": "Hello"}}}
                ]},
                {"ns": 0, "title": "Nope", "missing": true}
            ]
        }
    }"#;

    #[test]
    fn test_content_follows_normalization() {
        let response: RevisionsResponse = serde_json::from_str(BODY).unwrap();
        assert_eq!(response.content("main_page"), Some("Hello"));
        assert_eq!(response.content("Main Page"), Some("Hello"));
        assert_eq!(response.content("Nope"), None);
        assert_eq!(response.page("Nope").unwrap().missing, Some(true));
    }

    #[test]
    fn test_base_params() {
        let params = SPEC.base_params();
        assert_eq!(params.get("action"), Some("query"));
        assert_eq!(params.get("rvslots"), Some("main"));
        assert!(!params.contains("token"));
    }
}
