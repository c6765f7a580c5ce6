//! `action=query&meta=siteinfo`: wiki-wide configuration
//!
//! Only the common properties are typed. Everything else the server sends
//! is kept in the `extra`/`other` maps so the raw reply survives a
//! decode/encode cycle.

use super::{ActionResponse, ActionSpec, Call, execute};
use crate::{
    Result,
    api::{ApiResponse, Method},
    session::SessionManager,
    types::{CoreResponse, Envelope, ParamOption, flag, list, param},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "siteinfo",
    action: "query",
    method: Method::Get,
    token: None,
    base: &[("meta", "siteinfo")],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteInfoResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<SiteInfoQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteInfoQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general: Option<General>,
    /// Keyed by namespace id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<BTreeMap<String, Namespace>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespacealiases: Option<Vec<NamespaceAlias>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usergroups: Option<Vec<UserGroup>>,
    /// Properties without a typed field (`extensions`, `rightsinfo`, ...)
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct General {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mainpage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articlepath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scriptpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: i64,
    /// Local name; empty for the main namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceAlias {
    pub id: i64,
    pub alias: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articles: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activeusers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admins: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserGroup {
    pub name: String,
    #[serde(default)]
    pub rights: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SiteInfoResponse {
    pub fn general(&self) -> Option<&General> {
        self.query.as_ref().and_then(|q| q.general.as_ref())
    }

    /// Namespace by numeric id
    pub fn namespace(&self, id: i64) -> Option<&Namespace> {
        self.query
            .as_ref()
            .and_then(|q| q.namespaces.as_ref())
            .and_then(|namespaces| namespaces.get(&id.to_string()))
    }
}

impl Envelope for SiteInfoResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.query.is_some()
    }
}

impl ActionResponse for SiteInfoResponse {}

/// Builder for `meta=siteinfo`
#[derive(Debug, Clone)]
pub struct SiteInfo<'a> {
    call: Call<'a>,
}

impl<'a> SiteInfo<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
        }
    }

    /// Properties to fetch; the server sends only `general` by default
    pub fn prop<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("siprop", props));
        self
    }

    /// `local` or `!local`
    pub fn filteriw(mut self, filter: impl Into<String>) -> Self {
        self.call.push(param("sifilteriw", filter));
        self
    }

    pub fn showalldb(mut self, on: bool) -> Self {
        self.call.push(flag("sishowalldb", on));
        self
    }

    pub fn numberingroup(mut self, on: bool) -> Self {
        self.call.push(flag("sinumberingroup", on));
        self
    }

    pub fn inlanguagecode(mut self, code: impl Into<String>) -> Self {
        self.call.push(param("siinlanguagecode", code));
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

    pub async fn send(self) -> Result<ApiResponse<SiteInfoResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

impl SessionManager {
    /// Read the wiki's site information
    pub fn siteinfo(&self) -> SiteInfo<'_> {
        SiteInfo::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_common_props() {
        let response: SiteInfoResponse = serde_json::from_str(
            r#"{"batchcomplete":true,"query":{
                "general":{"mainpage":"Main Page","sitename":"Testwiki","generator":"MediaWiki 1.42.1","writeapi":true},
                "namespaces":{"0":{"id":0,"case":"first-letter","name":"","content":true},"14":{"id":14,"case":"first-letter","name":"Category","canonical":"Category"}},
                "statistics":{"pages":12,"articles":3,"edits":40,"users":2,"cirrussearch-article-words":900},
                "usergroups":[{"name":"sysop","rights":["delete","protect"]}]
            }}"#,
        )
        .unwrap();

        let general = response.general().unwrap();
        assert_eq!(general.sitename.as_deref(), Some("Testwiki"));
        assert_eq!(general.extra["writeapi"], true);
        assert_eq!(
            response.namespace(14).and_then(|ns| ns.canonical.as_deref()),
            Some("Category")
        );
        assert!(response.namespace(6).is_none());

        let query = response.query.as_ref().unwrap();
        let stats = query.statistics.as_ref().unwrap();
        assert_eq!(stats.edits, Some(40));
        assert_eq!(stats.extra["cirrussearch-article-words"], 900);
        assert_eq!(query.usergroups.as_ref().unwrap()[0].rights, vec!["delete", "protect"]);
    }

    #[test]
    fn test_untyped_props_are_kept() {
        let response: SiteInfoResponse = serde_json::from_str(
            r#"{"query":{"rightsinfo":{"url":"","text":"CC BY-SA"}}}"#,
        )
        .unwrap();
        let query = response.query.unwrap();
        assert!(query.general.is_none());
        assert_eq!(query.other["rightsinfo"]["text"], "CC BY-SA");
    }
}
