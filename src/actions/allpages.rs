//! `action=query&generator=allpages&prop=info`: enumerate pages in a namespace

use super::{ActionResponse, ActionSpec, Call, execute};
use crate::{
    Result,
    api::{ApiResponse, Method},
    session::SessionManager,
    types::{
        Continuation, CoreResponse, Envelope, ParamOption, continuation, list, param,
        serde_helpers::deserialize_flexible_bool,
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "allpages",
    action: "query",
    method: Method::Get,
    token: None,
    base: &[("generator", "allpages"), ("prop", "info")],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllPagesResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<AllPagesQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllPagesQuery {
    #[serde(default)]
    pub pages: Vec<PageInfo>,
}

/// One page with its `prop=info` fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
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
    pub redirect: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub new: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentmodel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagelanguage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagelanguagehtmlcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagelanguagedir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touched: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastrevid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

impl AllPagesResponse {
    /// Pages in this batch; empty when nothing matched
    pub fn pages(&self) -> &[PageInfo] {
        self.query.as_ref().map(|q| q.pages.as_slice()).unwrap_or_default()
    }
}

impl Envelope for AllPagesResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    // A generator with no matches omits `query` entirely.
    fn has_payload(&self) -> bool {
        self.core.error.is_none()
    }
}

impl ActionResponse for AllPagesResponse {}

/// Builder for the `allpages` generator
#[derive(Debug, Clone)]
pub struct AllPages<'a> {
    call: Call<'a>,
}

impl<'a> AllPages<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
        }
    }

    /// Title to start enumerating from
    pub fn from(mut self, title: impl Into<String>) -> Self {
        self.call.push(param("gapfrom", title));
        self
    }

    /// Title to stop enumerating at
    pub fn to(mut self, title: impl Into<String>) -> Self {
        self.call.push(param("gapto", title));
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.call.push(param("gapprefix", prefix));
        self
    }

    pub fn namespace(mut self, ns: i64) -> Self {
        self.call.push(param("gapnamespace", ns.to_string()));
        self
    }

    /// `all`, `redirects` or `nonredirects`
    pub fn filterredir(mut self, filter: impl Into<String>) -> Self {
        self.call.push(param("gapfilterredir", filter));
        self
    }

    pub fn minsize(mut self, bytes: u64) -> Self {
        self.call.push(param("gapminsize", bytes.to_string()));
        self
    }

    pub fn maxsize(mut self, bytes: u64) -> Self {
        self.call.push(param("gapmaxsize", bytes.to_string()));
        self
    }

    /// Only pages protected against these actions
    pub fn prtype<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("gapprtype", types));
        self
    }

    pub fn prlevel<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("gapprlevel", levels));
        self
    }

    pub fn prfiltercascade(mut self, filter: impl Into<String>) -> Self {
        self.call.push(param("gapprfiltercascade", filter));
        self
    }

    pub fn prexpiry(mut self, expiry: impl Into<String>) -> Self {
        self.call.push(param("gapprexpiry", expiry));
        self
    }

    pub fn filterlanglinks(mut self, filter: impl Into<String>) -> Self {
        self.call.push(param("gapfilterlanglinks", filter));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.call.push(param("gaplimit", limit.to_string()));
        self
    }

    /// As many pages per batch as the server allows
    pub fn limit_max(mut self) -> Self {
        self.call.push(param("gaplimit", "max"));
        self
    }

    /// `ascending` or `descending`
    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.call.push(param("gapdir", dir));
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

    pub async fn send(self) -> Result<ApiResponse<AllPagesResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

impl SessionManager {
    /// Start an `allpages` enumeration
    pub fn allpages(&self) -> AllPages<'_> {
        AllPages::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::decode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_batch() {
        let response: AllPagesResponse = serde_json::from_str(
            r#"{"continue":{"gapcontinue":"Banana","continue":"gapcontinue||"},"query":{"pages":[
                {"pageid":3,"ns":0,"title":"Apple","contentmodel":"wikitext","touched":"2024-05-01T10:00:00Z","lastrevid":9,"length":120,"redirect":true}
            ]}}"#,
        )
        .unwrap();

        let page = &response.pages()[0];
        assert_eq!(page.title, "Apple");
        assert_eq!(page.redirect, Some(true));
        assert_eq!(page.length, Some(120));
        assert_eq!(response.continuation().unwrap()["gapcontinue"], "Banana");
    }

    #[test]
    fn test_empty_generator_is_a_payload() {
        let response = decode::<AllPagesResponse>(br#"{"batchcomplete":true}"#).unwrap();
        assert!(response.body.has_payload());
        assert!(response.pages().is_empty());
    }
}
