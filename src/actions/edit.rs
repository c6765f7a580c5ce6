//! `action=edit`: create and edit pages

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
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "edit",
    action: "edit",
    method: Method::Post,
    token: Some(TokenKind::Csrf),
    base: &[],
};

/// Reply to `action=edit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditResult {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentmodel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldrevid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newrevid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newtimestamp: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub watched: Option<bool>,
    /// Set when the submitted text matched the current revision
    #[serde(
        default,
        deserialize_with = "deserialize_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub nochange: Option<bool>,
}

impl Envelope for EditResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.edit.is_some()
    }
}

impl ActionResponse for EditResponse {
    fn result(&self) -> Option<&str> {
        self.edit.as_ref().map(|edit| edit.result.as_str())
    }
}

/// Builder for `action=edit`
#[derive(Debug, Clone)]
pub struct Edit<'a> {
    call: Call<'a>,
}

impl<'a> Edit<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
        }
    }

    /// Title of the page to edit. Cannot be used together with `pageid`.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.call.push(param("title", title));
        self
    }

    pub fn pageid(mut self, pageid: u64) -> Self {
        self.call.push(param("pageid", pageid.to_string()));
        self
    }

    /// Section identifier; `0` for the top section, `new` for a new one
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.call.push(param("section", section));
        self
    }

    pub fn sectiontitle(mut self, title: impl Into<String>) -> Self {
        self.call.push(param("sectiontitle", title));
        self
    }

    /// Full page content
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.call.push(param("text", text));
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.call.push(param("summary", summary));
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

    pub fn minor(mut self, on: bool) -> Self {
        self.call.push(flag("minor", on));
        self
    }

    pub fn notminor(mut self, on: bool) -> Self {
        self.call.push(flag("notminor", on));
        self
    }

    pub fn bot(mut self, on: bool) -> Self {
        self.call.push(flag("bot", on));
        self
    }

    /// Timestamp of the base revision, for edit conflict detection
    pub fn basetimestamp(mut self, at: DateTime<Utc>) -> Self {
        self.call.push(param("basetimestamp", format_timestamp(at)));
        self
    }

    pub fn starttimestamp(mut self, at: DateTime<Utc>) -> Self {
        self.call.push(param("starttimestamp", format_timestamp(at)));
        self
    }

    pub fn recreate(mut self, on: bool) -> Self {
        self.call.push(flag("recreate", on));
        self
    }

    /// Fail if the page already exists
    pub fn createonly(mut self, on: bool) -> Self {
        self.call.push(flag("createonly", on));
        self
    }

    /// Fail if the page does not exist
    pub fn nocreate(mut self, on: bool) -> Self {
        self.call.push(flag("nocreate", on));
        self
    }

    /// `watch`, `unwatch`, `preferences` or `nochange`
    pub fn watchlist(mut self, value: impl Into<String>) -> Self {
        self.call.push(param("watchlist", value));
        self
    }

    pub fn md5(mut self, hash: impl Into<String>) -> Self {
        self.call.push(param("md5", hash));
        self
    }

    pub fn prependtext(mut self, text: impl Into<String>) -> Self {
        self.call.push(param("prependtext", text));
        self
    }

    pub fn appendtext(mut self, text: impl Into<String>) -> Self {
        self.call.push(param("appendtext", text));
        self
    }

    /// Undo this revision, overriding `text`
    pub fn undo(mut self, revid: u64) -> Self {
        self.call.push(param("undo", revid.to_string()));
        self
    }

    pub fn undoafter(mut self, revid: u64) -> Self {
        self.call.push(param("undoafter", revid.to_string()));
        self
    }

    pub fn redirect(mut self, on: bool) -> Self {
        self.call.push(flag("redirect", on));
        self
    }

    pub fn contentformat(mut self, format: impl Into<String>) -> Self {
        self.call.push(param("contentformat", format));
        self
    }

    pub fn contentmodel(mut self, model: impl Into<String>) -> Self {
        self.call.push(param("contentmodel", model));
        self
    }

    /// Assert the user is logged in (`user`) or a bot (`bot`)
    pub fn assert(mut self, what: impl Into<String>) -> Self {
        self.call.push(param("assert", what));
        self
    }

    /// Any other parameter
    pub fn option(mut self, option: ParamOption) -> Self {
        self.call.push(option);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.call.set_cancel(token);
        self
    }

    pub async fn send(self) -> Result<ApiResponse<EditResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

/// ISO 8601 in the form the API accepts
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl SessionManager {
    /// Start an `action=edit` call
    pub fn edit(&self) -> Edit<'_> {
        Edit::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Params;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_success() {
        let body = r#"{"edit":{"result":"Success","pageid":94542,"title":"Sandbox","contentmodel":"wikitext","oldrevid":371705,"newrevid":371707,"newtimestamp":"2018-12-18T16:59:42Z","watched":true}}"#;
        let response: EditResponse = serde_json::from_str(body).unwrap();
        let edit = response.edit.as_ref().unwrap();
        assert_eq!(edit.newrevid, Some(371707));
        assert_eq!(edit.watched, Some(true));
        assert_eq!(response.result(), Some("Success"));
    }

    #[test]
    fn test_nochange_marker() {
        let response: EditResponse = serde_json::from_str(
            r#"{"edit":{"result":"Success","pageid":1,"title":"A","contentmodel":"wikitext","nochange":""}}"#,
        )
        .unwrap();
        assert_eq!(response.edit.unwrap().nochange, Some(true));
    }

    #[test]
    fn test_options_after_base() {
        let session = SessionManager::new(crate::Settings::default()).unwrap();
        let edit = session.edit().title("A").minor(true).minor(false).bot(true);

        let mut params = Params::new();
        params.apply(edit.call.options());
        assert_eq!(params.get("title"), Some("A"));
        assert!(!params.contains("minor"));
        assert_eq!(params.get("bot"), Some("1"));
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(format_timestamp(at), "2024-03-01T12:30:05Z");
    }
}
