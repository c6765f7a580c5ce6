//! `action=query&list=allusers`

use super::{ActionResponse, ActionSpec, Call, execute};
use crate::{
    Result,
    api::{ApiResponse, Method},
    session::SessionManager,
    types::{Continuation, CoreResponse, Envelope, ParamOption, continuation, flag, list, param},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "allusers",
    action: "query",
    method: Method::Get,
    token: None,
    base: &[("list", "allusers")],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllUsersResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<AllUsersQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllUsersQuery {
    #[serde(default)]
    pub allusers: Vec<UserEntry>,
}

/// One account. Fields requested through `auprop` land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub userid: u64,
    pub name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AllUsersResponse {
    pub fn users(&self) -> &[UserEntry] {
        self.query
            .as_ref()
            .map(|q| q.allusers.as_slice())
            .unwrap_or_default()
    }
}

impl Envelope for AllUsersResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.query.is_some()
    }
}

impl ActionResponse for AllUsersResponse {}

/// Builder for `list=allusers`
#[derive(Debug, Clone)]
pub struct AllUsers<'a> {
    call: Call<'a>,
}

impl<'a> AllUsers<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
        }
    }

    pub fn from(mut self, name: impl Into<String>) -> Self {
        self.call.push(param("aufrom", name));
        self
    }

    pub fn to(mut self, name: impl Into<String>) -> Self {
        self.call.push(param("auto", name));
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.call.push(param("auprefix", prefix));
        self
    }

    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.call.push(param("audir", dir));
        self
    }

    pub fn group<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("augroup", groups));
        self
    }

    pub fn exclude_group<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("auexcludegroup", groups));
        self
    }

    pub fn rights<I, S>(mut self, rights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("aurights", rights));
        self
    }

    /// Extra fields per user, e.g. `editcount`, `groups`, `registration`
    pub fn prop<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.call.push(list("auprop", props));
        self
    }

    pub fn witheditsonly(mut self, on: bool) -> Self {
        self.call.push(flag("auwitheditsonly", on));
        self
    }

    pub fn activeusers(mut self, on: bool) -> Self {
        self.call.push(flag("auactiveusers", on));
        self
    }

    pub fn attachedwiki(mut self, wiki: impl Into<String>) -> Self {
        self.call.push(param("auattachedwiki", wiki));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.call.push(param("aulimit", limit.to_string()));
        self
    }

    pub fn limit_max(mut self) -> Self {
        self.call.push(param("aulimit", "max"));
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

    pub async fn send(self) -> Result<ApiResponse<AllUsersResponse>> {
        execute(&SPEC, &self.call, None).await
    }
}

impl SessionManager {
    /// Enumerate registered users
    pub fn allusers(&self) -> AllUsers<'_> {
        AllUsers::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_requested_props_are_kept() {
        let raw = r#"{"continue":{"aufrom":"Carol","continue":"-||"},"query":{"allusers":[{"userid":1,"name":"Alice","editcount":42,"groups":["sysop","*"]},{"userid":2,"name":"Bob"}]}}"#;
        let response: AllUsersResponse = serde_json::from_str(raw).unwrap();

        let users = response.users();
        assert_eq!(users[0].extra["editcount"], 42);
        assert!(users[1].extra.is_empty());
        assert_eq!(response.continuation().unwrap()["aufrom"], "Carol");

        let back: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(raw).unwrap());
    }
}
