//! Per-action request builders
//!
//! Each builder collects parameter options and runs them through
//! [`execute`], which keeps the session alive, attaches the action token and
//! retries once when the server rejects the token or login state.
//!
//! ```rust,no_run
//! use mediawiki_client::{Settings, SessionManager};
//!
//! # tokio_test::block_on(async {
//! let session = SessionManager::new(Settings::for_endpoint("https://wiki.example.org/w/api.php"))?;
//! let response = session
//!     .edit()
//!     .title("Sandbox")
//!     .text("Hello")
//!     .summary("test edit")
//!     .send()
//!     .await?;
//! println!("{}", response.raw);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod allpages;
pub mod allusers;
pub mod categorymembers;
pub mod delete;
pub mod edit;
pub mod move_page;
pub mod protect;
pub mod revisions;
pub mod siteinfo;
pub mod upload;

pub use allpages::{AllPages, AllPagesQuery, AllPagesResponse, PageInfo};
pub use allusers::{AllUsers, AllUsersQuery, AllUsersResponse, UserEntry};
pub use categorymembers::{
    CategoryMember, CategoryMembers, CategoryMembersQuery, CategoryMembersResponse,
};

pub use delete::{Delete, DeleteResponse, DeleteResult};
pub use edit::{Edit, EditResponse, EditResult};
pub use move_page::{Move, MoveResponse, MoveResult};
pub use protect::{Protect, ProtectResponse, ProtectResult, Protection};
pub use revisions::{
    Normalized, Revision, RevisionSlot, Revisions, RevisionsPage, RevisionsQuery,
    RevisionsResponse,
};
pub use siteinfo::{
    General, Namespace, NamespaceAlias, SiteInfo, SiteInfoQuery, SiteInfoResponse, Statistics,
    UserGroup,
};
pub use upload::{ImageInfo, Upload, UploadResponse, UploadResult};

use crate::{
    Error, Result,
    api::{ApiResponse, FilePart, Method},
    session::{SessionManager, TokenKind},
    types::{Envelope, ParamOption, Params},
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// `result` value of a successful write
pub const RESULT_SUCCESS: &str = "Success";

/// Fixed request shape of one action
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    /// Name used in errors and logs
    pub label: &'static str,
    /// Value of the `action` parameter
    pub action: &'static str,
    pub method: Method,
    pub token: Option<TokenKind>,
    /// Fixed parameters sent with every call
    pub base: &'static [(&'static str, &'static str)],
}

impl ActionSpec {
    /// Parameters before the caller's options are applied
    pub fn base_params(&self) -> Params {
        let mut params = Params::action(self.action);
        for (key, value) in self.base {
            params.set(*key, *value);
        }
        params
    }
}

/// Response shape of an action
pub trait ActionResponse: Envelope {
    /// Value of the payload's `result` field, for actions that have one
    fn result(&self) -> Option<&str> {
        None
    }
}

/// Builder state shared by every action
#[derive(Clone)]
pub struct Call<'a> {
    session: &'a SessionManager,
    options: Vec<ParamOption>,
    cancel: Option<CancellationToken>,
}

impl<'a> Call<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            session,
            options: Vec::new(),
            cancel: None,
        }
    }

    pub fn push(&mut self, option: ParamOption) {
        self.options.push(option);
    }

    pub fn set_cancel(&mut self, token: CancellationToken) {
        self.cancel = Some(token);
    }

    pub fn options(&self) -> &[ParamOption] {
        &self.options
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel
            .clone()
            .unwrap_or_else(|| self.session.cancellation_token())
    }
}

impl std::fmt::Debug for Call<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("options", &self.options.len())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Run one action call.
///
/// Options are applied after the base parameters and the token, so a
/// caller-supplied key wins. A token or login rejection triggers a single
/// recovery and retry.
pub async fn execute<T: ActionResponse>(
    spec: &ActionSpec,
    call: &Call<'_>,
    file: Option<&FilePart>,
) -> Result<ApiResponse<T>> {
    let session = call.session;
    let cancel = call.cancel_token();

    session.ensure_alive_with(&cancel).await?;

    let mut retried = false;
    loop {
        let epoch = session.epoch();

        let mut params = spec.base_params();
        if let Some(kind) = spec.token {
            let token = session.get_token_with(kind, &cancel).await?;
            params.set("token", token);
        }
        params.apply(call.options());

        let response = match file {
            Some(file) => {
                session
                    .send_multipart::<T>(params, file.clone(), &cancel)
                    .await?
            }
            None => session.send::<T>(spec.method, params, &cancel).await?,
        };

        match response.into_result() {
            Ok(response) => return check_payload(spec, response),
            Err(e) if e.is_token_rejection() && !retried => {
                warn!(
                    "{} rejected with {}, recovering session and retrying",
                    spec.label,
                    e.api_code().unwrap_or_default()
                );
                retried = true;
                session.recover(epoch, &cancel).await?;
            }
            Err(e) => return Err(e),
        }
    }
}

fn check_payload<T: ActionResponse>(
    spec: &ActionSpec,
    response: ApiResponse<T>,
) -> Result<ApiResponse<T>> {
    if !response.body.has_payload() {
        return Err(Error::unexpected(spec.label, response.raw));
    }

    let result = response.body.result().map(str::to_string);
    match result {
        Some(result) if result != RESULT_SUCCESS => Err(Error::ActionFailed {
            action: spec.label.to_string(),
            result,
            raw: response.raw,
        }),
        _ => Ok(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::decode;

    const SPEC: ActionSpec = ActionSpec {
        label: "revisions",
        action: "query",
        method: Method::Get,
        token: None,
        base: &[("prop", "revisions"), ("rvslots", "main")],
    };

    #[test]
    fn test_base_params() {
        let params = SPEC.base_params();
        assert_eq!(params.get("action"), Some("query"));
        assert_eq!(params.get("prop"), Some("revisions"));
        assert_eq!(params.get("rvslots"), Some("main"));
    }

    #[test]
    fn test_missing_payload_is_unexpected() {
        let response = decode::<EditResponse>(br#"{"batchcomplete":true}"#).unwrap();
        let err = check_payload(&edit::SPEC, response).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { ref action, .. } if action == "edit"));
    }

    #[test]
    fn test_failed_result_is_action_failed() {
        let response =
            decode::<EditResponse>(br#"{"edit":{"result":"Failure","title":"Sandbox"}}"#).unwrap();
        match check_payload(&edit::SPEC, response).unwrap_err() {
            Error::ActionFailed { result, raw, .. } => {
                assert_eq!(result, "Failure");
                assert!(raw.contains("Sandbox"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
