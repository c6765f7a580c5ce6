//! `action=upload`: multipart file upload

use super::{ActionResponse, ActionSpec, Call, execute};
use crate::{
    Error, Result,
    api::{ApiResponse, FilePart, Method},
    session::{SessionManager, TokenKind},
    types::{CoreResponse, Envelope, ParamOption, Warnings, flag, list, param},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub(crate) const SPEC: ActionSpec = ActionSpec {
    label: "upload",
    action: "upload",
    method: Method::Post,
    token: Some(TokenKind::Csrf),
    base: &[],
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    /// `Success`, `Warning` or `Continue`
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Upload warnings (duplicate, exists, ...); present with `result = Warning`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Warnings>,
    /// Stash key for continuing after warnings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filekey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imageinfo: Option<ImageInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptionurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonicaltitle: Option<String>,
}

impl Envelope for UploadResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.upload.is_some()
    }
}

impl ActionResponse for UploadResponse {
    fn result(&self) -> Option<&str> {
        self.upload.as_ref().map(|upload| upload.result.as_str())
    }
}

/// Builder for `action=upload`
#[derive(Debug, Clone)]
pub struct Upload<'a> {
    call: Call<'a>,
    file: Option<FilePart>,
}

impl<'a> Upload<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            call: Call::new(session),
            file: None,
        }
    }

    /// Target file name on the wiki
    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.call.push(param("filename", name));
        self
    }

    /// Upload comment; also the initial page text if `text` is not set
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.call.push(param("comment", comment));
        self
    }

    /// Initial page text for new files
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.call.push(param("text", text));
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

    pub fn watchlist(mut self, value: impl Into<String>) -> Self {
        self.call.push(param("watchlist", value));
        self
    }

    pub fn ignorewarnings(mut self, on: bool) -> Self {
        self.call.push(flag("ignorewarnings", on));
        self
    }

    /// Upload to the stash only
    pub fn stash(mut self, on: bool) -> Self {
        self.call.push(flag("stash", on));
        self
    }

    /// Finish an upload previously stashed under `key`
    pub fn filekey(mut self, key: impl Into<String>) -> Self {
        self.call.push(param("filekey", key));
        self
    }

    /// Let the server fetch the file from `url`
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.call.push(param("url", url));
        self
    }

    /// File content sent as the multipart `file` field
    pub fn file(mut self, file: FilePart) -> Self {
        self.file = Some(file);
        self
    }

    /// Read `path` into memory and use it as the file content
    pub async fn file_from_path(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::config(format!("Not a file path: {}", path.display())))?
            .to_string();
        Ok(self.file(FilePart::new(name, bytes)))
    }

    pub fn option(mut self, option: ParamOption) -> Self {
        self.call.push(option);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.call.set_cancel(token);
        self
    }

    /// Send as `multipart/form-data` when a file is attached, otherwise as a
    /// plain form (for `url` and `filekey` uploads)
    pub async fn send(self) -> Result<ApiResponse<UploadResponse>> {
        execute(&SPEC, &self.call, self.file.as_ref()).await
    }
}

impl SessionManager {
    /// Start an `action=upload` call
    pub fn upload(&self) -> Upload<'_> {
        Upload::new(self)
    }
}
