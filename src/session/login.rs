//! Login flows
//!
//! The API offers two mutually exclusive login flows with different request
//! shapes and success fields: `action=login` for bot passwords and
//! `action=clientlogin` for the interactive flow. Only the single-step path
//! of the interactive flow is supported; `UI` and `REDIRECT` statuses are
//! reported as login failures.

use crate::{
    Error, Result,
    api::ApiResponse,
    types::{CoreResponse, Envelope, Params},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// `login.result` on a successful bot login
pub const BOT_LOGIN_SUCCESS: &str = "Success";

/// `clientlogin.status` on a successful interactive login
pub const CLIENT_LOGIN_PASS: &str = "PASS";

/// Which login flow a session uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    /// `action=login` with a bot password
    #[default]
    Bot,
    /// `action=clientlogin`
    Interactive,
}

impl LoginMode {
    /// Request parameters for this flow
    pub fn request(&self, credentials: &Credentials, token: &str, endpoint: &Url) -> Params {
        match self {
            LoginMode::Bot => Params::action("login")
                .with("lgname", credentials.username())
                .with("lgpassword", credentials.password())
                .with("lgtoken", token),
            LoginMode::Interactive => Params::action("clientlogin")
                .with("username", credentials.username())
                .with("password", credentials.password())
                .with("logintoken", token)
                .with("loginreturnurl", return_url(endpoint)),
        }
    }

    /// Check the decoded login reply for this flow's success status
    pub fn check(&self, response: ApiResponse<LoginResponse>) -> Result<ApiResponse<LoginResponse>> {
        let response = response.into_result()?;

        let failure = match self {
            LoginMode::Bot => match &response.body.login {
                Some(login) if login.result == BOT_LOGIN_SUCCESS => None,
                Some(login) => Some((
                    login.result.clone(),
                    None,
                    login.reason.clone().unwrap_or_default(),
                )),
                None => return Err(Error::unexpected("login", response.raw.clone())),
            },
            LoginMode::Interactive => match &response.body.clientlogin {
                Some(login) if login.status == CLIENT_LOGIN_PASS => None,
                Some(login) => Some((
                    login.status.clone(),
                    login.messagecode.clone(),
                    login.message.clone().unwrap_or_default(),
                )),
                None => return Err(Error::unexpected("clientlogin", response.raw.clone())),
            },
        };

        match failure {
            None => Ok(response),
            Some((status, code, message)) => Err(Error::Login {
                mode: *self,
                status,
                code,
                message,
                raw: response.raw,
            }),
        }
    }
}

fn return_url(endpoint: &Url) -> String {
    match endpoint.port() {
        Some(port) => format!(
            "{}://{}:{}/",
            endpoint.scheme(),
            endpoint.host_str().unwrap_or_default(),
            port
        ),
        None => format!(
            "{}://{}/",
            endpoint.scheme(),
            endpoint.host_str().unwrap_or_default()
        ),
    }
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMode::Bot => f.write_str("bot"),
            LoginMode::Interactive => f.write_str("interactive"),
        }
    }
}

impl FromStr for LoginMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bot" | "login" => Ok(LoginMode::Bot),
            "interactive" | "clientlogin" => Ok(LoginMode::Interactive),
            other => Err(Error::config(format!("Unknown login mode: {}", other))),
        }
    }
}

/// Username and password for a login flow
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reply to either login flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<BotLoginResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clientlogin: Option<ClientLoginResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotLoginResult {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lguserid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lgusername: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientLoginResult {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messagecode: Option<String>,
}

impl Envelope for LoginResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.login.is_some() || self.clientlogin.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::decode;
    use pretty_assertions::assert_eq;

    fn endpoint() -> Url {
        Url::parse("https://wiki.example.org/w/api.php").unwrap()
    }

    #[test]
    fn test_bot_request_shape() {
        let credentials = Credentials::new("Admin@bot", "s3cret");
        let params = LoginMode::Bot.request(&credentials, "tok+\\", &endpoint());
        assert_eq!(params.get("action"), Some("login"));
        assert_eq!(params.get("lgname"), Some("Admin@bot"));
        assert_eq!(params.get("lgpassword"), Some("s3cret"));
        assert_eq!(params.get("lgtoken"), Some("tok+\\"));
    }

    #[test]
    fn test_interactive_request_shape() {
        let credentials = Credentials::new("Admin", "s3cret");
        let params = LoginMode::Interactive.request(&credentials, "tok", &endpoint());
        assert_eq!(params.get("action"), Some("clientlogin"));
        assert_eq!(params.get("logintoken"), Some("tok"));
        assert_eq!(params.get("loginreturnurl"), Some("https://wiki.example.org/"));
    }

    #[test]
    fn test_return_url_keeps_port() {
        let url = Url::parse("http://127.0.0.1:8080/w/api.php").unwrap();
        assert_eq!(return_url(&url), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_bot_success() {
        let response = decode::<LoginResponse>(
            br#"{"login":{"result":"Success","lguserid":1,"lgusername":"Admin"}}"#,
        )
        .unwrap();
        let response = LoginMode::Bot.check(response).unwrap();
        assert_eq!(response.login.as_ref().unwrap().lgusername.as_deref(), Some("Admin"));
    }

    #[test]
    fn test_bot_failure_carries_reason() {
        let response = decode::<LoginResponse>(
            br#"{"login":{"result":"Failed","reason":"Incorrect username or password entered."}}"#,
        )
        .unwrap();
        match LoginMode::Bot.check(response).unwrap_err() {
            Error::Login {
                mode,
                status,
                message,
                ..
            } => {
                assert_eq!(mode, LoginMode::Bot);
                assert_eq!(status, "Failed");
                assert!(message.contains("Incorrect"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interactive_redirect_is_failure() {
        let response = decode::<LoginResponse>(
            br#"{"clientlogin":{"status":"REDIRECT","message":"Continue in browser","messagecode":"authmanager-authn-redirect"}}"#,
        )
        .unwrap();
        match LoginMode::Interactive.check(response).unwrap_err() {
            Error::Login { status, code, .. } => {
                assert_eq!(status, "REDIRECT");
                assert_eq!(code.as_deref(), Some("authmanager-authn-redirect"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_flow_payload_is_unexpected() {
        let response =
            decode::<LoginResponse>(br#"{"clientlogin":{"status":"PASS"}}"#).unwrap();
        assert!(matches!(
            LoginMode::Bot.check(response),
            Err(Error::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("Admin", "hunter2"));
        assert!(debug.contains("Admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_login_mode_parse() {
        assert_eq!("clientlogin".parse::<LoginMode>().unwrap(), LoginMode::Interactive);
        assert_eq!("BOT".parse::<LoginMode>().unwrap(), LoginMode::Bot);
        assert!("oauth".parse::<LoginMode>().is_err());
    }
}
