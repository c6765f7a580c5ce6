//! Common test utilities and helpers
//!
//! A scripted `api.php` built on wiremock, plus request counters.

#![allow(dead_code)]

use mediawiki_client::{Credentials, Settings};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const API_PATH: &str = "/w/api.php";
pub const SESSION_COOKIE: &str = "testwiki_session";

/// Settings pointing at the mock server
pub fn settings(server: &MockServer) -> Settings {
    let mut settings = Settings::for_endpoint(format!("{}{}", server.uri(), API_PATH));
    settings.api.timeout_secs = 5;
    settings
}

pub fn credentials() -> Credentials {
    Credentials::new("Tester@bot", "bot-password")
}

/// Answers every token request with a fresh, unique token
#[derive(Clone)]
pub struct TokenIssuer {
    kind: &'static str,
    issued: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl TokenIssuer {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            issued: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn with_delay(kind: &'static str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(kind)
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

/// Token value the issuer hands out as its `n`th (1-based) token
pub fn issued_token(kind: &str, n: usize) -> String {
    format!("{}{:0>36}+\\", kind, n)
}

impl Respond for TokenIssuer {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let mut tokens = serde_json::Map::new();
        tokens.insert(
            format!("{}token", self.kind),
            issued_token(self.kind, n).into(),
        );
        let body = serde_json::json!({
            "batchcomplete": true,
            "query": {"tokens": tokens}
        });
        let template = ResponseTemplate::new(200).set_body_json(body);
        match self.delay {
            Some(delay) => template.set_delay(delay),
            None => template,
        }
    }
}

/// Successful bot login that sets a fresh session cookie each time
#[derive(Clone, Default)]
pub struct LoginSuccess {
    logins: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl LoginSuccess {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

impl Respond for LoginSuccess {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        let template = ResponseTemplate::new(200)
            .insert_header(
                "set-cookie",
                format!("{}=session{}; Path=/; HttpOnly", SESSION_COOKIE, n).as_str(),
            )
            .set_body_string(
                r#"{"login":{"result":"Success","lguserid":7,"lgusername":"Tester"}}"#,
            );
        match self.delay {
            Some(delay) => template.set_delay(delay),
            None => template,
        }
    }
}

/// Mount a token endpoint for `kind` and return its issuer
pub async fn mount_tokens(server: &MockServer, kind: &'static str) -> TokenIssuer {
    mount_issuer(server, TokenIssuer::new(kind)).await
}

/// Like [`mount_tokens`], answering each request after `delay`
pub async fn mount_slow_tokens(
    server: &MockServer,
    kind: &'static str,
    delay: Duration,
) -> TokenIssuer {
    mount_issuer(server, TokenIssuer::with_delay(kind, delay)).await
}

async fn mount_issuer(server: &MockServer, issuer: TokenIssuer) -> TokenIssuer {
    let kind = issuer.kind;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("meta", "tokens"))
        .and(query_param("type", kind))
        .respond_with(issuer.clone())
        .mount(server)
        .await;
    issuer
}

/// Mount login token issuing and a bot login that always succeeds
pub async fn mount_bot_login(server: &MockServer) {
    mount_tokens(server, "login").await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_string_contains("action=login"))
        .respond_with(LoginSuccess::default())
        .mount(server)
        .await;
}

/// Bot login reply with a non-success result
pub fn login_failed() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(
        r#"{"login":{"result":"Failed","reason":"Incorrect username or password entered. Please try again."}}"#,
    )
}

/// Failed bot login that still hands out an anonymous session cookie, as
/// MediaWiki does once a login token has been issued
pub fn login_failed_with_cookie() -> ResponseTemplate {
    login_failed().insert_header(
        "set-cookie",
        format!("{}=anonymous; Path=/; HttpOnly", SESSION_COOKIE).as_str(),
    )
}

/// Number of received requests whose query string or body contains `needle`
pub async fn count(server: &MockServer, needle: &str) -> usize {
    describe(server)
        .await
        .iter()
        .filter(|line| line.contains(needle))
        .count()
}

/// One line per received request: method, query and body
pub async fn describe(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| {
            format!(
                "{} {} {}",
                request.method,
                request.url.query().unwrap_or_default(),
                String::from_utf8_lossy(&request.body)
            )
        })
        .collect()
}
