//! Request/response pipeline
//!
//! Executes exactly one logical API call: encodes the parameter map,
//! performs the HTTP exchange, and decodes the JSON body while keeping the
//! raw text. No retries happen here.

use crate::{
    Error, Result,
    types::{ApiError, Envelope, Params},
};
use reqwest::{
    Client, RequestBuilder,
    cookie::{CookieStore, Jar},
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Response format version requested unless the caller picks one
pub const FORMAT_VERSION: &str = "2";

/// HTTP verb for an API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read-only queries; parameters go in the query string
    Get,
    /// State-changing actions and anything carrying secrets; form body
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Result of a classified envelope
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<'a> {
    Success,
    ApiError(&'a ApiError),
}

/// Classify an envelope by its `error` field.
///
/// The API answers HTTP 200 for most failures, so this is the only place
/// failure is detected. `Success` says nothing about the payload; actions
/// check that themselves.
pub fn classify<T: Envelope>(envelope: &T) -> Outcome<'_> {
    match envelope.error() {
        Some(error) => Outcome::ApiError(error),
        None => Outcome::Success,
    }
}

/// A decoded response together with the exact text it was decoded from
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// Body text as received
    pub raw: String,
    /// Decoded envelope
    pub body: T,
}

impl<T> ApiResponse<T> {
    pub fn into_body(self) -> T {
        self.body
    }
}

impl<T: Envelope> ApiResponse<T> {
    /// Classification of the body
    pub fn outcome(&self) -> Outcome<'_> {
        classify(&self.body)
    }

    /// Turn an error envelope into [`Error::Api`], logging any warnings
    pub fn into_result(self) -> Result<Self> {
        if let Some(warnings) = self.body.warnings() {
            for (module, warning) in warnings {
                warn!("API warning from {}: {}", module, warning);
            }
        }

        match classify(&self.body) {
            Outcome::Success => Ok(self),
            Outcome::ApiError(error) => Err(Error::Api {
                code: error.code.clone(),
                info: error.info.clone(),
                raw: self.raw,
            }),
        }
    }
}

impl<T> Deref for ApiResponse<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.body
    }
}

/// Decode `bytes` as JSON into `T`, keeping the text alongside.
///
/// Both come from the same buffer, so the raw text is a faithful record of
/// what the decoded value was built from.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<ApiResponse<T>> {
    let raw = String::from_utf8_lossy(bytes).into_owned();
    match serde_json::from_slice(bytes) {
        Ok(body) => Ok(ApiResponse { raw, body }),
        Err(source) => Err(Error::Decode { source, raw }),
    }
}

/// File content for a multipart upload
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// HTTP client bound to one endpoint and one cookie jar
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    jar: Arc<Jar>,
    endpoint: Url,
    user_agent: String,
    timeout: Duration,
}

impl Transport {
    /// Build a transport with an empty cookie jar
    pub fn new(endpoint: Url, user_agent: impl Into<String>, timeout: Duration) -> Result<Self> {
        let user_agent = user_agent.into();
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(user_agent.clone())
            .cookie_provider(jar.clone())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            jar,
            endpoint,
            user_agent,
            timeout,
        })
    }

    /// Same endpoint, user agent and timeout with a fresh cookie jar
    pub fn reset(&self) -> Result<Self> {
        Self::new(self.endpoint.clone(), self.user_agent.clone(), self.timeout)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Names of the cookies the jar would send to the endpoint
    pub fn cookie_names(&self) -> Vec<String> {
        let Some(header) = self.jar.cookies(&self.endpoint) else {
            return Vec::new();
        };

        header
            .to_str()
            .unwrap_or_default()
            .split(';')
            .filter_map(|pair| pair.trim().split_once('=').map(|(name, _)| name.to_string()))
            .collect()
    }

    /// Whether a cookie whose name ends in `suffix` would be sent
    pub fn has_cookie_with_suffix(&self, suffix: &str) -> bool {
        self.cookie_names().iter().any(|name| name.ends_with(suffix))
    }

    /// Expire every cookie whose name ends in `suffix`, as the server would
    /// with `Max-Age=0`. Returns how many were expired.
    pub fn expire_cookies_with_suffix(&self, suffix: &str) -> usize {
        let names: Vec<String> = self
            .cookie_names()
            .into_iter()
            .filter(|name| name.ends_with(suffix))
            .collect();

        for name in &names {
            self.jar
                .add_cookie_str(&format!("{}=; Max-Age=0; Path=/", name), &self.endpoint);
        }
        names.len()
    }

    /// Send `params` with `method` and decode the reply into `T`.
    ///
    /// `format=json` is always injected, overriding the caller's value.
    /// `formatversion` defaults to [`FORMAT_VERSION`].
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        mut params: Params,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>> {
        finish_params(&mut params);
        debug!(
            "{} {} action={}",
            method,
            self.endpoint,
            params.get("action").unwrap_or("<none>")
        );

        let request = match method {
            Method::Get => self.client.get(self.endpoint.clone()).query(&params),
            Method::Post => self.client.post(self.endpoint.clone()).form(&params),
        };

        self.dispatch(request, cancel).await
    }

    /// POST `params` and `file` as `multipart/form-data`
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        mut params: Params,
        file: FilePart,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>> {
        finish_params(&mut params);
        debug!(
            "POST (multipart) {} action={} file={}",
            self.endpoint,
            params.get("action").unwrap_or("<none>"),
            file.file_name
        );

        let mut form = Form::new();
        for (key, value) in params.iter() {
            form = form.text(key.to_string(), value.to_string());
        }

        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = &file.mime {
            part = part.mime_str(mime)?;
        }
        form = form.part("file", part);

        let request = self.client.post(self.endpoint.clone()).multipart(form);
        self.dispatch(request, cancel).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>> {
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, Error>((status, bytes))
        };

        let (status, bytes) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = exchange => result?,
        };

        if !status.is_success() {
            debug!("Non-success HTTP status {} from {}", status, self.endpoint);
        }

        decode(&bytes)
    }
}

fn finish_params(params: &mut Params) {
    params.set("format", "json");
    if !params.contains("formatversion") {
        params.set("formatversion", FORMAT_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CoreResponse, TokensResponse};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> Transport {
        let url = Url::parse(&format!("{}/w/api.php", server.uri())).unwrap();
        Transport::new(url, "PipelineTest/1.0", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_classify() {
        let ok: CoreResponse = serde_json::from_str(r#"{"batchcomplete":true}"#).unwrap();
        assert_eq!(classify(&ok), Outcome::Success);

        let failed: CoreResponse =
            serde_json::from_str(r#"{"error":{"code":"x","info":"y"}}"#).unwrap();
        assert!(matches!(classify(&failed), Outcome::ApiError(e) if e.code == "x"));
    }

    #[test]
    fn test_decode_keeps_raw_text_verbatim() {
        let text = "{ \"batchcomplete\" : true }";
        let response: ApiResponse<CoreResponse> = decode(text.as_bytes()).unwrap();
        assert_eq!(response.raw, text);
        assert!(response.is_batch_complete());
    }

    #[test]
    fn test_finish_params_keeps_caller_formatversion() {
        let mut params = Params::action("query").with("format", "xml");
        finish_params(&mut params);
        assert_eq!(params.get("format"), Some("json"));
        assert_eq!(params.get("formatversion"), Some(FORMAT_VERSION));

        let mut params = Params::action("query").with("formatversion", "1");
        finish_params(&mut params);
        assert_eq!(params.get("formatversion"), Some("1"));
    }

    #[test]
    fn test_decode_error_carries_raw() {
        let err = decode::<CoreResponse>(b"<!DOCTYPE html>").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(err.raw(), Some("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn test_get_uses_query_string_and_forces_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("action", "query"))
            .and(query_param("format", "json"))
            .and(query_param("formatversion", "2"))
            .and(header("user-agent", "PipelineTest/1.0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"query":{"tokens":{"csrftoken":"abc+\\"}}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let params = Params::action("query")
            .with("meta", "tokens")
            .with("format", "xml");
        let response: ApiResponse<TokensResponse> = transport(&server)
            .send(Method::Get, params, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.token("csrf"), Some("abc+\\"));
    }

    #[tokio::test]
    async fn test_post_uses_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/w/api.php"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("action=purge"))
            .and(body_string_contains("format=json"))
            .and(body_string_contains("formatversion=2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"batchcomplete":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let response: ApiResponse<CoreResponse> = transport(&server)
            .send(Method::Post, Params::action("purge"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(response.into_result().is_ok());
    }

    #[tokio::test]
    async fn test_api_error_is_distinct_from_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"error":{"code":"unknown_action","info":"Unrecognized value"}}"#,
            ))
            .mount(&server)
            .await;

        let response: ApiResponse<CoreResponse> = transport(&server)
            .send(Method::Get, Params::action("nope"), &CancellationToken::new())
            .await
            .unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.api_code(), Some("unknown_action"));
        assert!(err.raw().unwrap().contains("Unrecognized value"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let url = Url::parse("http://127.0.0.1:9/w/api.php").unwrap();
        let transport = Transport::new(url, "t", Duration::from_secs(2)).unwrap();
        let err = transport
            .send::<CoreResponse>(Method::Get, Params::action("query"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = transport(&server)
            .send::<CoreResponse>(Method::Get, Params::action("query"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_cookie_tracking_and_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "testwiki_session=abc123; Path=/; HttpOnly")
                    .set_body_string("{}"),
            )
            .mount(&server)
            .await;

        let transport = transport(&server);
        assert!(!transport.has_cookie_with_suffix("_session"));

        transport
            .send::<CoreResponse>(Method::Get, Params::action("query"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(transport.has_cookie_with_suffix("_session"));

        assert_eq!(transport.expire_cookies_with_suffix("_session"), 1);
        assert!(!transport.has_cookie_with_suffix("_session"));

        let fresh = transport.reset().unwrap();
        assert!(fresh.cookie_names().is_empty());
        assert_eq!(fresh.user_agent(), "PipelineTest/1.0");
    }
}
