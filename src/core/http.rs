//! Authenticated HTTP transport for the central REST API.
//!
//! Every exchange goes through [`Transport`]. The reqwest-backed
//! [`RestClient`] adds basic auth, replays the CSRF token captured from the
//! last successful response, and maps any status outside 200..=204 to an
//! `http.non_success` error.

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::path::PathBuf;

pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Request body for PUT/POST.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No body.
    Empty,
    /// Serialized to JSON before sending.
    Json(Value),
    /// Sent as-is; the caller has already serialized it.
    Raw(Vec<u8>),
    /// Multipart upload of a local file under the `file` field.
    File(PathBuf),
}

impl Payload {
    pub fn text(body: impl Into<String>) -> Self {
        Payload::Raw(body.into().into_bytes())
    }
}

/// One authenticated exchange with the server.
///
/// Implementations return `Ok(None)` for an empty 2xx body.
pub trait Transport {
    fn get(&mut self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>>;

    fn put(&mut self, path: &str, body: Payload) -> Result<Option<Value>>;

    fn post(&mut self, path: &str, body: Payload) -> Result<Option<Value>>;

    /// Central URL the transport talks to, used to build UI links.
    fn central_url(&self) -> &str;
}

/// Whether `status` counts as success (200 through 204 inclusive).
pub fn is_success(status: u16) -> bool {
    (200..=204).contains(&status)
}

/// Decode a successful response body; empty bodies yield `None`.
pub fn parse_body(body: &str, url: &str) -> Result<Option<Value>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body).map(Some).map_err(|e| {
        Error::http_invalid_response(format!("Invalid JSON response: {}", e), Some(url.to_string()))
    })
}

/// reqwest-backed transport holding the session state for one client.
pub struct RestClient {
    client: Client,
    central_url: String,
    base_url: String,
    username: String,
    password: String,
    csrf_token: Option<String>,
}

impl RestClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(format!("oo-client/{}", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::http_request_failed(config.rest_url(), e))?;

        if !config.verify_tls {
            tracing::warn!(url = %config.central_url(), "TLS certificate verification disabled");
        }

        Ok(Self {
            client,
            central_url: config.central_url().to_string(),
            base_url: config.rest_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            csrf_token: None,
        })
    }

    /// Token captured from the most recent successful response that carried one.
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password));

        match &self.csrf_token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    fn send_with_payload(&mut self, method: Method, path: &str, body: Payload) -> Result<Option<Value>> {
        let url = self.url(path);
        let request = self.request(method.clone(), &url);

        // Multipart requests carry their own boundary content type.
        let request = match body {
            Payload::Empty => request.header(CONTENT_TYPE, JSON_CONTENT_TYPE),
            Payload::Json(value) => {
                let bytes = serde_json::to_vec(&value).map_err(|e| {
                    Error::internal_json(e.to_string(), Some("serialize request body".to_string()))
                })?;
                request.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(bytes)
            }
            Payload::Raw(bytes) => request.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(bytes),
            Payload::File(file) => {
                let form = multipart::Form::new().file("file", &file).map_err(|e| {
                    Error::internal_io(e.to_string(), Some(format!("open {}", file.display())))
                })?;
                request.multipart(form)
            }
        };

        tracing::debug!(%method, %url, "sending request");
        let response = request
            .send()
            .map_err(|e| Error::http_request_failed(&url, e))?;
        self.handle_response(response, &url)
    }

    fn handle_response(&mut self, response: Response, url: &str) -> Result<Option<Value>> {
        let status = response.status().as_u16();
        let token = response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .map_err(|e| Error::http_request_failed(url, e))?;

        if !is_success(status) {
            tracing::debug!(status, %url, "request failed");
            return Err(Error::http_non_success(status, url, &body));
        }

        if let Some(token) = token {
            self.csrf_token = Some(token);
        }

        parse_body(&body, url)
    }
}

impl Transport for RestClient {
    fn get(&mut self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>> {
        let url = self.url(path);
        let request = self.request(Method::GET, &url).query(query);

        tracing::debug!(%url, ?query, "sending request");
        let response = request
            .send()
            .map_err(|e| Error::http_request_failed(&url, e))?;
        self.handle_response(response, &url)
    }

    fn put(&mut self, path: &str, body: Payload) -> Result<Option<Value>> {
        self.send_with_payload(Method::PUT, path, body)
    }

    fn post(&mut self, path: &str, body: Payload) -> Result<Option<Value>> {
        self.send_with_payload(Method::POST, path, body)
    }

    fn central_url(&self) -> &str {
        &self.central_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn success_range_is_200_through_204() {
        for status in 200..=204 {
            assert!(is_success(status), "{} should succeed", status);
        }
        for status in [100, 199, 205, 206, 301, 400, 404, 500] {
            assert!(!is_success(status), "{} should fail", status);
        }
    }

    #[test]
    fn empty_body_yields_none() {
        assert_eq!(parse_body("", "u").unwrap(), None);
        assert_eq!(parse_body("  \n", "u").unwrap(), None);
    }

    #[test]
    fn json_body_is_decoded() {
        let value = parse_body(r#"{"aaa": "aaa"}"#, "u").unwrap();
        assert_eq!(value, Some(serde_json::json!({"aaa": "aaa"})));
    }

    #[test]
    fn non_json_success_body_is_invalid_response() {
        let err = parse_body("<html>", "https://oo/rest/v1/version").unwrap_err();
        assert_eq!(err.code, ErrorCode::HttpInvalidResponse);
    }

    #[test]
    fn rest_client_builds_versioned_base_url() {
        let config = ConnectionConfig::new("https://blah:1234", "aa", "bb");
        let client = RestClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://blah:1234/oo/rest/v1");
        assert_eq!(client.url("/version"), "https://blah:1234/oo/rest/v1/version");
        assert_eq!(client.central_url(), "https://blah:1234");
        assert!(client.csrf_token().is_none());
    }

    #[test]
    fn rest_client_rejects_incomplete_config() {
        let config = ConnectionConfig::new("https://blah:1234", "aa", "");
        let err = RestClient::new(&config).err().unwrap();
        assert_eq!(err.code, ErrorCode::ValidationMissingArgument);
    }
}
