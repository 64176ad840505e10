//! Workflow client built on a [`Transport`].
//!
//! The operations themselves live next to their domain:
//! deployments in `deploy`, flow runs in `flow`, content-pack queries in
//! `content_pack` and configuration items in `config_item`.

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::http::{RestClient, Transport};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct OoClient<T: Transport = RestClient> {
    pub(crate) rest: T,
    pub(crate) deploy_id: Option<String>,
    pub(crate) poll_interval: Duration,
}

impl OoClient<RestClient> {
    /// Connect to a central server over HTTP.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        Self::new(RestClient::new(config)?)
    }
}

impl<T: Transport> OoClient<T> {
    /// Wrap a transport and prime the session.
    ///
    /// Issues two GETs to `version`: the first checks the server is up and
    /// some server versions only hand out a usable CSRF token on the second.
    pub fn new(mut rest: T) -> Result<Self> {
        rest.get("version", &[])?;
        let version = rest.get("version", &[])?;
        tracing::debug!(?version, url = rest.central_url(), "connected");

        Ok(Self {
            rest,
            deploy_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Interval between status checks while waiting on deployments and runs.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn transport(&self) -> &T {
        &self.rest
    }

    /// GET that must return a body.
    pub(crate) fn get_value(&mut self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.rest
            .get(path, query)?
            .ok_or_else(|| empty_response(path))
    }

    /// GET whose body must be a JSON array.
    pub(crate) fn get_list(&mut self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Value>> {
        match self.rest.get(path, query)? {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(Error::http_invalid_response(
                format!("expected a JSON array, got {}", json_kind(&other)),
                Some(path.to_string()),
            )),
            None => Ok(Vec::new()),
        }
    }
}

pub(crate) fn empty_response(path: &str) -> Error {
    Error::http_invalid_response("empty response body", Some(path.to_string()))
}

pub(crate) fn missing_field(field: &str, path: &str) -> Error {
    Error::http_invalid_response(
        format!("response is missing '{}'", field),
        Some(path.to_string()),
    )
}

/// Server ids come back as numbers or strings depending on the endpoint.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
