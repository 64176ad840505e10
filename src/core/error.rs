use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationInvalidJson,

    HttpNonSuccess,
    HttpRequestFailed,
    HttpInvalidResponse,

    FlowNotFound,
    ContentPackNotFound,
    RunNotFound,
    NoTestFlows,

    PollTimeout,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::HttpNonSuccess => "http.non_success",
            ErrorCode::HttpRequestFailed => "http.request_failed",
            ErrorCode::HttpInvalidResponse => "http.invalid_response",

            ErrorCode::FlowNotFound => "flow.not_found",
            ErrorCode::ContentPackNotFound => "content_pack.not_found",
            ErrorCode::RunNotFound => "run.not_found",
            ErrorCode::NoTestFlows => "flow.no_test_flows",

            ErrorCode::PollTimeout => "poll.timeout",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// True for the lookup failures (flow, content pack, run summary).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::FlowNotFound | ErrorCode::ContentPackNotFound | ErrorCode::RunNotFound
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpNonSuccessDetails {
    pub status: u16,
    pub url: String,
    pub body: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollTimeoutDetails {
    pub operation: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    /// The server answered with a status outside 200..=204.
    ///
    /// `raw_body` is parsed as JSON when possible and kept as a plain string otherwise.
    pub fn http_non_success(status: u16, url: impl Into<String>, raw_body: &str) -> Self {
        let body = serde_json::from_str(raw_body)
            .unwrap_or_else(|_| Value::String(raw_body.to_string()));
        let url = url.into();
        Self::new(
            ErrorCode::HttpNonSuccess,
            format!("{}: {}", status, raw_body),
            to_details(HttpNonSuccessDetails { status, url, body }),
        )
    }

    pub fn http_request_failed(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::HttpRequestFailed,
            format!("HTTP request failed: {}", err),
            serde_json::json!({ "url": url.into(), "error": err.to_string() }),
        )
    }

    pub fn http_invalid_response(problem: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::HttpInvalidResponse,
            "Unexpected response from server",
            to_details(InternalErrorDetails {
                error: problem.into(),
                context,
            }),
        )
    }

    pub fn flow_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::FlowNotFound,
            format!("Flow not found with path {}", path),
            to_details(NotFoundDetails { id: path }),
        )
    }

    pub fn content_pack_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::ContentPackNotFound,
            format!("No content pack found with name {}", name),
            to_details(NotFoundDetails { id: name }),
        )
        .with_hint("Run 'oo-client deploy <file>' to deploy the content pack first")
    }

    pub fn run_not_found(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        Self::new(
            ErrorCode::RunNotFound,
            format!("No run summary found for run id: {}", run_id),
            to_details(NotFoundDetails { id: run_id }),
        )
    }

    pub fn no_test_flows(filter: impl Into<String>) -> Self {
        let filter = filter.into();
        Self::new(
            ErrorCode::NoTestFlows,
            format!("No flows found with filter {}", filter),
            serde_json::json!({ "filter": filter }),
        )
    }

    pub fn poll_timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        let operation = operation.into();
        Self::new(
            ErrorCode::PollTimeout,
            format!("Timed out after waiting {}s in {}", timeout_secs, operation),
            to_details(PollTimeoutDetails {
                operation,
                timeout_secs,
            }),
        )
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            to_details(ConfigMissingKeyDetails {
                key: key.into(),
                path,
            }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            to_details(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            to_details(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
                id,
            }),
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
        });

        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            to_details(InternalErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    /// Status code of an `http.non_success` error.
    pub fn http_status(&self) -> Option<u16> {
        if self.code != ErrorCode::HttpNonSuccess {
            return None;
        }
        self.details
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }

    /// Response body of an `http.non_success` error, JSON-parsed or raw string.
    pub fn http_body(&self) -> Option<&Value> {
        if self.code != ErrorCode::HttpNonSuccess {
            return None;
        }
        self.details.get("body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_non_success_parses_json_body() {
        let err = Error::http_non_success(400, "https://oo/rest", r#"{"aaa": "aaa"}"#);
        assert_eq!(err.code, ErrorCode::HttpNonSuccess);
        assert_eq!(err.http_status(), Some(400));
        assert_eq!(err.http_body(), Some(&serde_json::json!({"aaa": "aaa"})));
        assert_eq!(err.message, r#"400: {"aaa": "aaa"}"#);
    }

    #[test]
    fn http_non_success_keeps_raw_body() {
        let err = Error::http_non_success(502, "https://oo/rest", "Bad Gateway");
        assert_eq!(err.http_status(), Some(502));
        assert_eq!(err.http_body(), Some(&Value::String("Bad Gateway".into())));
    }

    #[test]
    fn http_accessors_are_empty_for_other_codes() {
        let err = Error::run_not_found("42");
        assert_eq!(err.http_status(), None);
        assert!(err.http_body().is_none());
        assert!(err.code.is_not_found());
    }

    #[test]
    fn poll_timeout_carries_operation_and_budget() {
        let err = Error::poll_timeout("is_run_complete", 300);
        assert_eq!(err.code.as_str(), "poll.timeout");
        assert_eq!(err.details["operation"], "is_run_complete");
        assert_eq!(err.details["timeoutSecs"], 300);
        assert_eq!(err.to_string(), "Timed out after waiting 300s in is_run_complete");
    }

    #[test]
    fn hints_accumulate() {
        let err = Error::content_pack_not_found("base-cp").with_hint("second");
        assert_eq!(err.hints.len(), 2);
        assert_eq!(err.hints[1].message, "second");
    }
}
