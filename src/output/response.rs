//! JSON envelope printed on stdout for every command.
//!
//! Success: `{"success": true, "data": ...}`.
//! Failure: `{"success": false, "error": {code, message, details, hints}}`.

use oo_client::error::Hint;
use oo_client::{Error, ErrorCode, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code.as_str(),
            message: err.message.clone(),
            details: err.details.clone(),
            hints: err.hints.clone(),
        }
    }
}

impl Envelope {
    pub fn from_result(result: &Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data.clone()),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(err.into()),
            },
        }
    }
}

/// Print the envelope for `result`. A closed stdout is not an error.
pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&Envelope::from_result(&result))
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize response".into())))?;

    match writeln!(io::stdout().lock(), "{}", payload) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
            Err(Error::internal_io(e.to_string(), Some("write stdout".into())))
        }
        _ => Ok(()),
    }
}

/// Serialize a command's data, keeping its exit code; errors get the code of their family.
pub fn map_cmd_result_to_json<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(e) => (
                Err(Error::internal_json(e.to_string(), Some("serialize response".into()))),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

pub fn exit_code_for_error(code: ErrorCode) -> i32 {
    use ErrorCode::*;

    match code {
        ConfigMissingKey | ConfigInvalidJson | ConfigInvalidValue | ValidationMissingArgument
        | ValidationInvalidArgument | ValidationInvalidJson => 2,

        FlowNotFound | ContentPackNotFound | RunNotFound | NoTestFlows => 4,

        HttpNonSuccess | HttpRequestFailed | HttpInvalidResponse | PollTimeout => 20,

        InternalIoError | InternalJsonError | InternalUnexpected => 1,
    }
}
