//! Flow execution.
//!
//! Flows are addressed by a canonical v4 UUID or by a `folder/flow` path
//! resolved through the folder's flow tree. Runs are started with
//! `POST executions` and polled through their summary until terminal.

use crate::client::{id_string, missing_field, OoClient};
use crate::error::{Error, Result};
use crate::http::{Payload, Transport};
use crate::poll::poll;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use uuid::{Uuid, Variant};

pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// Result type that fails a batch of runs.
pub const ERROR_RESULT: &str = "ERROR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Completed,
    SystemFailure,
    Canceled,
    /// Any non-terminal status (RUNNING, PENDING_PAUSE, ...).
    #[serde(untagged)]
    Other(String),
}

impl RunStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "COMPLETED" => RunStatus::Completed,
            "SYSTEM_FAILURE" => RunStatus::SystemFailure,
            "CANCELED" => RunStatus::Canceled,
            other => RunStatus::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Other(_))
    }
}

/// Returns the canonical form of `candidate` if it is a version-4 UUID
/// written exactly as its canonical hyphenated or simple lowercase form.
pub fn validate_uuid4(candidate: &str) -> Option<String> {
    let uuid = Uuid::parse_str(candidate).ok()?;
    if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
        return None;
    }

    let hyphenated = uuid.hyphenated().to_string();
    if candidate == hyphenated || candidate == uuid.simple().to_string() {
        Some(hyphenated)
    } else {
        None
    }
}

/// Split a flow path into its folder and flow name (extension dropped).
pub fn split_flow_path(flow_path: &str) -> (&str, &str) {
    let (folder, leaf) = match flow_path.rfind('/') {
        Some(idx) => (flow_path[..idx].trim_end_matches('/'), &flow_path[idx + 1..]),
        None => ("", flow_path),
    };
    let folder = if folder.is_empty() && flow_path.starts_with('/') {
        "/"
    } else {
        folder
    };

    // A leading dot is part of the name, not an extension.
    let name = match leaf.rfind('.') {
        Some(idx) if leaf[..idx].chars().any(|c| c != '.') => &leaf[..idx],
        _ => leaf,
    };
    (folder, name)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRunOutcome {
    pub flow: String,
    pub result: Option<String>,
}

impl<T: Transport> OoClient<T> {
    /// Resolve a flow path to its uuid through `flows/tree/level`.
    pub fn get_flow_uuid_from_path(&mut self, flow_path: &str) -> Result<String> {
        let (folder, flow_name) = split_flow_path(flow_path);
        let entries = self.get_list("flows/tree/level", &[("path", folder)])?;

        let mut matches = entries
            .iter()
            .filter(|entry| entry.get("name").and_then(Value::as_str) == Some(flow_name))
            .filter_map(|entry| entry.get("id").and_then(id_string));

        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(id),
            _ => Err(Error::flow_not_found(flow_path)),
        }
    }

    /// Uuid to run: `flow` itself when it is a canonical v4 UUID, otherwise its resolved path.
    pub fn resolve_flow(&mut self, flow: &str) -> Result<String> {
        match validate_uuid4(flow) {
            Some(uuid) => Ok(uuid),
            None => self.get_flow_uuid_from_path(flow),
        }
    }

    /// Start a run and return the raw execution response.
    pub fn run_flow_async(
        &mut self,
        flow: &str,
        run_name: Option<&str>,
        inputs: &Map<String, Value>,
    ) -> Result<Value> {
        let uuid = self.resolve_flow(flow)?;
        tracing::debug!(%uuid, "resolved flow");

        let payload = json!({
            "uuid": uuid,
            "runName": run_name,
            "inputs": inputs,
        });
        tracing::info!(%flow, "running flow");
        self.rest
            .post("executions", Payload::Json(payload))?
            .ok_or_else(|| missing_field("executionId", "executions"))
    }

    /// Run a flow to completion.
    ///
    /// Returns the run's result type (RESOLVED, ERROR, DIAGNOSED,
    /// NO_ACTION_TAKEN) when it COMPLETED, and `None` when it ended in
    /// SYSTEM_FAILURE or CANCELED or has no result type.
    pub fn run_flow(
        &mut self,
        flow: &str,
        run_name: Option<&str>,
        inputs: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<Option<String>> {
        let execution = self.run_flow_async(flow, run_name, inputs)?;
        let run_id = execution
            .get("executionId")
            .and_then(id_string)
            .ok_or_else(|| missing_field("executionId", "executions"))?;

        self.wait_for_run(&run_id, timeout)?;

        let summary = self.get_run_summary(&run_id)?;
        let status = summary_status(&summary);
        let result = summary_result_type(&summary);
        tracing::info!(
            %flow,
            result = result.as_deref().unwrap_or("<none>"),
            link = %self.run_link(&run_id),
            "flow finished"
        );

        if status == Some(RunStatus::Completed) {
            Ok(result)
        } else {
            Ok(None)
        }
    }

    /// Run flows one after another.
    ///
    /// True iff no run's result type is exactly `ERROR`; runs without a
    /// result do not fail the batch.
    pub fn run_flows<S: AsRef<str>>(&mut self, flows: &[S], timeout: Duration) -> Result<bool> {
        let outcomes = self.run_flows_report(flows, timeout)?;
        Ok(batch_passed(&outcomes))
    }

    pub fn run_flows_report<S: AsRef<str>>(
        &mut self,
        flows: &[S],
        timeout: Duration,
    ) -> Result<Vec<FlowRunOutcome>> {
        let empty = Map::new();
        flows
            .iter()
            .map(|flow| {
                let flow = flow.as_ref();
                let result = self.run_flow(flow, None, &empty, timeout)?;
                Ok(FlowRunOutcome {
                    flow: flow.to_string(),
                    result,
                })
            })
            .collect()
    }

    /// One status check: whether the run reached a terminal status.
    pub fn is_run_complete(&mut self, run_id: &str) -> Result<bool> {
        let status = self.get_run_status(run_id)?;
        Ok(status.map(|s| s.is_terminal()).unwrap_or(false))
    }

    pub fn wait_for_run(&mut self, run_id: &str, timeout: Duration) -> Result<()> {
        let interval = self.poll_interval;
        poll("is_run_complete", timeout, interval, || {
            Ok(self.is_run_complete(run_id)?.then_some(()))
        })
    }

    pub fn get_run_status(&mut self, run_id: &str) -> Result<Option<RunStatus>> {
        Ok(summary_status(&self.get_run_summary(run_id)?))
    }

    pub fn get_run_result_type(&mut self, run_id: &str) -> Result<Option<String>> {
        Ok(summary_result_type(&self.get_run_summary(run_id)?))
    }

    /// The single summary entry for a run.
    pub fn get_run_summary(&mut self, run_id: &str) -> Result<Value> {
        let mut summary = self.get_list(&format!("executions/{}/summary", run_id), &[])?;
        if summary.len() != 1 {
            return Err(Error::run_not_found(run_id));
        }
        Ok(summary.remove(0))
    }

    /// UI link to a run on the central server.
    pub fn run_link(&self, run_id: &str) -> String {
        format!(
            "{}/oo/#/runtimeWorkspace/runs/{}",
            self.rest.central_url(),
            run_id
        )
    }
}

/// Whether one run's result type passes: anything but exactly `ERROR`,
/// including no result at all.
pub fn result_passed(result: Option<&str>) -> bool {
    result != Some(ERROR_RESULT)
}

pub fn batch_passed(outcomes: &[FlowRunOutcome]) -> bool {
    outcomes.iter().all(|o| result_passed(o.result.as_deref()))
}

pub fn summary_status(summary: &Value) -> Option<RunStatus> {
    summary
        .get("status")
        .and_then(Value::as_str)
        .map(RunStatus::parse)
}

pub fn summary_result_type(summary: &Value) -> Option<String> {
    summary
        .get("resultStatusType")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::core::test_support::FakeTransport;

    const UUID: &str = "f1739b66-a586-44dc-942a-479caaecec34";

    fn client_with(fake: FakeTransport) -> OoClient<FakeTransport> {
        OoClient::new(fake)
            .unwrap()
            .with_poll_interval(Duration::from_millis(1))
    }

    fn inputs() -> Map<String, Value> {
        let mut inputs = Map::new();
        inputs.insert("an".into(), json!("input"));
        inputs
    }

    fn summary(status: &str, result: Option<&str>) -> Value {
        json!([{ "status": status, "resultStatusType": result }])
    }

    #[test]
    fn validate_uuid4_is_strict() {
        assert_eq!(validate_uuid4(UUID).as_deref(), Some(UUID));
        assert_eq!(
            validate_uuid4("f1739b66a58644dc942a479caaecec34").as_deref(),
            Some(UUID)
        );
        // uppercase is not canonical
        assert_eq!(validate_uuid4(&UUID.to_uppercase()), None);
        // version 1
        assert_eq!(validate_uuid4("f1739b66-a586-14dc-942a-479caaecec34"), None);
        // non-RFC variant
        assert_eq!(validate_uuid4("f1739b66-a586-44dc-c42a-479caaecec34"), None);
        assert_eq!(validate_uuid4(&format!("{{{}}}", UUID)), None);
        assert_eq!(validate_uuid4("Some/flow/path"), None);
    }

    #[test]
    fn split_flow_path_matches_dirname_and_stem() {
        assert_eq!(split_flow_path("path/to/a_flow"), ("path/to", "a_flow"));
        assert_eq!(split_flow_path("Library/Tests/check.xml"), ("Library/Tests", "check"));
        assert_eq!(split_flow_path("a_flow"), ("", "a_flow"));
        assert_eq!(split_flow_path("/a_flow"), ("/", "a_flow"));
        assert_eq!(split_flow_path("dir/.hidden"), ("dir", ".hidden"));
    }

    #[test]
    fn run_flow_async_uses_uuid_verbatim() {
        let mut fake = FakeTransport::new();
        fake.respond("POST", "executions", json!({"executionId": "345"}));
        let mut client = client_with(fake);

        let ret = client.run_flow_async(UUID, Some("some-name"), &inputs()).unwrap();
        assert_eq!(ret, json!({"executionId": "345"}));

        let calls = client.transport().calls_after_connect();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].body,
            Payload::Json(json!({
                "uuid": UUID,
                "runName": "some-name",
                "inputs": {"an": "input"},
            }))
        );
    }

    #[test]
    fn run_flow_async_resolves_paths() {
        let mut fake = FakeTransport::new();
        fake.respond(
            "GET",
            "flows/tree/level",
            json!([{"id": "the-uuid", "name": "path"}, {"id": "other", "name": "paths"}]),
        )
        .respond("POST", "executions", json!({"executionId": 1}));
        let mut client = client_with(fake);

        client.run_flow_async("Some/flow/path", None, &Map::new()).unwrap();

        let calls = client.transport().calls_after_connect();
        assert_eq!(calls[0].path, "flows/tree/level");
        assert_eq!(calls[0].query, vec![("path".to_string(), "Some/flow".to_string())]);
        assert_eq!(
            calls[1].body,
            Payload::Json(json!({"uuid": "the-uuid", "runName": null, "inputs": {}}))
        );
    }

    #[test]
    fn flow_lookup_requires_exactly_one_match() {
        let mut fake = FakeTransport::new();
        fake.respond(
            "GET",
            "flows/tree/level",
            json!([
                {"id": 123, "name": "a_flow"},
                {"id": 456, "name": "a_nother_flow"},
                {"id": 789, "name": "twin"},
                {"id": 790, "name": "twin"}
            ]),
        );
        let mut client = client_with(fake);

        assert_eq!(client.get_flow_uuid_from_path("path/to/a_flow").unwrap(), "123");
        let missing = client.get_flow_uuid_from_path("path/to/not_a_flow").unwrap_err();
        assert_eq!(missing.code, ErrorCode::FlowNotFound);
        let ambiguous = client.get_flow_uuid_from_path("path/to/twin").unwrap_err();
        assert_eq!(ambiguous.code, ErrorCode::FlowNotFound);
    }

    #[test]
    fn run_flow_returns_result_only_when_completed() {
        let mut fake = FakeTransport::new();
        fake.respond("POST", "executions", json!({"executionId": 345}))
            .respond("GET", "executions/345/summary", summary("RUNNING", None))
            .respond("GET", "executions/345/summary", summary("COMPLETED", Some("RESOLVED")));
        let mut client = client_with(fake);

        let result = client
            .run_flow(UUID, Some("some-name"), &inputs(), DEFAULT_RUN_TIMEOUT)
            .unwrap();
        assert_eq!(result.as_deref(), Some("RESOLVED"));
    }

    #[test]
    fn run_flow_returns_none_for_system_failure_and_cancel() {
        for status in ["SYSTEM_FAILURE", "CANCELED"] {
            let mut fake = FakeTransport::new();
            fake.respond("POST", "executions", json!({"executionId": 1}))
                .respond("GET", "executions/1/summary", summary(status, Some("ERROR")));
            let mut client = client_with(fake);

            let result = client
                .run_flow(UUID, None, &Map::new(), DEFAULT_RUN_TIMEOUT)
                .unwrap();
            assert_eq!(result, None, "{} should yield no result", status);
        }
    }

    #[test]
    fn run_flow_times_out_on_a_stuck_run() {
        let mut fake = FakeTransport::new();
        fake.respond("POST", "executions", json!({"executionId": 1}))
            .respond("GET", "executions/1/summary", summary("RUNNING", None));
        let mut client = client_with(fake);

        let err = client
            .run_flow(UUID, None, &Map::new(), Duration::from_millis(3))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PollTimeout);
        assert_eq!(err.details["operation"], "is_run_complete");
    }

    #[test]
    fn run_flow_requires_an_execution_id() {
        let mut fake = FakeTransport::new();
        fake.respond("POST", "executions", json!({"errorCode": "NO_LICENSE"}));
        let mut client = client_with(fake);

        let err = client
            .run_flow(UUID, None, &Map::new(), DEFAULT_RUN_TIMEOUT)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::HttpInvalidResponse);
    }

    #[test]
    fn run_flows_runs_in_order_and_fails_only_on_error() {
        let other = "0b5e1b7c-3c1a-4d2e-9f00-5a6b7c8d9e0f";
        let mut fake = FakeTransport::new();
        fake.respond("POST", "executions", json!({"executionId": 1}))
            .respond("POST", "executions", json!({"executionId": 2}))
            .respond("GET", "executions/1/summary", summary("COMPLETED", Some("RESOLVED")))
            .respond("GET", "executions/2/summary", summary("CANCELED", None));
        let mut client = client_with(fake);

        assert!(client.run_flows(&[UUID, other], DEFAULT_RUN_TIMEOUT).unwrap());

        let posted: Vec<_> = client
            .transport()
            .calls()
            .iter()
            .filter(|c| c.method == "POST")
            .map(|c| match &c.body {
                Payload::Json(body) => body["uuid"].as_str().unwrap_or_default().to_string(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(posted, vec![UUID.to_string(), other.to_string()]);

        // second run's summary is only read after the first run resolved
        let summaries = client.transport().paths("GET");
        let first = summaries.iter().rposition(|p| *p == "executions/1/summary").unwrap();
        let second = summaries.iter().position(|p| *p == "executions/2/summary").unwrap();
        assert!(first < second);
    }

    #[test]
    fn batch_verdict_checks_for_error_result() {
        let outcome = |result: Option<&str>| FlowRunOutcome {
            flow: "f".into(),
            result: result.map(str::to_string),
        };
        assert!(batch_passed(&[outcome(Some("RESOLVED")), outcome(Some("RESOLVED"))]));
        assert!(batch_passed(&[outcome(None), outcome(Some("DIAGNOSED"))]));
        assert!(!batch_passed(&[outcome(Some("RESOLVED")), outcome(Some("ERROR"))]));
        assert!(batch_passed(&[]));
        assert!(!result_passed(Some(ERROR_RESULT)));
        assert!(result_passed(None));
    }

    #[test]
    fn run_summary_must_have_exactly_one_entry() {
        let mut fake = FakeTransport::new();
        fake.respond("GET", "executions/123/summary", json!(["some"]))
            .respond("GET", "executions/123/summary", json!([]))
            .respond("GET", "executions/123/summary", json!([{}, {}]));
        let mut client = client_with(fake);

        assert_eq!(client.get_run_summary("123").unwrap(), json!("some"));
        assert_eq!(
            client.get_run_summary("123").unwrap_err().code,
            ErrorCode::RunNotFound
        );
        assert_eq!(
            client.get_run_summary("123").unwrap_err().code,
            ErrorCode::RunNotFound
        );
    }

    #[test]
    fn run_status_and_result_come_from_the_summary() {
        let mut fake = FakeTransport::new();
        fake.respond("GET", "executions/666/summary", json!([{"status": "PAUSED", "resultStatusType": "eggs"}]));
        let mut client = client_with(fake);

        assert_eq!(
            client.get_run_status("666").unwrap(),
            Some(RunStatus::Other("PAUSED".into()))
        );
        assert_eq!(client.get_run_result_type("666").unwrap().as_deref(), Some("eggs"));
        assert!(!client.is_run_complete("666").unwrap());
    }

    #[test]
    fn run_link_points_at_the_runtime_workspace() {
        let client = client_with(FakeTransport::new());
        assert_eq!(
            client.run_link("345"),
            "https://blah:1234/oo/#/runtimeWorkspace/runs/345"
        );
    }
}
