//! Runs a content pack's test flows.
//!
//! Test flows are the pack's flows whose library path contains a filter,
//! e.g. `Library/Tests/`. They run one after another.

use crate::client::OoClient;
use crate::error::{Error, Result};
use crate::flow::{batch_passed, FlowRunOutcome};
use crate::http::Transport;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub content_pack: String,
    pub filter: String,
    pub runs: Vec<FlowRunOutcome>,
    pub passed: bool,
}

pub struct IntegrationTester {
    filter: String,
}

impl IntegrationTester {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn filter_flows<'a, I>(flows: I, path_filter: &str) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        flows
            .into_iter()
            .filter(|flow| flow.contains(path_filter))
            .cloned()
            .collect()
    }

    pub fn run_tests<T: Transport>(
        &self,
        client: &mut OoClient<T>,
        content_pack: &str,
        timeout: Duration,
    ) -> Result<TestReport> {
        let flows = client.get_all_flows_in_cp(content_pack)?;
        let test_flows = Self::filter_flows(flows.values(), &self.filter);
        if test_flows.is_empty() {
            return Err(Error::no_test_flows(&self.filter));
        }

        tracing::info!(count = test_flows.len(), "found test flows, running sequentially");
        for flow in &test_flows {
            tracing::info!(%flow);
        }

        let runs = client.run_flows_report(&test_flows, timeout)?;
        Ok(TestReport {
            content_pack: content_pack.to_string(),
            filter: self.filter.clone(),
            passed: batch_passed(&runs),
            runs,
        })
    }
}
