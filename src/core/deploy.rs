//! Content-pack deployment.
//!
//! A deployment is created, each pack is uploaded to it, it is committed, and
//! then polled until the server reports it FINISHED or FAILED. Each pack's
//! verdict is read from the first entry of its `responses` list only.

use crate::client::{id_string, missing_field, OoClient};
use crate::error::{Error, Result};
use crate::http::{Payload, Transport};
use crate::poll::poll;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(3600);

const SUCCESS_CATEGORY: &str = "Success";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Finished,
    Failed,
    InProgress,
}

impl DeploymentStatus {
    /// Anything other than FINISHED or FAILED is still in progress.
    pub fn parse(status: &str) -> Self {
        match status {
            "FINISHED" => DeploymentStatus::Finished,
            "FAILED" => DeploymentStatus::Failed,
            _ => DeploymentStatus::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Finished | DeploymentStatus::Failed)
    }
}

/// `deploymentResultVO` as returned once a deployment is terminal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    #[serde(default)]
    pub content_pack_responses: BTreeMap<String, ContentPackResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPackResponse {
    #[serde(default)]
    pub responses: Vec<ApiResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub response_category: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPackOutcome {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ContentPackOutcome {
    fn from_response(name: &str, response: Option<&ContentPackResponse>) -> Self {
        let first = response.and_then(|r| r.responses.first());
        let category = first.and_then(|r| r.response_category.clone());
        Self {
            name: name.to_string(),
            success: category.as_deref() == Some(SUCCESS_CATEGORY),
            category,
            message: first.and_then(|r| r.message.clone()),
        }
    }

    fn log(&self) {
        if self.success {
            tracing::info!(content_pack = %self.name, "deployed successfully");
        } else {
            tracing::error!(
                content_pack = %self.name,
                category = self.category.as_deref().unwrap_or("<none>"),
                message = self.message.as_deref().unwrap_or(""),
                "failed to deploy"
            );
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub deployment_id: String,
    pub content_packs: Vec<ContentPackOutcome>,
}

impl DeploymentReport {
    /// True iff at least one pack was reported and every pack succeeded.
    pub fn succeeded(&self) -> bool {
        !self.content_packs.is_empty() && self.content_packs.iter().all(|cp| cp.success)
    }
}

/// Per-pack verdicts for a terminal deployment result.
pub fn evaluate_deployment(result: &DeploymentResult) -> Vec<ContentPackOutcome> {
    result
        .content_pack_responses
        .iter()
        .map(|(name, response)| ContentPackOutcome::from_response(name, Some(response)))
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl<T: Transport> OoClient<T> {
    /// Create a deployment and return its process id.
    pub fn new_deployment(&mut self) -> Result<String> {
        let response = self
            .rest
            .post("deployments", Payload::Empty)?
            .ok_or_else(|| missing_field("deploymentProcessId", "deployments"))?;
        response
            .get("deploymentProcessId")
            .and_then(id_string)
            .ok_or_else(|| missing_field("deploymentProcessId", "deployments"))
    }

    /// Deployment id reused by [`deploy_content_packs`](Self::deploy_content_packs), once created.
    pub fn deployment_id(&self) -> Option<&str> {
        self.deploy_id.as_deref()
    }

    /// Upload, commit and wait on a deployment of `files`.
    ///
    /// Returns true iff the server reported at least one pack and every pack
    /// succeeded.
    pub fn deploy_content_packs<P: AsRef<Path>>(&mut self, files: &[P], timeout: Duration) -> Result<bool> {
        Ok(self.deploy_content_packs_report(files, timeout)?.succeeded())
    }

    pub fn deploy_content_packs_report<P: AsRef<Path>>(
        &mut self,
        files: &[P],
        timeout: Duration,
    ) -> Result<DeploymentReport> {
        let deploy_id = match &self.deploy_id {
            Some(id) => id.clone(),
            None => {
                let id = self.new_deployment()?;
                tracing::info!(deployment_id = %id, "got new deployment id");
                self.deploy_id = Some(id.clone());
                id
            }
        };

        let files_path = format!("deployments/{}/files", deploy_id);
        for file in files {
            let file = file.as_ref();
            tracing::info!(file = %file.display(), "uploading");
            let response = self
                .rest
                .post(&files_path, Payload::File(file.to_path_buf()))?;
            tracing::info!(file = %file_name(file), "uploaded");
            tracing::debug!(?response);
        }

        self.rest
            .put(&format!("deployments/{}", deploy_id), Payload::Empty)?;
        tracing::info!(
            deployment_id = %deploy_id,
            timeout_secs = timeout.as_secs(),
            "deployment started, waiting for it to complete"
        );

        let result = self.wait_for_deployment(&deploy_id, timeout)?;
        tracing::debug!(?result);
        let result: DeploymentResult = serde_json::from_value(result).map_err(|e| {
            Error::http_invalid_response(e.to_string(), Some(format!("deployments/{}", deploy_id)))
        })?;

        let content_packs = evaluate_deployment(&result);
        content_packs.iter().for_each(ContentPackOutcome::log);

        Ok(DeploymentReport {
            deployment_id: deploy_id,
            content_packs,
        })
    }

    /// One status check: the deployment result once FINISHED or FAILED.
    pub fn is_deployment_complete(&mut self, deploy_id: &str) -> Result<Option<Value>> {
        let path = format!("deployments/{}", deploy_id);
        let deployment = self.get_value(&path, &[])?;
        let status = deployment
            .get("status")
            .and_then(Value::as_str)
            .map(DeploymentStatus::parse)
            .unwrap_or(DeploymentStatus::InProgress);

        if !status.is_terminal() {
            return Ok(None);
        }
        Ok(deployment
            .get("deploymentResultVO")
            .filter(|v| !v.is_null())
            .cloned())
    }

    pub fn wait_for_deployment(&mut self, deploy_id: &str, timeout: Duration) -> Result<Value> {
        let interval = self.poll_interval;
        poll("is_deployment_complete", timeout, interval, || {
            self.is_deployment_complete(deploy_id)
        })
    }

    /// Deploy one pack directly with `PUT content-packs/{name}`, name being the file stem.
    pub fn deploy_content_pack(&mut self, file: &Path) -> Result<bool> {
        Ok(self.deploy_content_pack_report(file)?.success)
    }

    pub fn deploy_content_pack_report(&mut self, file: &Path) -> Result<ContentPackOutcome> {
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "file",
                    "Content pack path has no file name",
                    Some(file.display().to_string()),
                )
            })?;
        let content = std::fs::read(file).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", file.display())))
        })?;

        let path = format!("content-packs/{}", name);
        let response = self
            .rest
            .put(&path, Payload::Raw(content))?
            .ok_or_else(|| missing_field("contentPackResponses", &path))?;
        let result: DeploymentResult = serde_json::from_value(response)
            .map_err(|e| Error::http_invalid_response(e.to_string(), Some(path.clone())))?;

        let jar = format!("{}.jar", name);
        let outcome = ContentPackOutcome::from_response(&jar, result.content_pack_responses.get(&jar));
        outcome.log();
        Ok(outcome)
    }
}
