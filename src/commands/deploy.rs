use clap::Args;
use serde::Serialize;

use oo_client::deploy::{ContentPackOutcome, DEFAULT_DEPLOY_TIMEOUT};

use super::{CmdResult, GlobalArgs, EXIT_VERDICT_FAILED};

#[derive(Args)]
pub struct DeployArgs {
    /// Content pack files to deploy
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Deploy each pack on its own with PUT content-packs/{name}
    #[arg(long)]
    pub direct: bool,

    /// Seconds to wait for the deployment to finish
    #[arg(long, default_value_t = DEFAULT_DEPLOY_TIMEOUT.as_secs())]
    pub timeout: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutput {
    pub command: &'static str,
    pub direct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    pub content_packs: Vec<ContentPackOutcome>,
    pub succeeded: bool,
}

pub fn run(args: DeployArgs, global: &GlobalArgs) -> CmdResult<DeployOutput> {
    let files: Vec<_> = args.files.iter().map(|f| oo_client::paths::expand(f)).collect();
    let mut client = global.connect()?;

    let output = if args.direct {
        let content_packs = files
            .iter()
            .map(|file| client.deploy_content_pack_report(file))
            .collect::<oo_client::Result<Vec<_>>>()?;
        DeployOutput {
            command: "deploy",
            direct: true,
            deployment_id: None,
            succeeded: content_packs.iter().all(|cp| cp.success),
            content_packs,
        }
    } else {
        let report = client.deploy_content_packs_report(&files, super::timeout(args.timeout))?;
        DeployOutput {
            command: "deploy",
            direct: false,
            succeeded: report.succeeded(),
            deployment_id: Some(report.deployment_id),
            content_packs: report.content_packs,
        }
    };

    let exit_code = if output.succeeded { 0 } else { EXIT_VERDICT_FAILED };
    Ok((output, exit_code))
}
