use clap::Args;
use serde::Serialize;
use serde_json::Value;

use oo_client::flow::{summary_result_type, summary_status, RunStatus};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct StatusArgs {
    /// Execution id returned when the run was started
    pub run_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    pub command: &'static str,
    pub run_id: String,
    pub status: Option<RunStatus>,
    pub result_type: Option<String>,
    pub complete: bool,
    pub link: String,
    pub summary: Value,
}

pub fn run(args: StatusArgs, global: &GlobalArgs) -> CmdResult<StatusOutput> {
    let mut client = global.connect()?;
    let summary = client.get_run_summary(&args.run_id)?;
    let status = summary_status(&summary);

    Ok((
        StatusOutput {
            command: "status",
            complete: status.as_ref().map(RunStatus::is_terminal).unwrap_or(false),
            result_type: summary_result_type(&summary),
            link: client.run_link(&args.run_id),
            run_id: args.run_id,
            status,
            summary,
        },
        0,
    ))
}
