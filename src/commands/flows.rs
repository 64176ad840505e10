use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct FlowsArgs {
    /// Deployed content pack name
    pub content_pack: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowsOutput {
    pub command: &'static str,
    pub content_pack: String,
    pub count: usize,
    /// Flow id to library path.
    pub flows: BTreeMap<String, String>,
}

pub fn run(args: FlowsArgs, global: &GlobalArgs) -> CmdResult<FlowsOutput> {
    let mut client = global.connect()?;
    let flows = client.get_all_flows_in_cp(&args.content_pack)?;

    Ok((
        FlowsOutput {
            command: "flows",
            content_pack: args.content_pack,
            count: flows.len(),
            flows,
        },
        0,
    ))
}
