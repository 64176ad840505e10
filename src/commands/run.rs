use clap::Args;
use serde::Serialize;
use serde_json::Value;

use oo_client::flow::{batch_passed, result_passed, FlowRunOutcome, DEFAULT_RUN_TIMEOUT};

use super::{CmdResult, GlobalArgs, EXIT_VERDICT_FAILED};

#[derive(Args)]
pub struct RunArgs {
    /// Flow uuid or library path, e.g. Library/Tests/smoke.xml
    pub flow: String,

    /// Run name shown on the server
    #[arg(long)]
    pub name: Option<String>,

    /// Flow input as key=value (repeatable)
    #[arg(long = "input", short = 'i', value_name = "KEY=VALUE")]
    pub inputs: Vec<String>,

    /// Flow inputs as a JSON object (supports @file and - for stdin)
    #[arg(long = "inputs-json", value_name = "JSON")]
    pub inputs_json: Option<String>,

    /// Seconds to wait for the run to finish
    #[arg(long, default_value_t = DEFAULT_RUN_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Start the run and return without waiting
    #[arg(long = "async")]
    pub no_wait: bool,
}

#[derive(Args)]
pub struct RunAllArgs {
    /// Flow uuids or library paths, run in order
    #[arg(required = true)]
    pub flows: Vec<String>,

    /// Seconds to wait for each run to finish
    #[arg(long, default_value_t = DEFAULT_RUN_TIMEOUT.as_secs())]
    pub timeout: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "mode")]
pub enum RunOutput {
    Started { flow: String, execution: Value },
    Finished { flow: String, result: Option<String> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAllOutput {
    pub command: &'static str,
    pub runs: Vec<FlowRunOutcome>,
    pub passed: bool,
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> CmdResult<RunOutput> {
    let inputs = super::merge_inputs(args.inputs_json.as_deref(), &args.inputs)?;
    let mut client = global.connect()?;

    if args.no_wait {
        let execution = client.run_flow_async(&args.flow, args.name.as_deref(), &inputs)?;
        return Ok((
            RunOutput::Started {
                flow: args.flow,
                execution,
            },
            0,
        ));
    }

    let result = client.run_flow(
        &args.flow,
        args.name.as_deref(),
        &inputs,
        super::timeout(args.timeout),
    )?;
    let exit_code = run_exit_code(result.as_deref());
    Ok((
        RunOutput::Finished {
            flow: args.flow,
            result,
        },
        exit_code,
    ))
}

/// Same verdict as a one-flow `run-all`: only an `ERROR` result fails.
fn run_exit_code(result: Option<&str>) -> i32 {
    if result_passed(result) {
        0
    } else {
        EXIT_VERDICT_FAILED
    }
}

pub fn run_all(args: RunAllArgs, global: &GlobalArgs) -> CmdResult<RunAllOutput> {
    let mut client = global.connect()?;
    let runs = client.run_flows_report(&args.flows, super::timeout(args.timeout))?;
    let passed = batch_passed(&runs);

    let exit_code = if passed { 0 } else { EXIT_VERDICT_FAILED };
    Ok((
        RunAllOutput {
            command: "run-all",
            runs,
            passed,
        },
        exit_code,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_error_result_fails_the_run() {
        assert_eq!(run_exit_code(Some("ERROR")), EXIT_VERDICT_FAILED);
        assert_eq!(run_exit_code(Some("RESOLVED")), 0);
        assert_eq!(run_exit_code(Some("DIAGNOSED")), 0);
        assert_eq!(run_exit_code(None), 0);
    }

    #[test]
    fn run_and_run_all_agree_on_the_verdict() {
        for result in [Some("ERROR"), Some("RESOLVED"), None] {
            let outcome = FlowRunOutcome {
                flow: "Library/Tests/smoke.xml".to_string(),
                result: result.map(str::to_string),
            };
            let batch_code = if batch_passed(&[outcome]) { 0 } else { EXIT_VERDICT_FAILED };
            assert_eq!(run_exit_code(result), batch_code);
        }
    }
}
