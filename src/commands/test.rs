use clap::Args;

use oo_client::flow::DEFAULT_RUN_TIMEOUT;
use oo_client::tester::{IntegrationTester, TestReport};

use super::{CmdResult, GlobalArgs, EXIT_VERDICT_FAILED};

#[derive(Args)]
pub struct TestArgs {
    /// Deployed content pack holding the test flows
    pub content_pack: String,

    /// Substring a flow's library path must contain to count as a test
    #[arg(long, default_value = "Library/Tests/")]
    pub filter: String,

    /// Seconds to wait for each test flow to finish
    #[arg(long, default_value_t = DEFAULT_RUN_TIMEOUT.as_secs())]
    pub timeout: u64,
}

pub fn run(args: TestArgs, global: &GlobalArgs) -> CmdResult<TestReport> {
    let mut client = global.connect()?;
    let report = IntegrationTester::new(args.filter).run_tests(
        &mut client,
        &args.content_pack,
        super::timeout(args.timeout),
    )?;

    let exit_code = if report.passed { 0 } else { EXIT_VERDICT_FAILED };
    Ok((report, exit_code))
}
