use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{config_item, deploy, flows, run, status, test};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "oo-client")]
#[command(version = VERSION)]
#[command(about = "Deploy content packs and run flows on an Operations Orchestration central")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy content packs
    Deploy(deploy::DeployArgs),
    /// Run a flow by uuid or library path
    Run(run::RunArgs),
    /// Run several flows one after another
    RunAll(run::RunAllArgs),
    /// Show a run's summary
    Status(status::StatusArgs),
    /// Run a content pack's test flows
    Test(test::TestArgs),
    /// List the flows in a content pack
    Flows(flows::FlowsArgs),
    /// Read and write configuration items
    ConfigItem(config_item::ConfigItemArgs),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (json_result, exit_code) = commands::run_json(cli.command, &cli.global);
    if let Err(err) = output::print_json_result(json_result) {
        tracing::error!(%err, "failed to print response");
        return std::process::ExitCode::from(exit_code_to_u8(1));
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_poll_interval_is_rejected() {
        let parsed = Cli::try_parse_from(["oo-client", "--poll-interval", "0", "status", "42"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from(["oo-client", "status", "42", "--poll-interval", "1"]).unwrap();
        assert_eq!(cli.global.poll_interval, Some(1));
    }
}
