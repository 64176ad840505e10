use clap::Args;
use oo_client::config::{self, Profile};
use oo_client::{ConnectionConfig, OoClient};
use serde_json::{Map, Value};
use std::io::Read;
use std::time::Duration;

pub type CmdResult<T> = oo_client::Result<(T, i32)>;

/// Exit code for a command that completed but whose verdict is a failure.
pub const EXIT_VERDICT_FAILED: i32 = 1;

/// Connection flags shared by every subcommand.
///
/// Flags override the values of `--profile`, which is read from
/// `~/.config/oo-client/profiles/<name>.json`.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Named connection profile
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Central URL, e.g. https://oo.example.com:8443
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// User name for basic auth
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Password for basic auth
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// REST API version
    #[arg(long, global = true, value_name = "VERSION")]
    pub api_version: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Seconds between status checks while waiting
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval: Option<u64>,
}

impl GlobalArgs {
    fn flag_profile(&self) -> Profile {
        Profile {
            url: self.url.clone(),
            username: self.user.clone(),
            password: self.password.clone(),
            api_version: self.api_version.clone(),
            verify_tls: self.insecure.then_some(false),
            request_timeout_secs: None,
        }
    }

    pub fn connection(&self) -> oo_client::Result<ConnectionConfig> {
        let base = match &self.profile {
            Some(name) => config::load_profile(name)?,
            None => Profile::default(),
        };
        base.merge(self.flag_profile()).into_connection()
    }

    pub fn connect(&self) -> oo_client::Result<OoClient> {
        let client = OoClient::connect(&self.connection()?)?;
        Ok(match self.poll_interval {
            Some(secs) => client.with_poll_interval(Duration::from_secs(secs)),
            None => client,
        })
    }
}

// ============================================================================
// Flow inputs (CLI layer)
// ============================================================================

/// Parse `key=value` pairs into string inputs.
fn parse_kv_inputs(pairs: &[String]) -> oo_client::Result<Map<String, Value>> {
    let mut inputs = Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            oo_client::Error::validation_invalid_argument(
                "input",
                "Expected key=value",
                Some(pair.clone()),
            )
        })?;
        inputs.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(inputs)
}

/// Read a JSON source from a string, a file (`@path`) or stdin (`-`).
fn read_json_source(source: &str) -> oo_client::Result<String> {
    use std::io::IsTerminal;

    if source.trim() == "-" {
        let mut buf = String::new();
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(oo_client::Error::validation_invalid_argument(
                "inputs",
                "Cannot read JSON from stdin when stdin is a TTY",
                None,
            ));
        }
        stdin.read_to_string(&mut buf).map_err(|e| {
            oo_client::Error::internal_io(e.to_string(), Some("read stdin".to_string()))
        })?;
        return Ok(buf);
    }

    if let Some(path) = source.strip_prefix('@') {
        if path.trim().is_empty() {
            return Err(oo_client::Error::validation_invalid_argument(
                "inputs",
                "Invalid JSON source '@' (missing file path)",
                None,
            ));
        }
        let path = oo_client::paths::expand(path);
        return std::fs::read_to_string(&path).map_err(|e| {
            oo_client::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        });
    }

    Ok(source.to_string())
}

/// Merge a JSON object source with `key=value` pairs. Pairs override its values.
pub fn merge_inputs(source: Option<&str>, pairs: &[String]) -> oo_client::Result<Map<String, Value>> {
    let mut inputs = match source {
        Some(source) => {
            let raw = read_json_source(source)?;
            let value: Value = serde_json::from_str(&raw).map_err(|e| {
                oo_client::Error::validation_invalid_json(e, Some("parse flow inputs".to_string()))
            })?;
            match value {
                Value::Object(map) => map,
                _ => {
                    return Err(oo_client::Error::validation_invalid_argument(
                        "inputs",
                        "Flow inputs must be a JSON object",
                        None,
                    ))
                }
            }
        }
        None => Map::new(),
    };

    inputs.extend(parse_kv_inputs(pairs)?);
    Ok(inputs)
}

pub fn timeout(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

pub mod config_item;
pub mod deploy;
pub mod flows;
pub mod run;
pub mod status;
pub mod test;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (oo_client::Result<Value>, i32) {
    match command {
        crate::Commands::Deploy(args) => dispatch!(args, global, deploy),
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::RunAll(args) => {
            crate::output::map_cmd_result_to_json(run::run_all(args, global))
        }
        crate::Commands::Status(args) => dispatch!(args, global, status),
        crate::Commands::Test(args) => dispatch!(args, global, test),
        crate::Commands::Flows(args) => dispatch!(args, global, flows),
        crate::Commands::ConfigItem(args) => dispatch!(args, global, config_item),
    }
}
