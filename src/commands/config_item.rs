use clap::{Args, Subcommand};
use serde::Serialize;

use oo_client::config_item::{ConfigItemType, NameValue, TypedNameValue};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ConfigItemArgs {
    #[command(subcommand)]
    command: ConfigItemCommand,
}

#[derive(Subcommand)]
enum ConfigItemCommand {
    /// Show one configuration item
    Get {
        /// Item type, e.g. system-properties
        item_type: ConfigItemType,
        /// Item path
        path: String,
    },
    /// Set a configuration item's value
    Set {
        /// Item type, e.g. system-accounts
        item_type: ConfigItemType,
        /// Item path
        path: String,
        /// New value; `user:pass` for system accounts
        value: String,
    },
    /// List configuration items, optionally of one type
    List {
        /// Item type to list
        item_type: Option<ConfigItemType>,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ConfigItemOutput {
    Item {
        command: &'static str,
        #[serde(rename = "type")]
        item_type: ConfigItemType,
        path: String,
        item: NameValue,
    },
    ByType {
        command: &'static str,
        #[serde(rename = "type")]
        item_type: ConfigItemType,
        items: Vec<NameValue>,
    },
    All {
        command: &'static str,
        items: Vec<TypedNameValue>,
    },
}

pub fn run(args: ConfigItemArgs, global: &GlobalArgs) -> CmdResult<ConfigItemOutput> {
    let mut client = global.connect()?;

    let output = match args.command {
        ConfigItemCommand::Get { item_type, path } => ConfigItemOutput::Item {
            command: "config-item.get",
            item: client.get_configuration_item(item_type, &path)?,
            item_type,
            path,
        },
        ConfigItemCommand::Set {
            item_type,
            path,
            value,
        } => ConfigItemOutput::Item {
            command: "config-item.set",
            item: client.set_configuration_item(item_type, &path, &value)?,
            item_type,
            path,
        },
        ConfigItemCommand::List {
            item_type: Some(item_type),
        } => ConfigItemOutput::ByType {
            command: "config-item.list",
            items: client.list_configuration_items_by_type(item_type)?,
            item_type,
        },
        ConfigItemCommand::List { item_type: None } => ConfigItemOutput::All {
            command: "config-item.list",
            items: client.list_all_configuration_items()?,
        },
    };

    Ok((output, 0))
}
