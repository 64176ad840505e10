//! Server-side configuration items.
//!
//! Items are addressed by type and path. Reads and writes reduce the
//! server's representation to `{name, value}`.

use crate::client::OoClient;
use crate::error::{Error, Result};
use crate::http::{Payload, Transport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigItemType {
    DomainTerms,
    GroupAliases,
    SelectionLists,
    SystemAccounts,
    SystemProperties,
}

impl ConfigItemType {
    pub const ALL: [ConfigItemType; 5] = [
        ConfigItemType::DomainTerms,
        ConfigItemType::GroupAliases,
        ConfigItemType::SelectionLists,
        ConfigItemType::SystemAccounts,
        ConfigItemType::SystemProperties,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigItemType::DomainTerms => "domain-terms",
            ConfigItemType::GroupAliases => "group-aliases",
            ConfigItemType::SelectionLists => "selection-lists",
            ConfigItemType::SystemAccounts => "system-accounts",
            ConfigItemType::SystemProperties => "system-properties",
        }
    }
}

impl fmt::Display for ConfigItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ConfigItemType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = ConfigItemType::ALL.iter().map(|t| t.as_str()).collect();
                Error::validation_invalid_argument(
                    "type",
                    format!("Unknown configuration item type; expected one of {}", known.join(", ")),
                    Some(s.to_string()),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedNameValue {
    #[serde(rename = "type")]
    pub item_type: String,
    pub name: String,
    pub value: Value,
}

/// Value of a system account, serialized in this field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemAccount<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> SystemAccount<'a> {
    /// Split `user:pass` on the first colon; without a colon the password is empty.
    pub fn parse(data: &'a str) -> Self {
        let (username, password) = data.split_once(':').unwrap_or((data, ""));
        Self { username, password }
    }
}

/// Request body for `PUT config-items/{type}/{path}`: the value as a JSON string literal.
///
/// System accounts are first turned into `{"username","password"}` JSON, which
/// is then itself encoded as a string.
pub fn encode_item_value(item_type: ConfigItemType, data: &str) -> Result<String> {
    let value = match item_type {
        ConfigItemType::SystemAccounts => serde_json::to_string(&SystemAccount::parse(data))
            .map_err(|e| Error::internal_json(e.to_string(), Some("encode system account".into())))?,
        _ => data.to_string(),
    };
    serde_json::to_string(&value)
        .map_err(|e| Error::internal_json(e.to_string(), Some("encode config item".into())))
}

fn field<'v>(item: &'v Value, key: &str, path: &str) -> Result<&'v Value> {
    item.get(key).ok_or_else(|| {
        Error::http_invalid_response(
            format!("configuration item is missing '{}'", key),
            Some(path.to_string()),
        )
    })
}

fn name_value(item: &Value, path: &str) -> Result<NameValue> {
    let name = field(item, "name", path)?;
    Ok(NameValue {
        name: name.as_str().map(str::to_string).unwrap_or_else(|| name.to_string()),
        value: field(item, "value", path)?.clone(),
    })
}

fn typed_name_value(item: &Value, path: &str) -> Result<TypedNameValue> {
    let NameValue { name, value } = name_value(item, path)?;
    let item_type = field(item, "type", path)?;
    Ok(TypedNameValue {
        item_type: item_type
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| item_type.to_string()),
        name,
        value,
    })
}

impl<T: Transport> OoClient<T> {
    pub fn get_configuration_item(&mut self, item_type: ConfigItemType, path: &str) -> Result<NameValue> {
        let url = format!("config-items/{}/{}", item_type, path);
        let item = self.get_value(&url, &[])?;
        name_value(&item, &url)
    }

    /// Set an item's value. For system accounts `data` is `user:pass`.
    pub fn set_configuration_item(
        &mut self,
        item_type: ConfigItemType,
        path: &str,
        data: &str,
    ) -> Result<NameValue> {
        let url = format!("config-items/{}/{}", item_type, path);
        let body = encode_item_value(item_type, data)?;
        tracing::info!(%item_type, %path, "setting configuration item");

        let item = self
            .rest
            .put(&url, Payload::text(body))?
            .ok_or_else(|| crate::client::empty_response(&url))?;
        name_value(&item, &url)
    }

    pub fn list_configuration_items_by_type(&mut self, item_type: ConfigItemType) -> Result<Vec<NameValue>> {
        let url = format!("config-items/{}", item_type);
        self.get_list(&url, &[])?
            .iter()
            .map(|item| name_value(item, &url))
            .collect()
    }

    pub fn list_all_configuration_items(&mut self) -> Result<Vec<TypedNameValue>> {
        self.get_list("config-items", &[])?
            .iter()
            .map(|item| typed_name_value(item, "config-items"))
            .collect()
    }
}
