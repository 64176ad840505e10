use crate::client::{id_string, missing_field, OoClient};
use crate::error::{Error, Result};
use crate::http::Transport;
use serde_json::Value;
use std::collections::BTreeMap;

const FLOW_ENTRY_TYPE: &str = "FLOW";

impl<T: Transport> OoClient<T> {
    /// Id of the one deployed content pack called `name`.
    pub fn get_content_pack_id(&mut self, name: &str) -> Result<String> {
        let packs = self.get_list("content-packs", &[])?;
        let mut matches = packs
            .iter()
            .filter(|cp| cp.get("name").and_then(Value::as_str) == Some(name))
            .filter_map(|cp| cp.get("id").and_then(id_string));

        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(id),
            _ => Err(Error::content_pack_not_found(name)),
        }
    }

    /// Name of the content pack that ships the flow at `flow_path`.
    pub fn get_content_pack_from_flow(&mut self, flow_path: &str) -> Result<String> {
        let uuid = self.get_flow_uuid_from_path(flow_path)?;
        let path = format!("flows/{}", uuid);
        let flow = self.get_value(&path, &[])?;
        flow.get("cpName")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| missing_field("cpName", &path))
    }

    /// Flows in a content pack, keyed by flow id with their library path as value.
    pub fn get_all_flows_in_cp(&mut self, cp_name: &str) -> Result<BTreeMap<String, String>> {
        let cp_id = self.get_content_pack_id(cp_name)?;
        let tree = self.get_list(&format!("content-packs/{}/content-tree", cp_id), &[])?;

        Ok(tree
            .iter()
            .filter(|entry| entry.get("type").and_then(Value::as_str) == Some(FLOW_ENTRY_TYPE))
            .filter_map(|entry| {
                let id = entry.get("id").and_then(id_string)?;
                let path = entry.get("path").and_then(Value::as_str)?;
                Some((id, path.to_string()))
            })
            .collect())
    }
}
