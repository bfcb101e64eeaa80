//! Runtime settings: defaults, optional JSON file, environment override.

use crate::Result;

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Overrides `graph_root` when set.
pub const GRAPH_ROOT_ENV: &str = "SURFACE_SYNC_GRAPH_ROOT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Graph path standing in for `/composition` when addresses are expanded.
    /// Must itself contain a `/composition` segment so paths collapse back.
    pub graph_root: String,

    /// Single argument that asks an endpoint for its current value.
    pub query_marker: String,

    /// Child of a control path that carries its outgoing value.
    pub value_out_suffix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            graph_root: "/composition".into(),
            query_marker: "?".into(),
            value_out_suffix: "valueOut".into(),
        }
    }
}

impl SyncConfig {
    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("read config file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parse config file {}", path.display()))?
            }
            None => SyncConfig::default(),
        };

        if let Ok(root) = std::env::var(GRAPH_ROOT_ENV) {
            config.graph_root = root;
        }
        Ok(config)
    }
}
