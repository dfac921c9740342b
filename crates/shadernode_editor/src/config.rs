// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings, stored as RON.

use crate::events::Location;
use crate::history::MAX_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings of the graph editor core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo entries
    pub history_depth: usize,
    /// Name of the engine thread
    pub engine_thread_name: String,
    /// Tracing filter directive used when `RUST_LOG` is unset
    pub log_directive: String,
    /// Step between default placement hints
    pub node_spacing: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: MAX_HISTORY,
            engine_thread_name: "shadernode-engine".to_string(),
            log_directive: "shadernode_editor=debug".to_string(),
            node_spacing: 40.0,
        }
    }
}

impl EditorConfig {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        ron::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Placement hint for the `index`-th element added without a position
    pub fn default_location(&self, index: usize) -> Location {
        let offset = self.node_spacing * index as f32;
        [offset, offset]
    }
}
