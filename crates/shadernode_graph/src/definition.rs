// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node definitions: the read-only templates nodes are created from.

use crate::error::{GraphError, Result};
use crate::variable::ShaderNodeVariable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Shader stage a node runs in.
///
/// Ordered so that sorting by stage puts vertex nodes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderType {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl fmt::Display for ShaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("Vertex"),
            Self::Fragment => f.write_str("Fragment"),
        }
    }
}

/// Template for a shader node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderNodeDefinition {
    /// Definition name, also the base name of created nodes
    pub name: String,
    /// Stage the node runs in
    pub shader_type: ShaderType,
    /// Declared inputs
    #[serde(default)]
    pub inputs: Vec<ShaderNodeVariable>,
    /// Declared outputs
    #[serde(default)]
    pub outputs: Vec<ShaderNodeVariable>,
    /// Shader source per language (`GLSL100` -> path)
    #[serde(default)]
    pub shader_paths: IndexMap<String, String>,
    /// Documentation shown in the editor
    #[serde(default)]
    pub documentation: String,
    /// The node writes no outputs and is always kept
    #[serde(default)]
    pub no_output: bool,
}

impl ShaderNodeDefinition {
    /// Create a definition with no variables
    pub fn new(name: impl Into<String>, shader_type: ShaderType) -> Self {
        Self {
            name: name.into(),
            shader_type,
            inputs: Vec::new(),
            outputs: Vec::new(),
            shader_paths: IndexMap::new(),
            documentation: String::new(),
            no_output: false,
        }
    }

    /// Add an input
    pub fn with_input(mut self, name: impl Into<String>, var_type: impl Into<String>) -> Self {
        let var = ShaderNodeVariable::node_variable(self.name.clone(), name, var_type);
        self.inputs.push(var);
        self
    }

    /// Add an output
    pub fn with_output(mut self, name: impl Into<String>, var_type: impl Into<String>) -> Self {
        let var = ShaderNodeVariable::node_variable(self.name.clone(), name, var_type);
        self.outputs.push(var);
        self
    }

    /// Set the shader source for a language
    pub fn with_shader(mut self, language: impl Into<String>, path: impl Into<String>) -> Self {
        self.shader_paths.insert(language.into(), path.into());
        self
    }

    /// Get a declared input by name
    pub fn input(&self, name: &str) -> Option<&ShaderNodeVariable> {
        self.inputs.iter().find(|v| v.name == name)
    }

    /// Get a declared output by name
    pub fn output(&self, name: &str) -> Option<&ShaderNodeVariable> {
        self.outputs.iter().find(|v| v.name == name)
    }

    /// Load every definition from a RON file holding a list of definitions
    pub fn load(path: &Path) -> Result<Vec<Self>> {
        let content = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|e| GraphError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Registry of loaded shader node definitions
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    definitions: IndexMap<String, Arc<ShaderNodeDefinition>>,
}

impl DefinitionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any with the same name
    pub fn register(&mut self, definition: ShaderNodeDefinition) -> Arc<ShaderNodeDefinition> {
        let definition = Arc::new(definition);
        self.definitions
            .insert(definition.name.clone(), Arc::clone(&definition));
        definition
    }

    /// Load and register all definitions from a file
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let definitions = ShaderNodeDefinition::load(path)?;
        let count = definitions.len();
        for definition in definitions {
            self.register(definition);
        }
        tracing::info!("Loaded {count} shader node definitions from {}", path.display());
        Ok(count)
    }

    /// Load every `.ron` file in a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir).map_err(|source| GraphError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| GraphError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("ron") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut total = 0;
        for path in paths {
            total += self.load_file(&path)?;
        }
        Ok(total)
    }

    /// Get a definition by name
    pub fn get(&self, name: &str) -> Option<&Arc<ShaderNodeDefinition>> {
        self.definitions.get(name)
    }

    /// Get a definition by name, failing if it is not loaded
    pub fn find_by_name(&self, name: &str) -> Result<Arc<ShaderNodeDefinition>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| GraphError::DefinitionNotFound(name.to_string()))
    }

    /// All definitions in load order
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<ShaderNodeDefinition>> {
        self.definitions.values()
    }

    /// Definitions for one stage
    pub fn definitions_for(
        &self,
        shader_type: ShaderType,
    ) -> impl Iterator<Item = &Arc<ShaderNodeDefinition>> {
        self.definitions
            .values()
            .filter(move |d| d.shader_type == shader_type)
    }

    /// Number of loaded definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definitions are loaded
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
