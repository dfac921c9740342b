// SPDX-License-Identifier: MIT OR Apache-2.0
//! Technique definition: the ordered node graph of one technique.

use crate::definition::ShaderType;
use crate::error::{GraphError, Result};
use crate::generation_info::ShaderGenerationInfo;
use crate::mapping::{MappingList, VariableMapping};
use crate::material::UniformBinding;
use crate::node::ShaderNode;
use crate::variable::Namespace;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A node graph for one technique.
///
/// Nodes are kept partitioned: every vertex node precedes every fragment
/// node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechniqueDef {
    /// Technique name
    pub name: String,
    shader_nodes: Vec<ShaderNode>,
    /// Engine-supplied uniforms the technique uses
    pub world_bindings: Vec<UniformBinding>,
    /// Generator bookkeeping
    pub generation_info: ShaderGenerationInfo,
}

impl TechniqueDef {
    /// Create an empty technique
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader_nodes: Vec::new(),
            world_bindings: Vec::new(),
            generation_info: ShaderGenerationInfo::new(),
        }
    }

    /// Nodes in generation order
    pub fn shader_nodes(&self) -> &[ShaderNode] {
        &self.shader_nodes
    }

    /// Node names in generation order
    pub fn node_names(&self) -> Vec<String> {
        self.shader_nodes.iter().map(|n| n.name.clone()).collect()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.shader_nodes.len()
    }

    /// Get a node by name
    pub fn node(&self, name: &str) -> Option<&ShaderNode> {
        self.shader_nodes.iter().find(|n| n.name == name)
    }

    /// Get a mutable node by name
    pub fn node_mut(&mut self, name: &str) -> Option<&mut ShaderNode> {
        self.shader_nodes.iter_mut().find(|n| n.name == name)
    }

    /// Get a node by name, failing if it does not exist
    pub fn find_node(&self, name: &str) -> Result<&ShaderNode> {
        self.node(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))
    }

    /// Get a mutable node by name, failing if it does not exist
    pub fn find_node_mut(&mut self, name: &str) -> Result<&mut ShaderNode> {
        self.node_mut(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))
    }

    /// Position of a node in the list
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.shader_nodes.iter().position(|n| n.name == name)
    }

    /// Whether a node with this name exists
    pub fn contains_node(&self, name: &str) -> bool {
        self.node_index(name).is_some()
    }

    /// First free name for a node: `base`, `base1`, `base2`, ...
    pub fn unique_node_name(&self, base: &str) -> String {
        if !self.contains_node(base) {
            return base.to_string();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}{suffix}");
            if !self.contains_node(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Append a node without repartitioning
    pub fn push_node(&mut self, node: ShaderNode) {
        self.shader_nodes.push(node);
    }

    /// Insert a node at an index (clamped to the list length)
    pub fn insert_node(&mut self, index: usize, node: ShaderNode) {
        let index = index.min(self.shader_nodes.len());
        self.shader_nodes.insert(index, node);
    }

    /// Remove a node by name, returning its index and the node
    pub fn remove_node(&mut self, name: &str) -> Option<(usize, ShaderNode)> {
        let index = self.node_index(name)?;
        Some((index, self.shader_nodes.remove(index)))
    }

    /// Stable sort into vertex nodes followed by fragment nodes
    pub fn repartition(&mut self) {
        self.shader_nodes.sort_by_key(ShaderNode::shader_type);
    }

    /// Whether no fragment node precedes a vertex node
    pub fn check_partition(&self) -> bool {
        self.shader_nodes
            .windows(2)
            .all(|pair| pair[0].shader_type() <= pair[1].shader_type())
    }

    /// Move a node so it sits at `index`, shifting the nodes in between
    pub fn move_node(&mut self, name: &str, index: usize) -> Result<()> {
        let from = self
            .node_index(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;
        let node = self.shader_nodes.remove(from);
        let index = index.min(self.shader_nodes.len());
        self.shader_nodes.insert(index, node);
        Ok(())
    }

    /// Reorder nodes to follow a list of names.
    ///
    /// Names not present are ignored; nodes not named keep their relative
    /// order after the named ones.
    pub fn reorder(&mut self, order: &[String]) {
        let mut remaining = std::mem::take(&mut self.shader_nodes);
        let mut ordered = Vec::with_capacity(remaining.len());
        for name in order {
            if let Some(index) = remaining.iter().position(|n| &n.name == name) {
                ordered.push(remaining.remove(index));
            }
        }
        ordered.append(&mut remaining);
        self.shader_nodes = ordered;
    }

    /// Every mapping in the technique that reads from a namespace
    pub fn references_to(&self, namespace: &Namespace) -> Vec<MappingRef> {
        self.find_references(|m| m.reads_from(namespace))
    }

    /// Every mapping matching a predicate, in node and list order
    pub fn find_references(&self, predicate: impl Fn(&VariableMapping) -> bool) -> Vec<MappingRef> {
        let mut refs = Vec::new();
        for node in &self.shader_nodes {
            for list in [MappingList::Input, MappingList::Output] {
                for (index, mapping) in node.mappings(list).iter().enumerate() {
                    if predicate(mapping) {
                        refs.push(MappingRef {
                            owner: node.name.clone(),
                            list,
                            index,
                            mapping: mapping.clone(),
                        });
                    }
                }
            }
        }
        refs
    }

    /// Names of every node the given node reads from, directly or not
    pub fn upstream_nodes(&self, name: &str) -> Vec<String> {
        let mut seen = IndexSet::new();
        let mut stack = vec![name.to_string()];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(&current) else {
                continue;
            };
            for producer in node.producers() {
                if producer != name && seen.insert(producer.to_string()) {
                    stack.push(producer.to_string());
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Names of nodes nothing reachable from a global output depends on.
    ///
    /// A node is used when it writes a global, has no outputs at all, or
    /// feeds a used node.
    pub fn compute_unused_nodes(&self) -> Vec<String> {
        let mut used = IndexSet::new();
        for node in &self.shader_nodes {
            if node.writes_global() || node.definition.no_output {
                used.insert(node.name.clone());
                for upstream in self.upstream_nodes(&node.name) {
                    used.insert(upstream);
                }
            }
        }
        self.shader_nodes
            .iter()
            .filter(|n| !used.contains(&n.name))
            .map(|n| n.name.clone())
            .collect()
    }

    /// Whether a world binding is declared
    pub fn has_world_binding(&self, binding: UniformBinding) -> bool {
        self.world_bindings.contains(&binding)
    }

    /// Stage of a node, if it exists
    pub fn stage_of(&self, name: &str) -> Option<ShaderType> {
        self.node(name).map(ShaderNode::shader_type)
    }
}

/// A mapping located in the graph by owner, list and position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRef {
    /// Name of the node owning the mapping
    pub owner: String,
    /// List holding the mapping
    pub list: MappingList,
    /// Index within the list
    pub index: usize,
    /// The mapping itself
    pub mapping: VariableMapping,
}
