// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node instances.

use crate::definition::{ShaderNodeDefinition, ShaderType};
use crate::error::{GraphError, Result};
use crate::mapping::{MappingList, VariableMapping};
use crate::variable::{Namespace, ShaderNodeVariable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A definition placed in a technique under a unique name.
///
/// Input mappings always target one of this node's inputs; output mappings
/// target globals. At most one input mapping exists per target slot
/// (variable plus left swizzle).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderNode {
    /// Node name, unique within the technique
    pub name: String,
    /// Shared definition
    pub definition: Arc<ShaderNodeDefinition>,
    /// Optional define condition
    pub condition: Option<String>,
    input_mapping: Vec<VariableMapping>,
    output_mapping: Vec<VariableMapping>,
}

impl ShaderNode {
    /// Create a node from a definition
    pub fn new(name: impl Into<String>, definition: Arc<ShaderNodeDefinition>) -> Self {
        Self {
            name: name.into(),
            definition,
            condition: None,
            input_mapping: Vec::new(),
            output_mapping: Vec::new(),
        }
    }

    /// Stage the node runs in
    pub fn shader_type(&self) -> ShaderType {
        self.definition.shader_type
    }

    /// Namespace of this node's variables
    pub fn namespace(&self) -> Namespace {
        Namespace::node(self.name.clone())
    }

    /// Declared inputs, namespaced to this node
    pub fn inputs(&self) -> impl Iterator<Item = ShaderNodeVariable> + '_ {
        let namespace = self.namespace();
        self.definition
            .inputs
            .iter()
            .map(move |v| v.in_namespace(namespace.clone()))
    }

    /// Declared outputs, namespaced to this node
    pub fn outputs(&self) -> impl Iterator<Item = ShaderNodeVariable> + '_ {
        let namespace = self.namespace();
        self.definition
            .outputs
            .iter()
            .map(move |v| v.in_namespace(namespace.clone()))
    }

    /// Find a declared input
    pub fn find_input(&self, name: &str) -> Result<ShaderNodeVariable> {
        self.definition
            .input(name)
            .map(|v| v.in_namespace(self.namespace()))
            .ok_or_else(|| self.missing(name))
    }

    /// Find a declared output
    pub fn find_output(&self, name: &str) -> Result<ShaderNodeVariable> {
        self.definition
            .output(name)
            .map(|v| v.in_namespace(self.namespace()))
            .ok_or_else(|| self.missing(name))
    }

    /// Whether `variable` is one of this node's declared outputs
    pub fn declares_output(&self, variable: &ShaderNodeVariable) -> bool {
        variable.node_name() == Some(self.name.as_str())
            && self.definition.output(&variable.name).is_some()
    }

    fn missing(&self, name: &str) -> GraphError {
        GraphError::VariableNotFound {
            namespace: self.name.clone(),
            name: name.to_string(),
        }
    }

    /// Input mappings
    pub fn input_mapping(&self) -> &[VariableMapping] {
        &self.input_mapping
    }

    /// Output mappings
    pub fn output_mapping(&self) -> &[VariableMapping] {
        &self.output_mapping
    }

    /// One of the two mapping lists
    pub fn mappings(&self, list: MappingList) -> &[VariableMapping] {
        match list {
            MappingList::Input => &self.input_mapping,
            MappingList::Output => &self.output_mapping,
        }
    }

    /// Mutable access to one of the two mapping lists
    pub fn mappings_mut(&mut self, list: MappingList) -> &mut Vec<VariableMapping> {
        match list {
            MappingList::Input => &mut self.input_mapping,
            MappingList::Output => &mut self.output_mapping,
        }
    }

    /// All mappings, inputs first
    pub fn all_mappings(&self) -> impl Iterator<Item = &VariableMapping> {
        self.input_mapping.iter().chain(self.output_mapping.iter())
    }

    /// Mapping currently writing the given target slot
    pub fn find_mapping(
        &self,
        list: MappingList,
        target: &VariableMapping,
    ) -> Option<&VariableMapping> {
        self.mappings(list).iter().find(|m| m.same_target(target))
    }

    /// Position of a mapping in its list
    pub fn mapping_index(&self, list: MappingList, mapping: &VariableMapping) -> Option<usize> {
        self.mappings(list).iter().position(|m| m == mapping)
    }

    /// Add a mapping, replacing one that writes the same slot.
    ///
    /// Returns the replaced mapping and its index.
    pub fn set_mapping(&mut self, mapping: VariableMapping) -> Option<(usize, VariableMapping)> {
        let list = mapping.list_for(&self.name);
        let mappings = self.mappings_mut(list);
        match mappings.iter().position(|m| m.same_target(&mapping)) {
            Some(index) => {
                let old = std::mem::replace(&mut mappings[index], mapping);
                Some((index, old))
            }
            None => {
                mappings.push(mapping);
                None
            }
        }
    }

    /// Remove a mapping, returning its former index
    pub fn remove_mapping(&mut self, mapping: &VariableMapping) -> Option<usize> {
        let list = mapping.list_for(&self.name);
        let mappings = self.mappings_mut(list);
        let index = mappings.iter().position(|m| m == mapping)?;
        mappings.remove(index);
        Some(index)
    }

    /// Insert a mapping at an index (clamped to the list length)
    pub fn insert_mapping(&mut self, index: usize, mapping: VariableMapping) {
        let list = mapping.list_for(&self.name);
        let mappings = self.mappings_mut(list);
        let index = index.min(mappings.len());
        mappings.insert(index, mapping);
    }

    /// Names of nodes this node reads from
    pub fn producers(&self) -> impl Iterator<Item = &str> {
        self.input_mapping
            .iter()
            .filter_map(|m| m.right_variable())
            .filter_map(ShaderNodeVariable::node_name)
    }

    /// Whether any output mapping writes a global
    pub fn writes_global(&self) -> bool {
        self.output_mapping
            .iter()
            .any(|m| m.left_variable().is_in(&Namespace::Global))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mix_node(name: &str) -> ShaderNode {
        let definition = ShaderNodeDefinition::new("Mix", ShaderType::Fragment)
            .with_input("color1", "vec4")
            .with_input("color2", "vec4")
            .with_output("outColor", "vec4");
        ShaderNode::new(name, Arc::new(definition))
    }

    #[test]
    fn test_variables_are_namespaced() {
        let node = mix_node("Mix2");
        let input = node.find_input("color1").unwrap();
        assert_eq!(input.node_name(), Some("Mix2"));
        assert_eq!(node.outputs().count(), 1);
        assert!(node.declares_output(&node.find_output("outColor").unwrap()));
        assert!(node.find_input("missing").is_err());
    }

    #[test]
    fn test_set_mapping_replaces_slot() {
        let mut node = mix_node("Mix");
        let left = node.find_input("color1").unwrap();

        let first =
            VariableMapping::new(left.clone(), ShaderNodeVariable::material_parameter("A", "vec4"));
        let second =
            VariableMapping::new(left, ShaderNodeVariable::material_parameter("B", "vec4"));

        assert!(node.set_mapping(first.clone()).is_none());
        let replaced = node.set_mapping(second.clone());
        assert_eq!(replaced, Some((0, first)));
        assert_eq!(node.input_mapping(), &[second]);
    }

    #[test]
    fn test_remove_and_insert_keep_position() {
        let mut node = mix_node("Mix");
        let a = VariableMapping::new(
            node.find_input("color1").unwrap(),
            ShaderNodeVariable::material_parameter("A", "vec4"),
        );
        let b = VariableMapping::new(
            node.find_input("color2").unwrap(),
            ShaderNodeVariable::material_parameter("B", "vec4"),
        );
        node.set_mapping(a.clone());
        node.set_mapping(b.clone());

        let index = node.remove_mapping(&a).unwrap();
        assert_eq!(index, 0);
        node.insert_mapping(index, a.clone());
        assert_eq!(node.input_mapping(), &[a, b]);
    }

    #[test]
    fn test_output_mapping_list() {
        let mut node = mix_node("Mix");
        let out = VariableMapping::new(
            ShaderNodeVariable::global("color", "vec4"),
            node.find_output("outColor").unwrap(),
        );
        node.set_mapping(out);
        assert_eq!(node.output_mapping().len(), 1);
        assert!(node.writes_global());
    }
}
