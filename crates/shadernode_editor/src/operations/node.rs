// SPDX-License-Identifier: MIT OR Apache-2.0
//! Adding and removing shader nodes.

use crate::events::{GraphEvent, Location};
use crate::operation::{detach_references, restore_references, GraphOperation, OperationError};
use shadernode_graph::generation_info::insert_variable;
use shadernode_graph::{
    MappingRef, MaterialDef, Namespace, ShaderNode, ShaderNodeDefinition, ShaderNodeVariable,
    TechniqueDef,
};
use std::sync::Arc;

/// Add a node and keep the vertex/fragment partition
#[derive(Debug)]
pub struct AddShaderNodeOperation {
    description: String,
    technique: String,
    node: ShaderNode,
    location: Location,
    previous_order: Vec<String>,
    previous_unused: Vec<String>,
}

impl AddShaderNodeOperation {
    /// Create a new add operation for a ready-made node
    pub fn new(technique: impl Into<String>, node: ShaderNode, location: Location) -> Self {
        Self {
            description: format!("Add node {}", node.name),
            technique: technique.into(),
            node,
            location,
            previous_order: Vec::new(),
            previous_unused: Vec::new(),
        }
    }

    /// Create a node for a definition, named after it with a numeric
    /// suffix on collision
    pub fn from_definition(
        technique: &TechniqueDef,
        definition: Arc<ShaderNodeDefinition>,
        location: Location,
    ) -> Self {
        let name = technique.unique_node_name(&definition.name);
        Self::new(technique.name.clone(), ShaderNode::new(name, definition), location)
    }

    /// Name of the node this operation adds
    pub fn node_name(&self) -> &str {
        &self.node.name
    }
}

impl GraphOperation for AddShaderNodeOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        if technique.contains_node(&self.node.name) {
            return Err(OperationError::AlreadyDeclared(self.node.name.clone()));
        }

        self.previous_order = technique.node_names();
        self.previous_unused = technique.generation_info.unused_nodes.clone();

        technique.push_node(self.node.clone());
        technique.repartition();
        if !self.node.definition.no_output {
            technique.generation_info.mark_unused(&self.node.name);
        }

        Ok(vec![GraphEvent::AddedShaderNode {
            node: self.node.clone(),
            location: self.location,
        }])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        technique.remove_node(&self.node.name);
        technique.reorder(&self.previous_order);
        technique.generation_info.unused_nodes = std::mem::take(&mut self.previous_unused);

        Ok(vec![GraphEvent::RemovedShaderNode {
            name: self.node.name.clone(),
        }])
    }
}

/// Remove a node along with every mapping reading from it
#[derive(Debug)]
pub struct RemoveShaderNodeOperation {
    description: String,
    technique: String,
    name: String,
    location: Location,
    removed: Option<(usize, ShaderNode)>,
    references: Vec<MappingRef>,
    varyings: Vec<(usize, ShaderNodeVariable)>,
    unused_index: Option<usize>,
}

impl RemoveShaderNodeOperation {
    /// Create a new remove operation
    pub fn new(technique: impl Into<String>, name: impl Into<String>, location: Location) -> Self {
        let name = name.into();
        Self {
            description: format!("Remove node {name}"),
            technique: technique.into(),
            name,
            location,
            removed: None,
            references: Vec::new(),
            varyings: Vec::new(),
            unused_index: None,
        }
    }

    /// Mappings of other nodes detached by the last redo
    pub fn references(&self) -> &[MappingRef] {
        &self.references
    }
}

impl GraphOperation for RemoveShaderNodeOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        technique.find_node(&self.name)?;

        let namespace = Namespace::node(self.name.clone());
        self.references = technique.references_to(&namespace);
        self.references.retain(|r| r.owner != self.name);
        let mut events = detach_references(technique, &self.references);

        self.varyings.clear();
        let varyings = &mut technique.generation_info.varyings;
        let mut index = 0;
        while index < varyings.len() {
            if varyings[index].is_in(&namespace) {
                // Recorded against the list as it shrinks, so reinsertion in
                // reverse lands each one back in place.
                self.varyings.push((index, varyings.remove(index)));
            } else {
                index += 1;
            }
        }
        self.unused_index = technique.generation_info.mark_used(&self.name);
        self.removed = technique.remove_node(&self.name);

        events.push(GraphEvent::RemovedShaderNode {
            name: self.name.clone(),
        });
        Ok(events)
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        let Some((index, node)) = self.removed.take() else {
            return Err(OperationError::InvalidOperation(format!("{} was not removed", self.name)));
        };

        let mut events = vec![GraphEvent::AddedShaderNode {
            node: node.clone(),
            location: self.location,
        }];
        technique.insert_node(index, node);
        if let Some(index) = self.unused_index.take() {
            technique.generation_info.restore_unused(index, &self.name);
        }
        for (index, varying) in self.varyings.drain(..).rev() {
            insert_variable(&mut technique.generation_info.varyings, index, varying);
        }
        events.extend(restore_references(technique, &self.references));
        Ok(events)
    }
}
