// SPDX-License-Identifier: MIT OR Apache-2.0
//! Detach operation: removing a single mapping.

use crate::events::GraphEvent;
use crate::operation::{GraphOperation, OperationError};
use shadernode_graph::{MappingList, MaterialDef, VariableMapping};

/// Remove one mapping from a node's input or output list
#[derive(Debug)]
pub struct DetachMappingOperation {
    description: String,
    technique: String,
    node: String,
    list: MappingList,
    mapping: VariableMapping,
    index: Option<usize>,
}

impl DetachMappingOperation {
    fn new(technique: &str, node: &str, list: MappingList, mapping: VariableMapping) -> Self {
        Self {
            description: format!("Detach {mapping}"),
            technique: technique.to_string(),
            node: node.to_string(),
            list,
            mapping,
            index: None,
        }
    }

    /// Detach a mapping feeding one of the node's inputs
    pub fn input(technique: &str, node: &str, mapping: VariableMapping) -> Self {
        Self::new(technique, node, MappingList::Input, mapping)
    }

    /// Detach a mapping from the node's output list
    pub fn output(technique: &str, node: &str, mapping: VariableMapping) -> Self {
        Self::new(technique, node, MappingList::Output, mapping)
    }

    /// The list this operation removes from
    pub fn list(&self) -> MappingList {
        self.list
    }
}

impl GraphOperation for DetachMappingOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let node = material.technique_mut(&self.technique)?.find_node_mut(&self.node)?;
        let mappings = node.mappings_mut(self.list);
        let index = mappings
            .iter()
            .position(|m| m == &self.mapping)
            .ok_or_else(|| {
                OperationError::InvalidOperation(format!(
                    "{} has no mapping {}",
                    self.node, self.mapping
                ))
            })?;
        mappings.remove(index);
        self.index = Some(index);

        Ok(vec![GraphEvent::RemovedMapping {
            node: self.node.clone(),
            mapping: self.mapping.clone(),
        }])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let node = material.technique_mut(&self.technique)?.find_node_mut(&self.node)?;
        let mappings = node.mappings_mut(self.list);
        let index = self.index.take().unwrap_or(mappings.len()).min(mappings.len());
        mappings.insert(index, self.mapping.clone());

        Ok(vec![GraphEvent::AddedMapping {
            node: self.node.clone(),
            mapping: self.mapping.clone(),
        }])
    }
}
