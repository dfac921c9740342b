// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reversible graph operations.
//!
//! An operation mutates the material on the engine thread and reports what it
//! changed as [`GraphEvent`]s. Everything needed to invert the change is
//! captured while it is applied, never re-derived at undo time.

use crate::events::GraphEvent;
use crate::gesture::ConnectionError;
use shadernode_graph::{GraphError, MappingRef, MaterialDef, TechniqueDef, VariableMapping};
use std::fmt;

/// Trait for graph operations that can be undone/redone
pub trait GraphOperation: Send + fmt::Debug {
    /// Get a description of this operation
    fn description(&self) -> &str;

    /// Apply (or re-apply) the operation
    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError>;

    /// Revert the operation
    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError>;
}

/// Error type for operation execution
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Graph lookup failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Connection rejected
    #[error("Connection rejected: {0}")]
    Connection(#[from] ConnectionError),

    /// Declaration already exists
    #[error("Already declared: {0}")]
    AlreadyDeclared(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Replacement of a node's mapping for one target slot.
///
/// The attach operations share this as their base behavior and add their
/// own side effects around it.
#[derive(Debug, Clone)]
pub struct MappingSwap {
    /// Node owning the mapping
    pub node: String,
    /// Mapping put in place
    pub new_mapping: VariableMapping,
    /// Mapping it replaces, if any
    pub old_mapping: Option<VariableMapping>,
    old_index: Option<usize>,
}

impl MappingSwap {
    /// Create a new swap
    pub fn new(
        node: impl Into<String>,
        new_mapping: VariableMapping,
        old_mapping: Option<VariableMapping>,
    ) -> Self {
        Self {
            node: node.into(),
            new_mapping,
            old_mapping,
            old_index: None,
        }
    }

    /// Remove the old mapping and put the new one in its place
    pub fn apply(&mut self, technique: &mut TechniqueDef) -> Result<GraphEvent, OperationError> {
        let node = technique.find_node_mut(&self.node)?;
        self.old_index = self
            .old_mapping
            .as_ref()
            .and_then(|old| node.remove_mapping(old));
        node.insert_mapping(self.old_index.unwrap_or(usize::MAX), self.new_mapping.clone());

        Ok(match (&self.old_mapping, self.old_index) {
            (Some(old), Some(_)) => GraphEvent::ReplacedMapping {
                node: self.node.clone(),
                old: old.clone(),
                new: self.new_mapping.clone(),
            },
            _ => GraphEvent::AddedMapping {
                node: self.node.clone(),
                mapping: self.new_mapping.clone(),
            },
        })
    }

    /// Remove the new mapping and restore the old one
    pub fn revert(&mut self, technique: &mut TechniqueDef) -> Result<GraphEvent, OperationError> {
        let node = technique.find_node_mut(&self.node)?;
        node.remove_mapping(&self.new_mapping);

        Ok(match (&self.old_mapping, self.old_index.take()) {
            (Some(old), Some(index)) => {
                node.insert_mapping(index, old.clone());
                GraphEvent::ReplacedMapping {
                    node: self.node.clone(),
                    old: self.new_mapping.clone(),
                    new: old.clone(),
                }
            }
            _ => GraphEvent::RemovedMapping {
                node: self.node.clone(),
                mapping: self.new_mapping.clone(),
            },
        })
    }
}

/// Remove located mappings from the technique.
///
/// `refs` must be in graph order (as returned by
/// [`TechniqueDef::find_references`]); they are removed back to front so the
/// recorded indices stay valid.
pub(crate) fn detach_references(
    technique: &mut TechniqueDef,
    refs: &[MappingRef],
) -> Vec<GraphEvent> {
    for r in refs.iter().rev() {
        if let Some(node) = technique.node_mut(&r.owner) {
            let mappings = node.mappings_mut(r.list);
            debug_assert_eq!(mappings.get(r.index), Some(&r.mapping));
            if mappings.get(r.index) == Some(&r.mapping) {
                mappings.remove(r.index);
            }
        }
    }
    refs.iter()
        .map(|r| GraphEvent::RemovedMapping {
            node: r.owner.clone(),
            mapping: r.mapping.clone(),
        })
        .collect()
}

/// Put mappings removed by [`detach_references`] back where they were
pub(crate) fn restore_references(
    technique: &mut TechniqueDef,
    refs: &[MappingRef],
) -> Vec<GraphEvent> {
    for r in refs {
        if let Some(node) = technique.node_mut(&r.owner) {
            let mappings = node.mappings_mut(r.list);
            let index = r.index.min(mappings.len());
            mappings.insert(index, r.mapping.clone());
        }
    }
    refs.iter()
        .map(|r| GraphEvent::AddedMapping {
            node: r.owner.clone(),
            mapping: r.mapping.clone(),
        })
        .collect()
}
