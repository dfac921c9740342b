// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notifications sent from the engine thread to the UI thread.
//!
//! Every state transition an operation makes is described by one
//! [`GraphEvent`]. Events are produced on the engine thread, moved across the
//! thread boundary and dispatched to a [`GraphObserver`] on the UI thread, so
//! views update incrementally without rescanning the graph.

use shadernode_graph::{MatParam, ShaderNode, ShaderNodeVariable, UniformBinding, VariableMapping};

/// Placement hint for a new element in the graph view
pub type Location = [f32; 2];

/// A single graph state transition
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// A node was added to the technique
    AddedShaderNode {
        /// The added node
        node: ShaderNode,
        /// Where to place it
        location: Location,
    },
    /// A node was removed from the technique
    RemovedShaderNode {
        /// Name of the removed node
        name: String,
    },
    /// A mapping was added to a node
    AddedMapping {
        /// Owning node
        node: String,
        /// The mapping
        mapping: VariableMapping,
    },
    /// A mapping was removed from a node
    RemovedMapping {
        /// Owning node
        node: String,
        /// The mapping
        mapping: VariableMapping,
    },
    /// A mapping was replaced by another writing the same slot
    ReplacedMapping {
        /// Owning node
        node: String,
        /// Mapping that was removed
        old: VariableMapping,
        /// Mapping that took its place
        new: VariableMapping,
    },
    /// A vertex attribute was declared
    AddedAttribute {
        /// The attribute
        variable: ShaderNodeVariable,
        /// Where to place it
        location: Location,
    },
    /// A vertex attribute was removed
    RemovedAttribute {
        /// The attribute
        variable: ShaderNodeVariable,
    },
    /// A standalone uniform was declared
    AddedUniform {
        /// The uniform
        variable: ShaderNodeVariable,
        /// Where to place it
        location: Location,
    },
    /// A standalone uniform was removed
    RemovedUniform {
        /// The uniform
        variable: ShaderNodeVariable,
    },
    /// A world parameter was bound
    AddedWorldParameter {
        /// The binding
        binding: UniformBinding,
        /// Where to place it
        location: Location,
    },
    /// A world parameter was unbound
    RemovedWorldParameter {
        /// The binding
        binding: UniformBinding,
    },
    /// A material parameter was added
    AddedMatParameter {
        /// The parameter
        param: MatParam,
        /// Where to place it
        location: Location,
    },
    /// A material parameter was removed
    RemovedMatParameter {
        /// The parameter
        param: MatParam,
    },
    /// A technique was added to the material
    AddedTechnique {
        /// Technique name
        name: String,
    },
    /// A technique was removed from the material
    RemovedTechnique {
        /// Technique name
        name: String,
    },
}

impl GraphEvent {
    /// Call the observer method matching this event
    pub fn dispatch(&self, observer: &mut dyn GraphObserver) {
        match self {
            Self::AddedShaderNode { node, location } => {
                observer.notify_added_shader_node(node, *location);
            }
            Self::RemovedShaderNode { name } => observer.notify_removed_shader_node(name),
            Self::AddedMapping { node, mapping } => observer.notify_added_mapping(node, mapping),
            Self::RemovedMapping { node, mapping } => {
                observer.notify_removed_mapping(node, mapping);
            }
            Self::ReplacedMapping { node, old, new } => {
                observer.notify_replaced_mapping(node, old, new);
            }
            Self::AddedAttribute { variable, location } => {
                observer.notify_added_attribute(variable, *location);
            }
            Self::RemovedAttribute { variable } => observer.notify_removed_attribute(variable),
            Self::AddedUniform { variable, location } => {
                observer.notify_added_uniform(variable, *location);
            }
            Self::RemovedUniform { variable } => observer.notify_removed_uniform(variable),
            Self::AddedWorldParameter { binding, location } => {
                observer.notify_added_world_parameter(*binding, *location);
            }
            Self::RemovedWorldParameter { binding } => {
                observer.notify_removed_world_parameter(*binding);
            }
            Self::AddedMatParameter { param, location } => {
                observer.notify_added_mat_parameter(param, *location);
            }
            Self::RemovedMatParameter { param } => observer.notify_removed_mat_parameter(param),
            Self::AddedTechnique { name } => observer.notify_added_technique(name),
            Self::RemovedTechnique { name } => observer.notify_removed_technique(name),
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddedShaderNode { .. } => "added_shader_node",
            Self::RemovedShaderNode { .. } => "removed_shader_node",
            Self::AddedMapping { .. } => "added_mapping",
            Self::RemovedMapping { .. } => "removed_mapping",
            Self::ReplacedMapping { .. } => "replaced_mapping",
            Self::AddedAttribute { .. } => "added_attribute",
            Self::RemovedAttribute { .. } => "removed_attribute",
            Self::AddedUniform { .. } => "added_uniform",
            Self::RemovedUniform { .. } => "removed_uniform",
            Self::AddedWorldParameter { .. } => "added_world_parameter",
            Self::RemovedWorldParameter { .. } => "removed_world_parameter",
            Self::AddedMatParameter { .. } => "added_mat_parameter",
            Self::RemovedMatParameter { .. } => "removed_mat_parameter",
            Self::AddedTechnique { .. } => "added_technique",
            Self::RemovedTechnique { .. } => "removed_technique",
        }
    }
}

/// Receiver of graph notifications on the UI thread.
///
/// Every method defaults to doing nothing, so a view only implements the
/// transitions it renders.
#[allow(unused_variables)]
pub trait GraphObserver {
    /// A node was added
    fn notify_added_shader_node(&mut self, node: &ShaderNode, location: Location) {}

    /// A node was removed
    fn notify_removed_shader_node(&mut self, name: &str) {}

    /// A mapping was added
    fn notify_added_mapping(&mut self, node: &str, mapping: &VariableMapping) {}

    /// A mapping was removed
    fn notify_removed_mapping(&mut self, node: &str, mapping: &VariableMapping) {}

    /// A mapping was replaced
    fn notify_replaced_mapping(
        &mut self,
        node: &str,
        old: &VariableMapping,
        new: &VariableMapping,
    ) {
    }

    /// An attribute was declared
    fn notify_added_attribute(&mut self, variable: &ShaderNodeVariable, location: Location) {}

    /// An attribute was removed
    fn notify_removed_attribute(&mut self, variable: &ShaderNodeVariable) {}

    /// A uniform was declared
    fn notify_added_uniform(&mut self, variable: &ShaderNodeVariable, location: Location) {}

    /// A uniform was removed
    fn notify_removed_uniform(&mut self, variable: &ShaderNodeVariable) {}

    /// A world parameter was bound
    fn notify_added_world_parameter(&mut self, binding: UniformBinding, location: Location) {}

    /// A world parameter was unbound
    fn notify_removed_world_parameter(&mut self, binding: UniformBinding) {}

    /// A material parameter was added
    fn notify_added_mat_parameter(&mut self, param: &MatParam, location: Location) {}

    /// A material parameter was removed
    fn notify_removed_mat_parameter(&mut self, param: &MatParam) {}

    /// A technique was added
    fn notify_added_technique(&mut self, name: &str) {}

    /// A technique was removed
    fn notify_removed_technique(&mut self, name: &str) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default)]
pub struct NullObserver;

impl GraphObserver for NullObserver {}
