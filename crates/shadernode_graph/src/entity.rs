// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph entities: everything a mapping can start or end at.

use crate::definition::ShaderType;
use crate::error::{GraphError, Result};
use crate::technique::TechniqueDef;
use crate::variable::{Namespace, ShaderNodeVariable};
use serde::{Deserialize, Serialize};

/// An endpoint kind in the graph.
///
/// Connection rules dispatch on the variant rather than on a type per
/// visual role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphEntity {
    /// A shader node
    Node {
        /// Node name
        name: String,
        /// Stage the node runs in
        shader_type: ShaderType,
    },
    /// A vertex attribute
    Attribute,
    /// A material parameter
    MaterialParam,
    /// An engine-supplied world parameter
    WorldParam,
    /// A global read by nodes (the incoming vertex position)
    GlobalInput,
    /// A global written by nodes
    GlobalOutput {
        /// Stage the global belongs to
        shader_type: ShaderType,
    },
}

impl GraphEntity {
    /// Entity for a node in a technique
    pub fn node(technique: &TechniqueDef, name: &str) -> Result<Self> {
        let node = technique.find_node(name)?;
        Ok(Self::Node {
            name: node.name.clone(),
            shader_type: node.shader_type(),
        })
    }

    /// Entity a variable belongs to when used as a mapping source
    pub fn source_of(technique: &TechniqueDef, variable: &ShaderNodeVariable) -> Result<Self> {
        match &variable.namespace {
            Namespace::Node(name) => Self::node(technique, name),
            Namespace::Attr => Ok(Self::Attribute),
            Namespace::MatParam => Ok(Self::MaterialParam),
            Namespace::WorldParam => Ok(Self::WorldParam),
            Namespace::Global => Ok(Self::GlobalInput),
        }
    }

    /// Entity a variable belongs to when used as a mapping target
    pub fn target_of(technique: &TechniqueDef, variable: &ShaderNodeVariable) -> Result<Self> {
        match &variable.namespace {
            Namespace::Node(name) => Self::node(technique, name),
            Namespace::Global => technique
                .generation_info
                .global_stage(variable)
                .map(|shader_type| Self::GlobalOutput { shader_type })
                .ok_or_else(|| GraphError::VariableNotFound {
                    namespace: variable.namespace.to_string(),
                    name: variable.name.clone(),
                }),
            Namespace::Attr => Ok(Self::Attribute),
            Namespace::MatParam => Ok(Self::MaterialParam),
            Namespace::WorldParam => Ok(Self::WorldParam),
        }
    }

    /// Whether the entity can receive a mapping
    pub fn can_be_input(&self) -> bool {
        matches!(self, Self::Node { .. } | Self::GlobalOutput { .. })
    }

    /// Whether the entity can be the source of a mapping
    pub fn can_be_output(&self) -> bool {
        !matches!(self, Self::GlobalOutput { .. })
    }

    /// Whether the entity is declared as a uniform
    pub fn is_uniform(&self) -> bool {
        matches!(self, Self::MaterialParam | Self::WorldParam)
    }

    /// Namespace of the entity's variables
    pub fn namespace(&self) -> Namespace {
        match self {
            Self::Node { name, .. } => Namespace::node(name.clone()),
            Self::Attribute => Namespace::Attr,
            Self::MaterialParam => Namespace::MatParam,
            Self::WorldParam => Namespace::WorldParam,
            Self::GlobalInput | Self::GlobalOutput { .. } => Namespace::Global,
        }
    }

    /// Stage of the entity, if bound to one
    pub fn shader_type(&self) -> Option<ShaderType> {
        match self {
            Self::Node { shader_type, .. } | Self::GlobalOutput { shader_type } => {
                Some(*shader_type)
            }
            Self::GlobalInput => Some(ShaderType::Vertex),
            Self::Attribute | Self::MaterialParam | Self::WorldParam => None,
        }
    }

    /// Node name, if the entity is a node
    pub fn node_name(&self) -> Option<&str> {
        match self {
            Self::Node { name, .. } => Some(name),
            _ => None,
        }
    }
}
