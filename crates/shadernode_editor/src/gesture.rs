// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolution of attach/detach gestures into operations.
//!
//! A drop gesture names a source and a target variable. The resolver checks
//! the connection is legal, computes the swizzles bridging the two types,
//! and picks the operation carrying the right side effects. A gesture that
//! would recreate the current mapping yields no operation at all, so it never
//! reaches the history.

use crate::events::Location;
use crate::operation::{GraphOperation, OperationError};
use crate::operations::{
    AddShaderNodeOperation, AttachMappingOperation, AttachToGlobalNodeOperation,
    AttachUniformToShaderNodeOperation, AttachVarToShaderNodeOperation, DetachMappingOperation,
};
use shadernode_graph::{
    swizzle, GraphEntity, GraphError, MappingList, MaterialDef, Namespace, ShaderNodeDefinition,
    ShaderNodeVariable, ShaderType, TechniqueDef, UniformBinding, VariableMapping,
};
use std::sync::Arc;

/// Reason a connection is refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The source cannot be read from
    #[error("{0} cannot be used as a source")]
    NotAnOutput(String),

    /// The target cannot be written to
    #[error("{0} cannot be used as a target")]
    NotAnInput(String),

    /// Source and target are the same node
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// No swizzle bridges the two types
    #[error("Incompatible types: {source_type} -> {target_type}")]
    IncompatibleTypes {
        /// Type of the source
        source_type: String,
        /// Type of the target
        target_type: String,
    },

    /// The source is not available in the target's stage
    #[error("{variable} cannot feed the {target} stage")]
    StageMismatch {
        /// Source variable
        variable: String,
        /// Target stage
        target: ShaderType,
    },
}

/// One end of a connection: the entity and its variable
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Entity owning the variable
    pub entity: GraphEntity,
    /// The variable as declared in the graph
    pub variable: ShaderNodeVariable,
}

impl Endpoint {
    /// Resolve a variable used as a mapping source
    pub fn source(
        material: &MaterialDef,
        technique: &TechniqueDef,
        variable: &ShaderNodeVariable,
    ) -> Result<Self, GraphError> {
        let entity = GraphEntity::source_of(technique, variable)?;
        let declared = match &variable.namespace {
            Namespace::Node(name) => technique.find_node(name)?.find_output(&variable.name)?,
            Namespace::Global => {
                let global = &technique.generation_info.vertex_global;
                if global != variable {
                    return Err(not_found(variable));
                }
                global.clone()
            }
            _ => declared_uniform_or_attribute(material, technique, variable)?,
        };
        Ok(Self {
            entity,
            variable: declared,
        })
    }

    /// Resolve a variable used as a mapping target
    pub fn target(
        material: &MaterialDef,
        technique: &TechniqueDef,
        variable: &ShaderNodeVariable,
    ) -> Result<Self, GraphError> {
        let entity = GraphEntity::target_of(technique, variable)?;
        let declared = match &variable.namespace {
            Namespace::Node(name) => technique.find_node(name)?.find_input(&variable.name)?,
            Namespace::Global => {
                let info = &technique.generation_info;
                std::iter::once(&info.vertex_global)
                    .chain(info.fragment_globals.iter())
                    .find(|g| *g == variable)
                    .cloned()
                    .ok_or_else(|| not_found(variable))?
            }
            _ => declared_uniform_or_attribute(material, technique, variable)?,
        };
        Ok(Self {
            entity,
            variable: declared,
        })
    }
}

fn declared_uniform_or_attribute(
    material: &MaterialDef,
    technique: &TechniqueDef,
    variable: &ShaderNodeVariable,
) -> Result<ShaderNodeVariable, GraphError> {
    match &variable.namespace {
        Namespace::MatParam => Ok(material.find_mat_param(&variable.name)?.variable()),
        Namespace::WorldParam => UniformBinding::from_name(&variable.name)
            .filter(|b| technique.has_world_binding(*b))
            .map(UniformBinding::variable)
            .ok_or_else(|| not_found(variable)),
        Namespace::Attr => technique
            .generation_info
            .attributes
            .iter()
            .find(|a| *a == variable)
            .cloned()
            .ok_or_else(|| not_found(variable)),
        Namespace::Node(_) | Namespace::Global => Err(not_found(variable)),
    }
}

fn not_found(variable: &ShaderNodeVariable) -> GraphError {
    GraphError::VariableNotFound {
        namespace: variable.namespace.to_string(),
        name: variable.name.clone(),
    }
}

/// Check whether `source` may be mapped onto `target`
pub fn check_attach(source: &Endpoint, target: &Endpoint) -> Result<(), ConnectionError> {
    if !source.entity.can_be_output() {
        return Err(ConnectionError::NotAnOutput(source.variable.to_string()));
    }
    if !target.entity.can_be_input() {
        return Err(ConnectionError::NotAnInput(target.variable.to_string()));
    }

    if let (Some(from), Some(to)) = (source.entity.node_name(), target.entity.node_name()) {
        if from == to {
            return Err(ConnectionError::SelfLoop);
        }
    }

    let stage_mismatch = |target_stage| ConnectionError::StageMismatch {
        variable: source.variable.to_string(),
        target: target_stage,
    };

    if let Some(target_stage) = target.entity.shader_type() {
        match &source.entity {
            // Globals are written by nodes of their own stage only
            _ if matches!(target.entity, GraphEntity::GlobalOutput { .. }) => {
                let from_node = source.entity.node_name().is_some();
                match source.entity.shader_type() {
                    Some(stage) if stage == target_stage && from_node => {}
                    Some(stage) if stage != target_stage => {
                        return Err(stage_mismatch(target_stage));
                    }
                    _ => return Err(ConnectionError::NotAnOutput(source.variable.to_string())),
                }
            }
            GraphEntity::Attribute | GraphEntity::GlobalInput
                if target_stage != ShaderType::Vertex =>
            {
                return Err(stage_mismatch(target_stage));
            }
            GraphEntity::Node { shader_type, .. } if *shader_type > target_stage => {
                return Err(stage_mismatch(target_stage));
            }
            _ => {}
        }
    }

    if !swizzle::can_connect(&source.variable.var_type, &target.variable.var_type) {
        return Err(ConnectionError::IncompatibleTypes {
            source_type: source.variable.var_type.clone(),
            target_type: target.variable.var_type.clone(),
        });
    }

    Ok(())
}

/// Whether `source` may be mapped onto `target`
pub fn can_attach(source: &Endpoint, target: &Endpoint) -> bool {
    match check_attach(source, target) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Rejected {} -> {}: {e}", source.variable, target.variable);
            false
        }
    }
}

/// Build the mapping for a legal connection, swizzles included
pub fn build_mapping(
    source: &Endpoint,
    target: &Endpoint,
) -> Result<VariableMapping, ConnectionError> {
    check_attach(source, target)?;
    let source_type = &source.variable.var_type;
    let target_type = &target.variable.var_type;
    let swizzles = swizzle::resolve(source_type, target_type).ok_or_else(|| {
        ConnectionError::IncompatibleTypes {
            source_type: source_type.clone(),
            target_type: target_type.clone(),
        }
    })?;
    Ok(VariableMapping::new(target.variable.clone(), source.variable.clone())
        .with_left_swizzle(swizzles.left)
        .with_right_swizzle(swizzles.right))
}

/// Turn an attach gesture into an operation.
///
/// Returns `Ok(None)` when the resulting mapping equals the one already in
/// place.
pub fn plan_attach(
    material: &MaterialDef,
    technique_name: &str,
    source: &ShaderNodeVariable,
    target: &ShaderNodeVariable,
) -> Result<Option<Box<dyn GraphOperation>>, OperationError> {
    let technique = material.technique(technique_name)?;
    let source = Endpoint::source(material, technique, source)?;
    let target = Endpoint::target(material, technique, target)?;
    let mapping = build_mapping(&source, &target)?;

    let operation: Box<dyn GraphOperation> = match (&source.entity, &target.entity) {
        (GraphEntity::Node { name: producer, .. }, GraphEntity::GlobalOutput { .. }) => {
            let old = technique
                .find_node(producer)?
                .find_mapping(MappingList::Output, &mapping)
                .cloned();
            if old.as_ref() == Some(&mapping) {
                return Ok(None);
            }
            let mut used_nodes = vec![producer.clone()];
            used_nodes.extend(technique.upstream_nodes(producer));
            Box::new(AttachToGlobalNodeOperation::new(
                technique_name,
                producer.clone(),
                mapping,
                old,
                used_nodes,
            ))
        }
        (_, GraphEntity::Node { name: consumer, .. }) => {
            let old = technique
                .find_node(consumer)?
                .find_mapping(MappingList::Input, &mapping)
                .cloned();
            if old.as_ref() == Some(&mapping) {
                return Ok(None);
            }
            match &source.entity {
                GraphEntity::Node { name: producer, .. } => {
                    Box::new(AttachVarToShaderNodeOperation::new(
                        technique_name,
                        consumer.clone(),
                        mapping,
                        old,
                        producer.clone(),
                    ))
                }
                GraphEntity::MaterialParam | GraphEntity::WorldParam => {
                    Box::new(AttachUniformToShaderNodeOperation::new(
                        technique_name,
                        consumer.clone(),
                        source.variable.clone(),
                        mapping,
                        old,
                    ))
                }
                _ => Box::new(AttachMappingOperation::new(
                    technique_name,
                    consumer.clone(),
                    mapping,
                    old,
                )),
            }
        }
        _ => return Err(ConnectionError::NotAnInput(target.variable.to_string()).into()),
    };

    tracing::debug!("Planned '{}' in technique {technique_name}", operation.description());
    Ok(Some(operation))
}

/// Turn a detach gesture into an operation
pub fn plan_detach(
    material: &MaterialDef,
    technique_name: &str,
    node: &str,
    mapping: &VariableMapping,
) -> Result<DetachMappingOperation, OperationError> {
    let technique = material.technique(technique_name)?;
    let list = mapping.list_for(node);
    if technique.find_node(node)?.mapping_index(list, mapping).is_none() {
        return Err(OperationError::InvalidOperation(format!(
            "{node} has no mapping {mapping}"
        )));
    }
    let mapping = mapping.clone();
    Ok(match list {
        MappingList::Input => DetachMappingOperation::input(technique_name, node, mapping),
        MappingList::Output => DetachMappingOperation::output(technique_name, node, mapping),
    })
}

/// Create an operation adding a node for a definition under a free name
pub fn plan_add_node(
    material: &MaterialDef,
    technique_name: &str,
    definition: Arc<ShaderNodeDefinition>,
    location: Location,
) -> Result<AddShaderNodeOperation, OperationError> {
    let technique = material.technique(technique_name)?;
    Ok(AddShaderNodeOperation::from_definition(technique, definition, location))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(entity: GraphEntity, variable: ShaderNodeVariable) -> Endpoint {
        Endpoint { entity, variable }
    }

    fn node(name: &str, shader_type: ShaderType) -> GraphEntity {
        GraphEntity::Node {
            name: name.to_string(),
            shader_type,
        }
    }

    #[test]
    fn test_self_loop_rejected() {
        let source = endpoint(
            node("A", ShaderType::Fragment),
            ShaderNodeVariable::node_variable("A", "out", "vec4"),
        );
        let target = endpoint(
            node("A", ShaderType::Fragment),
            ShaderNodeVariable::node_variable("A", "in", "vec4"),
        );
        assert_eq!(check_attach(&source, &target), Err(ConnectionError::SelfLoop));
    }

    #[test]
    fn test_fragment_cannot_feed_vertex() {
        let source = endpoint(
            node("F", ShaderType::Fragment),
            ShaderNodeVariable::node_variable("F", "out", "vec4"),
        );
        let target = endpoint(
            node("V", ShaderType::Vertex),
            ShaderNodeVariable::node_variable("V", "in", "vec4"),
        );
        assert!(matches!(
            check_attach(&source, &target),
            Err(ConnectionError::StageMismatch { .. })
        ));
        assert!(!can_attach(&source, &target));
    }

    #[test]
    fn test_attribute_only_in_vertex_stage() {
        let source =
            endpoint(GraphEntity::Attribute, ShaderNodeVariable::attribute("inPosition", "vec3"));
        let vertex = endpoint(
            node("V", ShaderType::Vertex),
            ShaderNodeVariable::node_variable("V", "modelPosition", "vec3"),
        );
        let fragment = endpoint(
            node("F", ShaderType::Fragment),
            ShaderNodeVariable::node_variable("F", "position", "vec3"),
        );
        assert!(can_attach(&source, &vertex));
        assert!(!can_attach(&source, &fragment));
    }

    #[test]
    fn test_global_output_rules() {
        let color = endpoint(
            GraphEntity::GlobalOutput { shader_type: ShaderType::Fragment },
            ShaderNodeVariable::global("color", "vec4"),
        );
        let fragment_out = endpoint(
            node("F", ShaderType::Fragment),
            ShaderNodeVariable::node_variable("F", "outColor", "vec4"),
        );
        let vertex_out = endpoint(
            node("V", ShaderType::Vertex),
            ShaderNodeVariable::node_variable("V", "outColor", "vec4"),
        );
        let param = endpoint(
            GraphEntity::MaterialParam,
            ShaderNodeVariable::material_parameter("Color", "vec4"),
        );

        assert!(can_attach(&fragment_out, &color));
        assert!(!can_attach(&vertex_out, &color));
        assert!(matches!(check_attach(&param, &color), Err(ConnectionError::NotAnOutput(_))));
        assert!(matches!(
            check_attach(&color, &fragment_out),
            Err(ConnectionError::NotAnOutput(_))
        ));
    }

    #[test]
    fn test_mapping_carries_swizzles() {
        let source = endpoint(
            node("V1", ShaderType::Vertex),
            ShaderNodeVariable::node_variable("V1", "output", "vec4"),
        );
        let target = endpoint(
            node("F1", ShaderType::Fragment),
            ShaderNodeVariable::node_variable("F1", "input", "vec2"),
        );
        let mapping = build_mapping(&source, &target).unwrap();
        assert_eq!(mapping.right_swizzle(), "xy");
        assert_eq!(mapping.left_swizzle(), "");

        let scalar = endpoint(
            node("V1", ShaderType::Vertex),
            ShaderNodeVariable::node_variable("V1", "scalar", "float"),
        );
        let mapping = build_mapping(&scalar, &target).unwrap();
        assert_eq!(mapping.left_swizzle(), "x");
    }

    #[test]
    fn test_incompatible_types() {
        let source = endpoint(
            GraphEntity::MaterialParam,
            ShaderNodeVariable::material_parameter("Map", "sampler2D"),
        );
        let target = endpoint(
            node("F", ShaderType::Fragment),
            ShaderNodeVariable::node_variable("F", "color", "vec4"),
        );
        assert!(matches!(
            build_mapping(&source, &target),
            Err(ConnectionError::IncompatibleTypes { .. })
        ));
    }
}
