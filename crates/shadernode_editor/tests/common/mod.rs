// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use shadernode_editor::events::Location;
use shadernode_editor::{GraphEvent, GraphObserver};
use shadernode_graph::{
    MatParam, MaterialDef, ShaderNode, ShaderNodeDefinition, ShaderNodeVariable, ShaderType,
    TechniqueDef, UniformBinding, VarType, VariableMapping,
};
use std::sync::Arc;

pub const TECHNIQUE: &str = "Default";

pub fn vertex_definition() -> Arc<ShaderNodeDefinition> {
    Arc::new(
        ShaderNodeDefinition::new("Vertex", ShaderType::Vertex)
            .with_input("input", "vec4")
            .with_input("modelPosition", "vec3")
            .with_output("output", "vec4"),
    )
}

pub fn fragment_definition() -> Arc<ShaderNodeDefinition> {
    Arc::new(
        ShaderNodeDefinition::new("Fragment", ShaderType::Fragment)
            .with_input("input", "vec2")
            .with_input("color", "vec3")
            .with_output("output", "vec4")
            .with_output("outColor", "vec4"),
    )
}

/// `[V1 (vertex), F1 (fragment)]`, with a `color` material parameter, an
/// `inPosition` attribute and the `Time` world binding declared
pub fn material() -> MaterialDef {
    let mut technique = TechniqueDef::new(TECHNIQUE);
    technique.push_node(ShaderNode::new("V1", vertex_definition()));
    technique.push_node(ShaderNode::new("F1", fragment_definition()));
    technique
        .generation_info
        .attributes
        .push(ShaderNodeVariable::attribute("inPosition", "vec3"));
    technique.world_bindings.push(UniformBinding::Time);

    let mut material = MaterialDef::new("Test");
    material.add_mat_param(MatParam::new("color", VarType::Vector4));
    material.add_technique(technique).unwrap();
    material
}

/// Fragment-only technique holding `[B, X, A]`
pub fn ordered_material() -> MaterialDef {
    let mut technique = TechniqueDef::new(TECHNIQUE);
    for name in ["B", "X", "A"] {
        technique.push_node(ShaderNode::new(name, fragment_definition()));
    }
    let mut material = MaterialDef::new("Ordered");
    material.add_technique(technique).unwrap();
    material
}

pub fn output(node: &str, name: &str) -> ShaderNodeVariable {
    ShaderNodeVariable::node_variable(node, name, "vec4")
}

pub fn input(node: &str, name: &str, var_type: &str) -> ShaderNodeVariable {
    ShaderNodeVariable::node_variable(node, name, var_type)
}

/// Structural snapshot of a material
pub fn snapshot(material: &MaterialDef) -> String {
    ron::to_string(material).unwrap()
}

pub fn technique(material: &MaterialDef) -> &TechniqueDef {
    material.technique(TECHNIQUE).unwrap()
}

/// Observer recording every notification it receives
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub added_nodes: Vec<(String, Location)>,
    pub removed_nodes: Vec<String>,
    pub added_mappings: Vec<(String, VariableMapping)>,
    pub removed_mappings: Vec<(String, VariableMapping)>,
    pub replaced_mappings: usize,
    pub techniques: Vec<String>,
}

impl GraphObserver for RecordingObserver {
    fn notify_added_shader_node(&mut self, node: &ShaderNode, location: Location) {
        self.added_nodes.push((node.name.clone(), location));
    }

    fn notify_removed_shader_node(&mut self, name: &str) {
        self.removed_nodes.push(name.to_string());
    }

    fn notify_added_mapping(&mut self, node: &str, mapping: &VariableMapping) {
        self.added_mappings.push((node.to_string(), mapping.clone()));
    }

    fn notify_removed_mapping(&mut self, node: &str, mapping: &VariableMapping) {
        self.removed_mappings.push((node.to_string(), mapping.clone()));
    }

    fn notify_replaced_mapping(
        &mut self,
        _node: &str,
        _old: &VariableMapping,
        _new: &VariableMapping,
    ) {
        self.replaced_mappings += 1;
    }

    fn notify_added_technique(&mut self, name: &str) {
        self.techniques.push(name.to_string());
    }
}

/// Dispatch events to a fresh recording observer
pub fn record(events: &[GraphEvent]) -> RecordingObserver {
    let mut observer = RecordingObserver::default();
    for event in events {
        event.dispatch(&mut observer);
    }
    observer
}
