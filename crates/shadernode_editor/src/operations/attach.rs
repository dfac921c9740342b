// SPDX-License-Identifier: MIT OR Apache-2.0
//! Attach operations: putting a mapping on a node input or a global output.

use crate::events::GraphEvent;
use crate::operation::{
    detach_references, restore_references, GraphOperation, MappingSwap, OperationError,
};
use shadernode_graph::generation_info::remove_variable;
use shadernode_graph::{
    MappingList, MappingRef, MaterialDef, ShaderNodeVariable, ShaderType, VariableMapping,
};

fn describe(mapping: &VariableMapping) -> String {
    format!("Attach {mapping}")
}

/// Plain mapping swap on a node input, with no side effects
#[derive(Debug)]
pub struct AttachMappingOperation {
    description: String,
    technique: String,
    swap: MappingSwap,
}

impl AttachMappingOperation {
    /// Create a new attach operation
    pub fn new(
        technique: impl Into<String>,
        node: impl Into<String>,
        new_mapping: VariableMapping,
        old_mapping: Option<VariableMapping>,
    ) -> Self {
        Self {
            description: describe(&new_mapping),
            technique: technique.into(),
            swap: MappingSwap::new(node, new_mapping, old_mapping),
        }
    }
}

impl GraphOperation for AttachMappingOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        Ok(vec![self.swap.apply(technique)?])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        Ok(vec![self.swap.revert(technique)?])
    }
}

/// Connect a node output to a global output.
///
/// A global accepts one producer per target slot: mappings from other nodes
/// writing the same global are detached and restored on undo. The producer
/// and everything upstream of it leave the unused list.
#[derive(Debug)]
pub struct AttachToGlobalNodeOperation {
    description: String,
    technique: String,
    swap: MappingSwap,
    used_nodes: Vec<String>,
    displaced: Vec<MappingRef>,
    reactivated: Vec<(usize, String)>,
}

impl AttachToGlobalNodeOperation {
    /// Create a new attach-to-global operation
    pub fn new(
        technique: impl Into<String>,
        node: impl Into<String>,
        new_mapping: VariableMapping,
        old_mapping: Option<VariableMapping>,
        used_nodes: Vec<String>,
    ) -> Self {
        Self {
            description: describe(&new_mapping),
            technique: technique.into(),
            swap: MappingSwap::new(node, new_mapping, old_mapping),
            used_nodes,
            displaced: Vec::new(),
            reactivated: Vec::new(),
        }
    }

    /// Mappings detached from competing producers by the last redo
    pub fn displaced(&self) -> &[MappingRef] {
        &self.displaced
    }
}

impl GraphOperation for AttachToGlobalNodeOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        technique.find_node(&self.swap.node)?;

        let global = self.swap.new_mapping.left_variable().clone();
        let producer = &self.swap.node;
        self.displaced = technique.find_references(|m| m.left_variable() == &global);
        self.displaced
            .retain(|r| r.list == MappingList::Output && &r.owner != producer);

        let mut events = detach_references(technique, &self.displaced);
        events.push(self.swap.apply(technique)?);

        self.reactivated.clear();
        for name in &self.used_nodes {
            if let Some(index) = technique.generation_info.mark_used(name) {
                self.reactivated.push((index, name.clone()));
            }
        }
        Ok(events)
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        for (index, name) in self.reactivated.drain(..).rev() {
            technique.generation_info.restore_unused(index, &name);
        }

        let mut events = vec![self.swap.revert(technique)?];
        events.extend(restore_references(technique, &self.displaced));
        Ok(events)
    }
}

/// Connect one node's output to another node's input.
///
/// Crossing from the vertex to the fragment stage turns the source into a
/// varying. A producer sitting after its consumer is moved right in front of
/// it, and an unused producer is reactivated.
#[derive(Debug)]
pub struct AttachVarToShaderNodeOperation {
    description: String,
    technique: String,
    swap: MappingSwap,
    producer: String,
    added_varying: Option<usize>,
    flagged: Vec<(usize, bool)>,
    previous_order: Option<Vec<String>>,
    reactivated: Option<usize>,
}

impl AttachVarToShaderNodeOperation {
    /// Create a new node-to-node attach operation
    pub fn new(
        technique: impl Into<String>,
        node: impl Into<String>,
        new_mapping: VariableMapping,
        old_mapping: Option<VariableMapping>,
        producer: impl Into<String>,
    ) -> Self {
        Self {
            description: describe(&new_mapping),
            technique: technique.into(),
            swap: MappingSwap::new(node, new_mapping, old_mapping),
            producer: producer.into(),
            added_varying: None,
            flagged: Vec::new(),
            previous_order: None,
            reactivated: None,
        }
    }

    /// The mapping this operation puts in place
    pub fn mapping(&self) -> &VariableMapping {
        &self.swap.new_mapping
    }
}

impl GraphOperation for AttachVarToShaderNodeOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        let producer_stage = technique.find_node(&self.producer)?.shader_type();
        let consumer_stage = technique.find_node(&self.swap.node)?.shader_type();
        let crosses_stage =
            producer_stage == ShaderType::Vertex && consumer_stage != ShaderType::Vertex;

        if crosses_stage {
            if let Some(source) = self.swap.new_mapping.right_variable_mut() {
                source.shader_output = true;
            }
        }
        let event = self.swap.apply(technique)?;

        self.added_varying = None;
        self.flagged.clear();
        if let (true, Some(source)) = (crosses_stage, self.swap.new_mapping.right_variable()) {
            let info = &mut technique.generation_info;
            if !info.varyings.contains(source) {
                info.varyings.push(source.clone());
                self.added_varying = Some(info.varyings.len() - 1);

                // Output mappings carry the producer's own variable on the right
                let producer = technique.find_node_mut(&self.producer)?;
                let outputs = producer.mappings_mut(MappingList::Output);
                for (index, mapping) in outputs.iter_mut().enumerate() {
                    if let Some(written) = mapping.right_variable_mut().filter(|v| **v == *source) {
                        self.flagged.push((index, written.shader_output));
                        written.shader_output = true;
                    }
                }
            }
        }

        self.previous_order = None;
        let producer_index = technique.node_index(&self.producer);
        let consumer_index = technique.node_index(&self.swap.node);
        if let (Some(producer_index), Some(consumer_index)) = (producer_index, consumer_index) {
            if producer_index > consumer_index {
                self.previous_order = Some(technique.node_names());
                technique.move_node(&self.producer, consumer_index)?;
            }
        }

        self.reactivated = technique.generation_info.mark_used(&self.producer);
        Ok(vec![event])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        if let Some(index) = self.reactivated.take() {
            technique.generation_info.restore_unused(index, &self.producer);
        }
        if let Some(order) = self.previous_order.take() {
            technique.reorder(&order);
        }

        let producer = technique.find_node_mut(&self.producer)?;
        let outputs = producer.mappings_mut(MappingList::Output);
        for (index, previous) in self.flagged.drain(..).rev() {
            let restored = outputs.get_mut(index).and_then(VariableMapping::right_variable_mut);
            if let Some(written) = restored {
                written.shader_output = previous;
            }
        }
        if let Some(index) = self.added_varying.take() {
            let varyings = &mut technique.generation_info.varyings;
            if index < varyings.len() {
                varyings.remove(index);
            }
        }

        Ok(vec![self.swap.revert(technique)?])
    }
}

/// Connect a material or world parameter to a node input.
///
/// The parameter is declared as a uniform of the consumer's stage when it is
/// not already, and only a declaration made here is removed on undo.
#[derive(Debug)]
pub struct AttachUniformToShaderNodeOperation {
    description: String,
    technique: String,
    swap: MappingSwap,
    uniform: ShaderNodeVariable,
    declared_in: Option<ShaderType>,
}

impl AttachUniformToShaderNodeOperation {
    /// Create a new uniform attach operation
    pub fn new(
        technique: impl Into<String>,
        node: impl Into<String>,
        uniform: ShaderNodeVariable,
        new_mapping: VariableMapping,
        old_mapping: Option<VariableMapping>,
    ) -> Self {
        Self {
            description: describe(&new_mapping),
            technique: technique.into(),
            swap: MappingSwap::new(node, new_mapping, old_mapping),
            uniform,
            declared_in: None,
        }
    }

    /// Whether the last redo declared the uniform
    pub fn added_uniform(&self) -> bool {
        self.declared_in.is_some()
    }
}

impl GraphOperation for AttachUniformToShaderNodeOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        let stage = technique.find_node(&self.swap.node)?.shader_type();
        let event = self.swap.apply(technique)?;

        let uniforms = technique.generation_info.uniforms_mut(stage);
        self.declared_in = if uniforms.contains(&self.uniform) {
            None
        } else {
            uniforms.push(self.uniform.clone());
            Some(stage)
        };
        Ok(vec![event])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        if let Some(stage) = self.declared_in.take() {
            remove_variable(technique.generation_info.uniforms_mut(stage), &self.uniform);
        }
        Ok(vec![self.swap.revert(technique)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadernode_graph::{ShaderNode, ShaderNodeDefinition, TechniqueDef};
    use std::sync::Arc;

    fn material() -> MaterialDef {
        let vertex = Arc::new(
            ShaderNodeDefinition::new("Transform", ShaderType::Vertex)
                .with_input("position", "vec3")
                .with_output("output", "vec4"),
        );
        let fragment = Arc::new(
            ShaderNodeDefinition::new("Color", ShaderType::Fragment)
                .with_input("input", "vec4")
                .with_output("outColor", "vec4"),
        );
        let mut technique = TechniqueDef::new("Default");
        technique.push_node(ShaderNode::new("V1", vertex));
        technique.push_node(ShaderNode::new("F1", Arc::clone(&fragment)));
        technique.push_node(ShaderNode::new("F2", fragment));
        let mut material = MaterialDef::new("Test");
        material.add_technique(technique).unwrap();
        material
    }

    fn snapshot(material: &MaterialDef) -> String {
        ron::to_string(material).unwrap()
    }

    fn color_mapping(node: &str) -> VariableMapping {
        VariableMapping::new(
            ShaderNodeVariable::global("color", "vec4"),
            ShaderNodeVariable::node_variable(node, "outColor", "vec4"),
        )
    }

    #[test]
    fn test_global_attach_displaces_other_producer() {
        let mut material = material();
        {
            let technique = material.technique_mut("Default").unwrap();
            technique.find_node_mut("F1").unwrap().set_mapping(color_mapping("F1"));
            technique.generation_info.mark_unused("F2");
        }
        let before = snapshot(&material);

        let mut op = AttachToGlobalNodeOperation::new(
            "Default",
            "F2",
            color_mapping("F2"),
            None,
            vec!["F2".to_string()],
        );
        op.redo(&mut material).unwrap();
        assert_eq!(op.displaced().len(), 1);
        let technique = material.technique("Default").unwrap();
        assert!(technique.find_node("F1").unwrap().output_mapping().is_empty());
        assert_eq!(technique.find_node("F2").unwrap().output_mapping(), &[color_mapping("F2")]);
        assert!(!technique.generation_info.is_unused("F2"));

        op.undo(&mut material).unwrap();
        assert_eq!(snapshot(&material), before);
    }

    #[test]
    fn test_same_stage_attach_adds_no_varying() {
        let mut material = material();
        let mapping = VariableMapping::new(
            ShaderNodeVariable::node_variable("F2", "input", "vec4"),
            ShaderNodeVariable::node_variable("F1", "outColor", "vec4"),
        );
        let mut op = AttachVarToShaderNodeOperation::new("Default", "F2", mapping, None, "F1");
        op.redo(&mut material).unwrap();
        let technique = material.technique("Default").unwrap();
        assert!(technique.generation_info.varyings.is_empty());
        assert_eq!(technique.node_names(), vec!["V1", "F1", "F2"]);
    }

    #[test]
    fn test_varying_flags_producer_output_mapping() {
        let tint = Arc::new(
            ShaderNodeDefinition::new("Tint", ShaderType::Vertex)
                .with_input("color", "vec4")
                .with_output("color", "vec4"),
        );
        let color = ShaderNodeVariable::node_variable("T1", "color", "vec4");
        let mut material = material();
        {
            let technique = material.technique_mut("Default").unwrap();
            technique.insert_node(0, ShaderNode::new("T1", tint));
            let node = technique.find_node_mut("T1").unwrap();
            node.set_mapping(VariableMapping::expression(color.clone(), "vec4(1.0)"));
            node.set_mapping(VariableMapping::new(
                ShaderNodeVariable::global("position", "vec4"),
                color.clone(),
            ));
        }
        let before = snapshot(&material);

        let mapping =
            VariableMapping::new(ShaderNodeVariable::node_variable("F1", "input", "vec4"), color);
        let mut op = AttachVarToShaderNodeOperation::new("Default", "F1", mapping, None, "T1");
        op.redo(&mut material).unwrap();
        let node = material.technique("Default").unwrap().find_node("T1").unwrap();
        assert!(node.output_mapping()[0].right_variable().unwrap().shader_output);
        assert!(!node.input_mapping()[0].left_variable().shader_output);

        op.undo(&mut material).unwrap();
        let node = material.technique("Default").unwrap().find_node("T1").unwrap();
        assert!(!node.output_mapping()[0].right_variable().unwrap().shader_output);
        assert_eq!(snapshot(&material), before);
    }

    #[test]
    fn test_uniform_declared_in_consumer_stage() {
        let mut material = material();
        let uniform = ShaderNodeVariable::world_parameter("Time", "float");
        let mapping = VariableMapping::new(
            ShaderNodeVariable::node_variable("V1", "position", "vec3"),
            uniform.clone(),
        )
        .with_left_swizzle("x");
        let before = snapshot(&material);

        let mut op = AttachUniformToShaderNodeOperation::new(
            "Default",
            "V1",
            uniform.clone(),
            mapping,
            None,
        );
        op.redo(&mut material).unwrap();
        assert!(op.added_uniform());
        let info = &material.technique("Default").unwrap().generation_info;
        assert_eq!(info.vertex_uniforms, vec![uniform]);
        assert!(info.fragment_uniforms.is_empty());

        op.undo(&mut material).unwrap();
        assert_eq!(snapshot(&material), before);
    }

    #[test]
    fn test_missing_technique_fails() {
        let mut material = material();
        let mut op = AttachMappingOperation::new("Glow", "F1", color_mapping("F1"), None);
        assert!(matches!(op.redo(&mut material), Err(OperationError::Graph(_))));
    }
}
