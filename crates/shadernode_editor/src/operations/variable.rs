// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declaring and removing standalone variables: attributes, uniforms,
//! material parameters and world parameters.

use crate::events::{GraphEvent, Location};
use crate::operation::{detach_references, restore_references, GraphOperation, OperationError};
use shadernode_graph::generation_info::{insert_variable, remove_variable};
use shadernode_graph::{
    MappingRef, MatParam, MaterialDef, ShaderNodeVariable, TechniqueDef, UniformBinding,
};

/// Declare a vertex attribute
#[derive(Debug)]
pub struct AddAttributeOperation {
    description: String,
    technique: String,
    variable: ShaderNodeVariable,
    location: Location,
}

impl AddAttributeOperation {
    /// Create a new add-attribute operation
    pub fn new(
        technique: impl Into<String>,
        variable: ShaderNodeVariable,
        location: Location,
    ) -> Self {
        Self {
            description: format!("Add attribute {}", variable.name),
            technique: technique.into(),
            variable,
            location,
        }
    }
}

impl GraphOperation for AddAttributeOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let attributes = &mut material.technique_mut(&self.technique)?.generation_info.attributes;
        if attributes.contains(&self.variable) {
            return Err(OperationError::AlreadyDeclared(self.variable.to_string()));
        }
        attributes.push(self.variable.clone());
        Ok(vec![GraphEvent::AddedAttribute {
            variable: self.variable.clone(),
            location: self.location,
        }])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let attributes = &mut material.technique_mut(&self.technique)?.generation_info.attributes;
        remove_variable(attributes, &self.variable);
        Ok(vec![GraphEvent::RemovedAttribute {
            variable: self.variable.clone(),
        }])
    }
}

/// Bind an engine-supplied world parameter
#[derive(Debug)]
pub struct AddWorldParameterOperation {
    description: String,
    technique: String,
    binding: UniformBinding,
    location: Location,
}

impl AddWorldParameterOperation {
    /// Create a new add-world-parameter operation
    pub fn new(technique: impl Into<String>, binding: UniformBinding, location: Location) -> Self {
        Self {
            description: format!("Add world parameter {}", binding.name()),
            technique: technique.into(),
            binding,
            location,
        }
    }
}

impl GraphOperation for AddWorldParameterOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        if technique.has_world_binding(self.binding) {
            return Err(OperationError::AlreadyDeclared(self.binding.name().to_string()));
        }
        technique.world_bindings.push(self.binding);
        Ok(vec![GraphEvent::AddedWorldParameter {
            binding: self.binding,
            location: self.location,
        }])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = material.technique_mut(&self.technique)?;
        technique.world_bindings.retain(|b| *b != self.binding);
        Ok(vec![GraphEvent::RemovedWorldParameter { binding: self.binding }])
    }
}

/// Add a material parameter
#[derive(Debug)]
pub struct AddMaterialParameterOperation {
    description: String,
    param: MatParam,
    location: Location,
}

impl AddMaterialParameterOperation {
    /// Create a new add-material-parameter operation
    pub fn new(param: MatParam, location: Location) -> Self {
        Self {
            description: format!("Add material parameter {}", param.name),
            param,
            location,
        }
    }
}

impl GraphOperation for AddMaterialParameterOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        if !material.add_mat_param(self.param.clone()) {
            return Err(OperationError::AlreadyDeclared(self.param.name.clone()));
        }
        Ok(vec![GraphEvent::AddedMatParameter {
            param: self.param.clone(),
            location: self.location,
        }])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        material.remove_mat_param(&self.param.name);
        Ok(vec![GraphEvent::RemovedMatParameter {
            param: self.param.clone(),
        }])
    }
}

/// A standalone declaration that can be removed from the graph
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// Vertex attribute of the technique
    Attribute(ShaderNodeVariable),
    /// Uniform declared in the technique's vertex and/or fragment stage
    Uniform(ShaderNodeVariable),
    /// Material parameter, shared by every technique
    MaterialParameter(String),
    /// World binding of the technique
    WorldParameter(UniformBinding),
}

/// What a removal took out of one technique, entries as they were stored
#[derive(Debug, Default)]
struct TechniqueRemoval {
    technique: String,
    references: Vec<MappingRef>,
    vertex_uniform: Option<(usize, ShaderNodeVariable)>,
    fragment_uniform: Option<(usize, ShaderNodeVariable)>,
    attribute: Option<(usize, ShaderNodeVariable)>,
    world_binding: Option<usize>,
}

impl TechniqueRemoval {
    fn declared(&self) -> Option<&ShaderNodeVariable> {
        [&self.attribute, &self.fragment_uniform, &self.vertex_uniform]
            .into_iter()
            .find_map(|entry| entry.as_ref().map(|(_, variable)| variable))
    }
}

/// Remove a declaration and every mapping reading from it
#[derive(Debug)]
pub struct RemoveVariableOperation {
    description: String,
    technique: String,
    declaration: Declaration,
    location: Location,
    removals: Vec<TechniqueRemoval>,
    mat_param: Option<(usize, MatParam)>,
}

impl RemoveVariableOperation {
    /// Create a new removal.
    ///
    /// Material parameters are removed from every technique of the
    /// material; the other declarations only from `technique`.
    pub fn new(technique: impl Into<String>, declaration: Declaration, location: Location) -> Self {
        let description = match &declaration {
            Declaration::Attribute(variable) => format!("Remove attribute {}", variable.name),
            Declaration::Uniform(variable) => format!("Remove uniform {variable}"),
            Declaration::MaterialParameter(name) => format!("Remove material parameter {name}"),
            Declaration::WorldParameter(binding) => {
                format!("Remove world parameter {}", binding.name())
            }
        };
        Self {
            description,
            technique: technique.into(),
            declaration,
            location,
            removals: Vec::new(),
            mat_param: None,
        }
    }

    /// Number of mappings detached by the last redo
    pub fn detached_count(&self) -> usize {
        self.removals.iter().map(|r| r.references.len()).sum()
    }

    fn variable(&self, material: &MaterialDef) -> Result<ShaderNodeVariable, OperationError> {
        Ok(match &self.declaration {
            Declaration::Attribute(variable) | Declaration::Uniform(variable) => variable.clone(),
            Declaration::MaterialParameter(name) => material.find_mat_param(name)?.variable(),
            Declaration::WorldParameter(binding) => binding.variable(),
        })
    }

    fn strip(
        &self,
        technique: &mut TechniqueDef,
        variable: &ShaderNodeVariable,
    ) -> TechniqueRemoval {
        let references = technique.find_references(|m| m.reads(variable));
        detach_references(technique, &references);

        let info = &mut technique.generation_info;
        let vertex_uniform = remove_variable(&mut info.vertex_uniforms, variable);
        let fragment_uniform = remove_variable(&mut info.fragment_uniforms, variable);
        let attribute = match &self.declaration {
            Declaration::Attribute(_) => remove_variable(&mut info.attributes, variable),
            _ => None,
        };
        let world_binding = match &self.declaration {
            Declaration::WorldParameter(binding) => {
                let index = technique.world_bindings.iter().position(|b| b == binding);
                if let Some(index) = index {
                    technique.world_bindings.remove(index);
                }
                index
            }
            _ => None,
        };

        TechniqueRemoval {
            technique: technique.name.clone(),
            references,
            vertex_uniform,
            fragment_uniform,
            attribute,
            world_binding,
        }
    }

    fn restore(&self, technique: &mut TechniqueDef, removal: TechniqueRemoval) {
        if let (Some(index), Declaration::WorldParameter(binding)) =
            (removal.world_binding, &self.declaration)
        {
            let index = index.min(technique.world_bindings.len());
            technique.world_bindings.insert(index, *binding);
        }
        let info = &mut technique.generation_info;
        if let Some((index, attribute)) = removal.attribute {
            insert_variable(&mut info.attributes, index, attribute);
        }
        if let Some((index, uniform)) = removal.fragment_uniform {
            insert_variable(&mut info.fragment_uniforms, index, uniform);
        }
        if let Some((index, uniform)) = removal.vertex_uniform {
            insert_variable(&mut info.vertex_uniforms, index, uniform);
        }
        restore_references(technique, &removal.references);
    }
}

impl GraphOperation for RemoveVariableOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let variable = self.variable(material)?;
        let mut removals = Vec::new();
        match &self.declaration {
            Declaration::MaterialParameter(_) => {
                for technique in material.techniques_mut() {
                    removals.push(self.strip(technique, &variable));
                }
            }
            _ => {
                let technique = material.technique_mut(&self.technique)?;
                removals.push(self.strip(technique, &variable));
            }
        }

        let variable = removals
            .iter()
            .find_map(TechniqueRemoval::declared)
            .cloned()
            .unwrap_or(variable);
        let mut events: Vec<GraphEvent> = removals
            .iter()
            .flat_map(|r| &r.references)
            .map(|r| GraphEvent::RemovedMapping {
                node: r.owner.clone(),
                mapping: r.mapping.clone(),
            })
            .collect();

        events.push(match &self.declaration {
            Declaration::Attribute(_) => GraphEvent::RemovedAttribute { variable },
            Declaration::Uniform(_) => GraphEvent::RemovedUniform { variable },
            Declaration::WorldParameter(binding) => {
                GraphEvent::RemovedWorldParameter { binding: *binding }
            }
            Declaration::MaterialParameter(name) => {
                let removed = material
                    .remove_mat_param(name)
                    .ok_or_else(|| {
                        OperationError::InvalidOperation(format!("No material parameter {name}"))
                    })?;
                let event = GraphEvent::RemovedMatParameter { param: removed.1.clone() };
                self.mat_param = Some(removed);
                event
            }
        });

        self.removals = removals;
        Ok(events)
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let mut events = Vec::new();
        let variable = match (&self.declaration, self.mat_param.take()) {
            (Declaration::MaterialParameter(_), Some((index, param))) => {
                let variable = param.variable();
                events.push(GraphEvent::AddedMatParameter {
                    param: param.clone(),
                    location: self.location,
                });
                material.insert_mat_param(index, param);
                variable
            }
            _ => match self.removals.iter().find_map(TechniqueRemoval::declared) {
                Some(stored) => stored.clone(),
                None => self.variable(material)?,
            },
        };

        match &self.declaration {
            Declaration::Attribute(_) => events.push(GraphEvent::AddedAttribute {
                variable: variable.clone(),
                location: self.location,
            }),
            Declaration::Uniform(_) => events.push(GraphEvent::AddedUniform {
                variable: variable.clone(),
                location: self.location,
            }),
            Declaration::WorldParameter(binding) => events.push(GraphEvent::AddedWorldParameter {
                binding: *binding,
                location: self.location,
            }),
            Declaration::MaterialParameter(_) => {}
        }

        let removals = std::mem::take(&mut self.removals);
        for removal in removals {
            events.extend(removal.references.iter().map(|r| GraphEvent::AddedMapping {
                node: r.owner.clone(),
                mapping: r.mapping.clone(),
            }));
            let technique = material.technique_mut(&removal.technique)?;
            self.restore(technique, removal);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadernode_graph::{ShaderNode, ShaderNodeDefinition, ShaderType, VarType, VariableMapping};
    use std::sync::Arc;

    fn material() -> MaterialDef {
        let definition = Arc::new(
            ShaderNodeDefinition::new("Color", ShaderType::Fragment)
                .with_input("color", "vec4")
                .with_output("outColor", "vec4"),
        );
        let mut material = MaterialDef::new("Test");
        material.add_mat_param(MatParam::new("Color", VarType::Color));
        for name in ["Default", "Glow"] {
            let mut technique = TechniqueDef::new(name);
            let mut node = ShaderNode::new("Color", Arc::clone(&definition));
            node.set_mapping(VariableMapping::new(
                node.find_input("color").unwrap(),
                ShaderNodeVariable::material_parameter("Color", "vec4"),
            ));
            technique.push_node(node);
            technique
                .generation_info
                .fragment_uniforms
                .push(ShaderNodeVariable::material_parameter("Color", "vec4"));
            material.add_technique(technique).unwrap();
        }
        material
    }

    fn snapshot(material: &MaterialDef) -> String {
        ron::to_string(material).unwrap()
    }

    #[test]
    fn test_remove_material_parameter_spans_techniques() {
        let mut material = material();
        let before = snapshot(&material);

        let mut op = RemoveVariableOperation::new(
            "Default",
            Declaration::MaterialParameter("Color".to_string()),
            [0.0, 0.0],
        );
        let events = op.redo(&mut material).unwrap();
        assert_eq!(op.detached_count(), 2);
        assert_eq!(events.len(), 3);
        assert!(material.mat_param("Color").is_none());
        for technique in material.techniques() {
            assert!(technique.generation_info.fragment_uniforms.is_empty());
            assert!(technique.find_node("Color").unwrap().input_mapping().is_empty());
        }

        op.undo(&mut material).unwrap();
        assert_eq!(snapshot(&material), before);
    }

    #[test]
    fn test_undo_restores_stored_declarations() {
        let mut material = material();
        let mut attribute = ShaderNodeVariable::attribute("inPosition", "vec3");
        attribute.multiplicity = Some("4".to_string());
        let mut uniform = ShaderNodeVariable::material_parameter("Tint", "vec3");
        uniform.default_value = Some("vec3(1.0)".to_string());
        {
            let info = &mut material.technique_mut("Default").unwrap().generation_info;
            info.attributes.push(attribute);
            info.vertex_uniforms.push(uniform);
        }
        let before = snapshot(&material);

        let removals = [
            Declaration::Attribute(ShaderNodeVariable::attribute("inPosition", "vec4")),
            Declaration::Uniform(ShaderNodeVariable::material_parameter("Tint", "vec4")),
        ];
        for declaration in removals {
            let mut op = RemoveVariableOperation::new("Default", declaration, [0.0, 0.0]);
            let events = op.redo(&mut material).unwrap();
            assert_ne!(snapshot(&material), before);
            match events.last() {
                Some(GraphEvent::RemovedAttribute { variable }) => {
                    assert_eq!(variable.multiplicity.as_deref(), Some("4"));
                }
                Some(GraphEvent::RemovedUniform { variable }) => {
                    assert_eq!(variable.var_type, "vec3")
                }
                other => panic!("unexpected event {other:?}"),
            }

            op.undo(&mut material).unwrap();
            assert_eq!(snapshot(&material), before);
        }
        let info = &material.technique("Default").unwrap().generation_info;
        assert_eq!(info.attributes[0].var_type, "vec3");
        assert_eq!(info.vertex_uniforms[0].default_value.as_deref(), Some("vec3(1.0)"));
    }

    #[test]
    fn test_remove_uniform_checks_both_stages() {
        let mut material = material();
        let uniform = ShaderNodeVariable::material_parameter("Color", "vec4");
        material
            .technique_mut("Default")
            .unwrap()
            .generation_info
            .vertex_uniforms
            .push(uniform.clone());
        let before = snapshot(&material);

        let mut op =
            RemoveVariableOperation::new("Default", Declaration::Uniform(uniform), [0.0, 0.0]);
        op.redo(&mut material).unwrap();
        let info = &material.technique("Default").unwrap().generation_info;
        assert!(info.vertex_uniforms.is_empty());
        assert!(info.fragment_uniforms.is_empty());
        // Other techniques keep their declaration
        assert_eq!(material.technique("Glow").unwrap().generation_info.fragment_uniforms.len(), 1);

        op.undo(&mut material).unwrap();
        assert_eq!(snapshot(&material), before);
    }

    #[test]
    fn test_add_and_remove_declarations() {
        let mut material = material();
        let before = snapshot(&material);
        let position = ShaderNodeVariable::attribute("inPosition", "vec3");

        let mut add_attribute = AddAttributeOperation::new("Default", position.clone(), [0.0, 0.0]);
        let mut add_binding =
            AddWorldParameterOperation::new("Default", UniformBinding::Time, [0.0, 0.0]);
        let mut add_param =
            AddMaterialParameterOperation::new(MatParam::new("Glow", VarType::Float), [0.0, 0.0]);
        add_attribute.redo(&mut material).unwrap();
        add_binding.redo(&mut material).unwrap();
        add_param.redo(&mut material).unwrap();

        assert!(matches!(
            AddAttributeOperation::new("Default", position.clone(), [0.0, 0.0]).redo(&mut material),
            Err(OperationError::AlreadyDeclared(_))
        ));

        let mut remove_attribute =
            RemoveVariableOperation::new("Default", Declaration::Attribute(position), [0.0, 0.0]);
        let mut remove_binding =
            RemoveVariableOperation::new(
                "Default",
                Declaration::WorldParameter(UniformBinding::Time),
                [0.0, 0.0],
            );
        let with_declarations = snapshot(&material);
        remove_attribute.redo(&mut material).unwrap();
        remove_binding.redo(&mut material).unwrap();
        assert!(material.technique("Default").unwrap().world_bindings.is_empty());
        remove_binding.undo(&mut material).unwrap();
        remove_attribute.undo(&mut material).unwrap();
        assert_eq!(snapshot(&material), with_declarations);

        add_param.undo(&mut material).unwrap();
        add_binding.undo(&mut material).unwrap();
        add_attribute.undo(&mut material).unwrap();
        assert_eq!(snapshot(&material), before);
    }
}
