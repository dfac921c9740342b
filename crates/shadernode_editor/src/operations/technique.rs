// SPDX-License-Identifier: MIT OR Apache-2.0
//! Adding and removing techniques.

use crate::events::GraphEvent;
use crate::operation::{GraphOperation, OperationError};
use shadernode_graph::{GraphError, MaterialDef, TechniqueDef};

/// Add a technique to the material
#[derive(Debug)]
pub struct AddTechniqueOperation {
    description: String,
    name: String,
    technique: Option<TechniqueDef>,
}

impl AddTechniqueOperation {
    /// Create a new add-technique operation
    pub fn new(technique: TechniqueDef) -> Self {
        Self {
            description: format!("Add technique {}", technique.name),
            name: technique.name.clone(),
            technique: Some(technique),
        }
    }
}

impl GraphOperation for AddTechniqueOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let technique = self
            .technique
            .take()
            .ok_or_else(|| {
                OperationError::InvalidOperation(format!("{} is already added", self.name))
            })?;
        if let Err(technique) = material.add_technique(technique) {
            self.technique = Some(technique);
            return Err(OperationError::AlreadyDeclared(self.name.clone()));
        }
        Ok(vec![GraphEvent::AddedTechnique { name: self.name.clone() }])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let (_, technique) = material
            .remove_technique(&self.name)
            .ok_or_else(|| GraphError::TechniqueNotFound(self.name.clone()))?;
        self.technique = Some(technique);
        Ok(vec![GraphEvent::RemovedTechnique { name: self.name.clone() }])
    }
}

/// Remove a technique from the material
#[derive(Debug)]
pub struct RemoveTechniqueOperation {
    description: String,
    name: String,
    removed: Option<(usize, TechniqueDef)>,
}

impl RemoveTechniqueOperation {
    /// Create a new remove-technique operation
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("Remove technique {name}"),
            name,
            removed: None,
        }
    }
}

impl GraphOperation for RemoveTechniqueOperation {
    fn description(&self) -> &str {
        &self.description
    }

    fn redo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let removed = material
            .remove_technique(&self.name)
            .ok_or_else(|| GraphError::TechniqueNotFound(self.name.clone()))?;
        self.removed = Some(removed);
        Ok(vec![GraphEvent::RemovedTechnique { name: self.name.clone() }])
    }

    fn undo(&mut self, material: &mut MaterialDef) -> Result<Vec<GraphEvent>, OperationError> {
        let (index, technique) = self
            .removed
            .take()
            .ok_or_else(|| {
                OperationError::InvalidOperation(format!("{} was not removed", self.name))
            })?;
        material.insert_technique(index, technique);
        Ok(vec![GraphEvent::AddedTechnique { name: self.name.clone() }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> MaterialDef {
        let mut material = MaterialDef::new("Test");
        material.add_technique(TechniqueDef::new("Default")).unwrap();
        material.add_technique(TechniqueDef::new("Glow")).unwrap();
        material
    }

    #[test]
    fn test_add_technique_round_trip() {
        let mut material = material();
        let mut op = AddTechniqueOperation::new(TechniqueDef::new("PreShadow"));
        op.redo(&mut material).unwrap();
        assert!(material.technique("PreShadow").is_ok());
        op.undo(&mut material).unwrap();
        assert!(material.technique("PreShadow").is_err());
        op.redo(&mut material).unwrap();
        assert_eq!(material.technique_names().count(), 3);
    }

    #[test]
    fn test_add_duplicate_technique_fails() {
        let mut material = material();
        let mut op = AddTechniqueOperation::new(TechniqueDef::new("Glow"));
        assert!(matches!(op.redo(&mut material), Err(OperationError::AlreadyDeclared(_))));
    }

    #[test]
    fn test_remove_technique_restores_position() {
        let mut material = material();
        let mut op = RemoveTechniqueOperation::new("Default");
        op.redo(&mut material).unwrap();
        assert_eq!(material.technique_names().collect::<Vec<_>>(), vec!["Glow"]);
        op.undo(&mut material).unwrap();
        assert_eq!(material.technique_names().collect::<Vec<_>>(), vec!["Default", "Glow"]);
    }
}
