// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concrete graph operations.
//!
//! Operations name their technique at creation time and look it up again on
//! every redo/undo, so they stay valid while the UI switches techniques.

mod attach;
mod detach;
mod node;
mod technique;
mod variable;

pub use attach::{
    AttachMappingOperation, AttachToGlobalNodeOperation, AttachUniformToShaderNodeOperation,
    AttachVarToShaderNodeOperation,
};
pub use detach::DetachMappingOperation;
pub use node::{AddShaderNodeOperation, RemoveShaderNodeOperation};
pub use technique::{AddTechniqueOperation, RemoveTechniqueOperation};
pub use variable::{
    AddAttributeOperation, AddMaterialParameterOperation, AddWorldParameterOperation,
    Declaration, RemoveVariableOperation,
};
