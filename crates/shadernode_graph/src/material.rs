// SPDX-License-Identifier: MIT OR Apache-2.0
//! Material definitions, material parameters and world bindings.

use crate::error::{GraphError, Result};
use crate::technique::TechniqueDef;
use crate::variable::ShaderNodeVariable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Type of a material parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarType {
    /// Scalar float
    Float,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// 4D vector
    Vector4,
    /// RGBA color
    Color,
    /// Integer
    Int,
    /// Boolean
    Boolean,
    /// 3x3 matrix
    Matrix3,
    /// 4x4 matrix
    Matrix4,
    /// 2D texture
    Texture2D,
    /// Cube map
    TextureCubeMap,
}

impl VarType {
    /// GLSL type used to declare the uniform
    pub fn glsl_type(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vector2 => "vec2",
            Self::Vector3 => "vec3",
            Self::Vector4 | Self::Color => "vec4",
            Self::Int => "int",
            Self::Boolean => "bool",
            Self::Matrix3 => "mat3",
            Self::Matrix4 => "mat4",
            Self::Texture2D => "sampler2D",
            Self::TextureCubeMap => "samplerCube",
        }
    }
}

/// A material parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatParam {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub var_type: VarType,
    /// Default value expression
    pub default_value: Option<String>,
}

impl MatParam {
    /// Create a parameter with no default
    pub fn new(name: impl Into<String>, var_type: VarType) -> Self {
        Self {
            name: name.into(),
            var_type,
            default_value: None,
        }
    }

    /// The `MatParam` variable node inputs map from
    pub fn variable(&self) -> ShaderNodeVariable {
        ShaderNodeVariable::material_parameter(self.name.clone(), self.var_type.glsl_type())
    }
}

/// Engine-supplied uniforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniformBinding {
    /// World matrix
    WorldMatrix,
    /// View matrix
    ViewMatrix,
    /// Projection matrix
    ProjectionMatrix,
    /// World * view
    WorldViewMatrix,
    /// View * projection
    ViewProjectionMatrix,
    /// World * view * projection
    WorldViewProjectionMatrix,
    /// Normal matrix
    NormalMatrix,
    /// Camera position in world space
    CameraPosition,
    /// Viewport resolution
    Resolution,
    /// Seconds since start
    Time,
    /// Seconds since last frame
    Tpf,
}

impl UniformBinding {
    /// All bindings
    pub fn all() -> &'static [UniformBinding] {
        &[
            Self::WorldMatrix,
            Self::ViewMatrix,
            Self::ProjectionMatrix,
            Self::WorldViewMatrix,
            Self::ViewProjectionMatrix,
            Self::WorldViewProjectionMatrix,
            Self::NormalMatrix,
            Self::CameraPosition,
            Self::Resolution,
            Self::Time,
            Self::Tpf,
        ]
    }

    /// Binding name as used in the `WorldParam` namespace
    pub fn name(self) -> &'static str {
        match self {
            Self::WorldMatrix => "WorldMatrix",
            Self::ViewMatrix => "ViewMatrix",
            Self::ProjectionMatrix => "ProjectionMatrix",
            Self::WorldViewMatrix => "WorldViewMatrix",
            Self::ViewProjectionMatrix => "ViewProjectionMatrix",
            Self::WorldViewProjectionMatrix => "WorldViewProjectionMatrix",
            Self::NormalMatrix => "NormalMatrix",
            Self::CameraPosition => "CameraPosition",
            Self::Resolution => "Resolution",
            Self::Time => "Time",
            Self::Tpf => "Tpf",
        }
    }

    /// GLSL type of the uniform
    pub fn glsl_type(self) -> &'static str {
        match self {
            Self::WorldMatrix
            | Self::ViewMatrix
            | Self::ProjectionMatrix
            | Self::WorldViewMatrix
            | Self::ViewProjectionMatrix
            | Self::WorldViewProjectionMatrix => "mat4",
            Self::NormalMatrix => "mat3",
            Self::CameraPosition => "vec3",
            Self::Resolution => "vec2",
            Self::Time | Self::Tpf => "float",
        }
    }

    /// Look a binding up by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|b| b.name() == name)
    }

    /// The `WorldParam` variable node inputs map from
    pub fn variable(self) -> ShaderNodeVariable {
        ShaderNodeVariable::world_parameter(self.name(), self.glsl_type())
    }
}

/// A material definition: parameters plus named techniques
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Material name
    pub name: String,
    mat_params: IndexMap<String, MatParam>,
    techniques: IndexMap<String, TechniqueDef>,
}

impl MaterialDef {
    /// Create an empty material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mat_params: IndexMap::new(),
            techniques: IndexMap::new(),
        }
    }

    /// Add a technique, returning it back if the name is taken
    pub fn add_technique(
        &mut self,
        technique: TechniqueDef,
    ) -> std::result::Result<(), TechniqueDef> {
        if self.techniques.contains_key(&technique.name) {
            return Err(technique);
        }
        self.techniques.insert(technique.name.clone(), technique);
        Ok(())
    }

    /// Insert a technique at a position
    pub fn insert_technique(&mut self, index: usize, technique: TechniqueDef) {
        let index = index.min(self.techniques.len());
        self.techniques
            .shift_insert(index, technique.name.clone(), technique);
    }

    /// Remove a technique, returning its position and the technique
    pub fn remove_technique(&mut self, name: &str) -> Option<(usize, TechniqueDef)> {
        self.techniques
            .shift_remove_full(name)
            .map(|(index, _, technique)| (index, technique))
    }

    /// Get a technique by name
    pub fn technique(&self, name: &str) -> Result<&TechniqueDef> {
        self.techniques
            .get(name)
            .ok_or_else(|| GraphError::TechniqueNotFound(name.to_string()))
    }

    /// Get a mutable technique by name
    pub fn technique_mut(&mut self, name: &str) -> Result<&mut TechniqueDef> {
        self.techniques
            .get_mut(name)
            .ok_or_else(|| GraphError::TechniqueNotFound(name.to_string()))
    }

    /// All techniques
    pub fn techniques(&self) -> impl Iterator<Item = &TechniqueDef> {
        self.techniques.values()
    }

    /// All techniques, mutably
    pub fn techniques_mut(&mut self) -> impl Iterator<Item = &mut TechniqueDef> {
        self.techniques.values_mut()
    }

    /// Technique names in order
    pub fn technique_names(&self) -> impl Iterator<Item = &str> {
        self.techniques.keys().map(String::as_str)
    }

    /// Get a material parameter
    pub fn mat_param(&self, name: &str) -> Option<&MatParam> {
        self.mat_params.get(name)
    }

    /// Get a material parameter, failing if it does not exist
    pub fn find_mat_param(&self, name: &str) -> Result<&MatParam> {
        self.mat_param(name)
            .ok_or_else(|| GraphError::MaterialParameterNotFound(name.to_string()))
    }

    /// All material parameters
    pub fn mat_params(&self) -> impl Iterator<Item = &MatParam> {
        self.mat_params.values()
    }

    /// Add a parameter; returns false if the name is taken
    pub fn add_mat_param(&mut self, param: MatParam) -> bool {
        if self.mat_params.contains_key(&param.name) {
            return false;
        }
        self.mat_params.insert(param.name.clone(), param);
        true
    }

    /// Insert a parameter at a position
    pub fn insert_mat_param(&mut self, index: usize, param: MatParam) {
        let index = index.min(self.mat_params.len());
        self.mat_params.shift_insert(index, param.name.clone(), param);
    }

    /// Remove a parameter, returning its position and the parameter
    pub fn remove_mat_param(&mut self, name: &str) -> Option<(usize, MatParam)> {
        self.mat_params
            .shift_remove_full(name)
            .map(|(index, _, param)| (index, param))
    }
}
