// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-technique bookkeeping consumed by the shader generator.

use crate::definition::ShaderType;
use crate::variable::ShaderNodeVariable;
use serde::{Deserialize, Serialize};

/// Declared attributes, uniforms, varyings and globals of a technique.
///
/// Lists keep insertion order so that removals can be undone at the exact
/// position they were made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderGenerationInfo {
    /// Vertex attributes (`Attr` namespace)
    pub attributes: Vec<ShaderNodeVariable>,
    /// Uniforms declared in the vertex shader
    pub vertex_uniforms: Vec<ShaderNodeVariable>,
    /// Uniforms declared in the fragment shader
    pub fragment_uniforms: Vec<ShaderNodeVariable>,
    /// Vertex outputs interpolated into the fragment stage
    pub varyings: Vec<ShaderNodeVariable>,
    /// Vertex stage global output
    pub vertex_global: ShaderNodeVariable,
    /// Fragment stage global outputs
    pub fragment_globals: Vec<ShaderNodeVariable>,
    /// Names of nodes excluded from generation
    pub unused_nodes: Vec<String>,
}

impl ShaderGenerationInfo {
    /// Create generation info with the default globals
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            vertex_uniforms: Vec::new(),
            fragment_uniforms: Vec::new(),
            varyings: Vec::new(),
            vertex_global: ShaderNodeVariable::global("position", "vec4"),
            fragment_globals: vec![ShaderNodeVariable::global("color", "vec4")],
            unused_nodes: Vec::new(),
        }
    }

    /// Uniform list of a stage
    pub fn uniforms(&self, shader_type: ShaderType) -> &Vec<ShaderNodeVariable> {
        match shader_type {
            ShaderType::Vertex => &self.vertex_uniforms,
            ShaderType::Fragment => &self.fragment_uniforms,
        }
    }

    /// Mutable uniform list of a stage
    pub fn uniforms_mut(&mut self, shader_type: ShaderType) -> &mut Vec<ShaderNodeVariable> {
        match shader_type {
            ShaderType::Vertex => &mut self.vertex_uniforms,
            ShaderType::Fragment => &mut self.fragment_uniforms,
        }
    }

    /// Whether the variable is one of the global outputs
    pub fn is_global(&self, variable: &ShaderNodeVariable) -> bool {
        &self.vertex_global == variable || self.fragment_globals.contains(variable)
    }

    /// Stage a global output belongs to
    pub fn global_stage(&self, variable: &ShaderNodeVariable) -> Option<ShaderType> {
        if &self.vertex_global == variable {
            Some(ShaderType::Vertex)
        } else if self.fragment_globals.contains(variable) {
            Some(ShaderType::Fragment)
        } else {
            None
        }
    }

    /// Whether a node is excluded from generation
    pub fn is_unused(&self, node_name: &str) -> bool {
        self.unused_nodes.iter().any(|n| n == node_name)
    }

    /// Mark a node unused; returns false if it already was
    pub fn mark_unused(&mut self, node_name: &str) -> bool {
        if self.is_unused(node_name) {
            return false;
        }
        self.unused_nodes.push(node_name.to_string());
        true
    }

    /// Mark a node used, returning its former position in the unused list
    pub fn mark_used(&mut self, node_name: &str) -> Option<usize> {
        let index = self.unused_nodes.iter().position(|n| n == node_name)?;
        self.unused_nodes.remove(index);
        Some(index)
    }

    /// Put a node back into the unused list at a position
    pub fn restore_unused(&mut self, index: usize, node_name: &str) {
        let index = index.min(self.unused_nodes.len());
        self.unused_nodes.insert(index, node_name.to_string());
    }
}

impl Default for ShaderGenerationInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove a variable from a list, returning its former index and the
/// entry as it was stored
pub fn remove_variable(
    list: &mut Vec<ShaderNodeVariable>,
    variable: &ShaderNodeVariable,
) -> Option<(usize, ShaderNodeVariable)> {
    let index = list.iter().position(|v| v == variable)?;
    Some((index, list.remove(index)))
}

/// Insert a variable at an index (clamped to the list length)
pub fn insert_variable(
    list: &mut Vec<ShaderNodeVariable>,
    index: usize,
    variable: ShaderNodeVariable,
) {
    let index = index.min(list.len());
    list.insert(index, variable);
}
