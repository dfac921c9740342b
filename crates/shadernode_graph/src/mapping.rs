// SPDX-License-Identifier: MIT OR Apache-2.0
//! Variable mappings: the edges of a shader node graph.

use crate::variable::{Namespace, ShaderNodeVariable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Right-hand side of a mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MappingSource {
    /// Another variable
    Variable(ShaderNodeVariable),
    /// A literal expression (`vec4(1.0)`, `0.5`)
    Expression(String),
}

/// Which mapping list of a shader node a mapping belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingList {
    /// Input mappings (left variable is one of the node's inputs)
    Input,
    /// Output mappings (left variable is a global or other output)
    Output,
}

/// Assignment of a source to a target variable.
///
/// Exactly one of [`right_variable`](Self::right_variable) and
/// [`right_expression`](Self::right_expression) is set; the source is stored as
/// a [`MappingSource`] so the other can never be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableMapping {
    left_variable: ShaderNodeVariable,
    right: MappingSource,
    left_swizzle: String,
    right_swizzle: String,
}

impl VariableMapping {
    /// Map a variable onto a target variable
    pub fn new(left: ShaderNodeVariable, right: ShaderNodeVariable) -> Self {
        Self {
            left_variable: left,
            right: MappingSource::Variable(right),
            left_swizzle: String::new(),
            right_swizzle: String::new(),
        }
    }

    /// Map a literal expression onto a target variable
    pub fn expression(left: ShaderNodeVariable, expression: impl Into<String>) -> Self {
        Self {
            left_variable: left,
            right: MappingSource::Expression(expression.into()),
            left_swizzle: String::new(),
            right_swizzle: String::new(),
        }
    }

    /// Set the left swizzle
    pub fn with_left_swizzle(mut self, swizzle: impl Into<String>) -> Self {
        self.left_swizzle = swizzle.into();
        self
    }

    /// Set the right swizzle
    pub fn with_right_swizzle(mut self, swizzle: impl Into<String>) -> Self {
        self.right_swizzle = swizzle.into();
        self
    }

    /// Target variable
    pub fn left_variable(&self) -> &ShaderNodeVariable {
        &self.left_variable
    }

    /// Mutable target variable (for flag updates)
    pub fn left_variable_mut(&mut self) -> &mut ShaderNodeVariable {
        &mut self.left_variable
    }

    /// Source of the mapping
    pub fn source(&self) -> &MappingSource {
        &self.right
    }

    /// Source variable, if the mapping is not an expression
    pub fn right_variable(&self) -> Option<&ShaderNodeVariable> {
        match &self.right {
            MappingSource::Variable(var) => Some(var),
            MappingSource::Expression(_) => None,
        }
    }

    /// Mutable source variable
    pub fn right_variable_mut(&mut self) -> Option<&mut ShaderNodeVariable> {
        match &mut self.right {
            MappingSource::Variable(var) => Some(var),
            MappingSource::Expression(_) => None,
        }
    }

    /// Source expression, if the mapping is not a variable
    pub fn right_expression(&self) -> Option<&str> {
        match &self.right {
            MappingSource::Expression(expr) => Some(expr),
            MappingSource::Variable(_) => None,
        }
    }

    /// Left component selector (empty if none)
    pub fn left_swizzle(&self) -> &str {
        &self.left_swizzle
    }

    /// Right component selector (empty if none)
    pub fn right_swizzle(&self) -> &str {
        &self.right_swizzle
    }

    /// Whether this mapping writes the same target slot as `other`
    pub fn same_target(&self, other: &VariableMapping) -> bool {
        self.left_variable == other.left_variable && self.left_swizzle == other.left_swizzle
    }

    /// Whether the source variable lives in the given namespace
    pub fn reads_from(&self, namespace: &Namespace) -> bool {
        self.right_variable().is_some_and(|var| var.is_in(namespace))
    }

    /// Whether the source is exactly the given variable
    pub fn reads(&self, variable: &ShaderNodeVariable) -> bool {
        self.right_variable() == Some(variable)
    }

    /// List this mapping belongs to when owned by the named node
    pub fn list_for(&self, node_name: &str) -> MappingList {
        if self.left_variable.node_name() == Some(node_name) {
            MappingList::Input
        } else {
            MappingList::Output
        }
    }
}

impl fmt::Display for VariableMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.left_variable)?;
        if !self.left_swizzle.is_empty() {
            write!(f, ".{}", self.left_swizzle)?;
        }
        match &self.right {
            MappingSource::Variable(var) => write!(f, " = {var}")?,
            MappingSource::Expression(expr) => write!(f, " = %{{{expr}}}")?,
        }
        if !self.right_swizzle.is_empty() {
            write!(f, ".{}", self.right_swizzle)?;
        }
        Ok(())
    }
}
