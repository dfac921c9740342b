// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised by graph lookups and definition loading.

use std::path::PathBuf;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error when a graph lookup or definition load fails
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// No technique with this name in the material
    #[error("Technique not found: {0}")]
    TechniqueNotFound(String),

    /// No shader node with this name in the technique
    #[error("Shader node not found: {0}")]
    NodeNotFound(String),

    /// No variable with this name on the node or definition
    #[error("Variable not found: {namespace}.{name}")]
    VariableNotFound {
        /// Namespace searched
        namespace: String,
        /// Variable name
        name: String,
    },

    /// No loaded definition with this name
    #[error("Shader node definition not found: {0}")]
    DefinitionNotFound(String),

    /// No material parameter with this name
    #[error("Material parameter not found: {0}")]
    MaterialParameterNotFound(String),

    /// Type string is not a known GLSL type
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Swizzle string is malformed
    #[error("Invalid swizzle: {0}")]
    InvalidSwizzle(String),

    /// Failed to read a definition file
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to parse a definition file
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },
}
