// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node graph model.
//!
//! This crate holds the data a shader node material is made of:
//! - Shader node definitions (read-only templates loaded from assets)
//! - Shader nodes placed in a technique
//! - Variable mappings connecting node inputs to sources
//! - Per-technique generation info (attributes, uniforms, varyings, globals)
//!
//! ## Architecture
//!
//! Variables are identified by `(namespace, name)` and mappings refer to
//! other nodes by name, never by pointer. Mutation with undo support lives in
//! the editor crate; this crate only offers the lookups and primitive edits
//! it builds on, plus the swizzle resolver deciding which connections are
//! legal.

pub mod variable;
pub mod mapping;
pub mod definition;
pub mod node;
pub mod generation_info;
pub mod technique;
pub mod material;
pub mod entity;
pub mod swizzle;
pub mod error;

pub use variable::{Namespace, ShaderNodeVariable};
pub use mapping::{MappingList, MappingSource, VariableMapping};
pub use definition::{DefinitionRegistry, ShaderNodeDefinition, ShaderType};
pub use node::ShaderNode;
pub use generation_info::ShaderGenerationInfo;
pub use technique::{MappingRef, TechniqueDef};
pub use material::{MatParam, MaterialDef, UniformBinding, VarType};
pub use entity::GraphEntity;
pub use error::{GraphError, Result};
