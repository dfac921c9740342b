// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type compatibility and implicit swizzles between shader variables.
//!
//! Identical types always connect. Vector and scalar types of the same
//! component kind connect through a swizzle:
//! - a wider source is truncated with a right swizzle (`vec4` -> `vec3` is
//!   `.xyz`)
//! - a narrower source writes only the leading components of the target
//!   through a left swizzle (`float` -> `vec3` writes `.x`)
//!
//! Everything else is rejected, including vectors of equal size but
//! different component kinds.

use crate::error::{GraphError, Result};
use crate::variable::ShaderNodeVariable;

/// Component names in order
const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];

/// Accepted component name sets
const COMPONENT_SETS: [[char; 4]; 3] = [
    ['x', 'y', 'z', 'w'],
    ['r', 'g', 'b', 'a'],
    ['s', 't', 'p', 'q'],
];

/// Component kind of a scalar or vector type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// `float`, `vecN`
    Float,
    /// `int`, `ivecN`
    Int,
    /// `uint`, `uvecN`
    UInt,
    /// `bool`, `bvecN`
    Bool,
}

/// A scalar (size 1) or vector type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorType {
    /// Component kind
    pub kind: ScalarKind,
    /// Number of components (1 to 4)
    pub size: usize,
}

impl VectorType {
    /// Parse a GLSL scalar or vector type name
    pub fn parse(ty: &str) -> Option<Self> {
        let scalar = match ty {
            "float" => Some(ScalarKind::Float),
            "int" => Some(ScalarKind::Int),
            "uint" => Some(ScalarKind::UInt),
            "bool" => Some(ScalarKind::Bool),
            _ => None,
        };
        if let Some(kind) = scalar {
            return Some(Self { kind, size: 1 });
        }

        let (kind, rest) = if let Some(rest) = ty.strip_prefix("ivec") {
            (ScalarKind::Int, rest)
        } else if let Some(rest) = ty.strip_prefix("uvec") {
            (ScalarKind::UInt, rest)
        } else if let Some(rest) = ty.strip_prefix("bvec") {
            (ScalarKind::Bool, rest)
        } else if let Some(rest) = ty.strip_prefix("vec") {
            (ScalarKind::Float, rest)
        } else {
            return None;
        };

        match rest {
            "2" => Some(Self { kind, size: 2 }),
            "3" => Some(Self { kind, size: 3 }),
            "4" => Some(Self { kind, size: 4 }),
            _ => None,
        }
    }

    /// GLSL name of the type
    pub fn glsl_name(self) -> String {
        if self.size == 1 {
            return match self.kind {
                ScalarKind::Float => "float",
                ScalarKind::Int => "int",
                ScalarKind::UInt => "uint",
                ScalarKind::Bool => "bool",
            }
            .to_string();
        }
        let prefix = match self.kind {
            ScalarKind::Float => "",
            ScalarKind::Int => "i",
            ScalarKind::UInt => "u",
            ScalarKind::Bool => "b",
        };
        format!("{prefix}vec{}", self.size)
    }
}

/// Swizzles needed to connect a source to a target (empty when none)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Swizzles {
    /// Components of the target that receive the value
    pub left: String,
    /// Components of the source that are read
    pub right: String,
}

/// Resolve how a `source_type` value connects to a `target_type` slot
pub fn resolve(source_type: &str, target_type: &str) -> Option<Swizzles> {
    if source_type == target_type {
        return Some(Swizzles::default());
    }

    let source = VectorType::parse(source_type)?;
    let target = VectorType::parse(target_type)?;
    if source.kind != target.kind {
        return None;
    }

    let mut swizzles = Swizzles::default();
    if source.size > target.size {
        swizzles.right = leading_components(target.size);
    } else if source.size < target.size {
        swizzles.left = leading_components(source.size);
    }
    Some(swizzles)
}

/// Whether a value of `source_type` can feed a `target_type` slot
pub fn can_connect(source_type: &str, target_type: &str) -> bool {
    resolve(source_type, target_type).is_some()
}

/// Right swizzle for mapping `source` onto `target` (empty if none)
pub fn right_swizzle(target: &ShaderNodeVariable, source: &ShaderNodeVariable) -> String {
    resolve(&source.var_type, &target.var_type)
        .map(|s| s.right)
        .unwrap_or_default()
}

/// Left swizzle for mapping `source` onto `target` (empty if none)
pub fn left_swizzle(target: &ShaderNodeVariable, source: &ShaderNodeVariable) -> String {
    resolve(&source.var_type, &target.var_type)
        .map(|s| s.left)
        .unwrap_or_default()
}

fn leading_components(count: usize) -> String {
    COMPONENTS.iter().take(count).collect()
}

/// Index of a component name in any accepted set
pub fn component_index(component: char) -> Option<usize> {
    COMPONENT_SETS
        .iter()
        .find_map(|set| set.iter().position(|&c| c == component))
}

/// Check a swizzle string: up to four components from a single name set
pub fn validate(swizzle: &str) -> Result<()> {
    if swizzle.is_empty() {
        return Ok(());
    }
    let invalid = || GraphError::InvalidSwizzle(swizzle.to_string());
    if swizzle.chars().count() > 4 {
        return Err(invalid());
    }
    let single_set = COMPONENT_SETS
        .iter()
        .any(|set| swizzle.chars().all(|c| set.contains(&c)));
    if !single_set {
        return Err(invalid());
    }
    Ok(())
}

/// Apply a swizzle to a concrete value
pub fn apply(values: &[f32], swizzle: &str) -> Result<Vec<f32>> {
    validate(swizzle)?;
    if swizzle.is_empty() {
        return Ok(values.to_vec());
    }
    swizzle
        .chars()
        .map(|c| {
            component_index(c)
                .and_then(|i| values.get(i).copied())
                .ok_or_else(|| GraphError::InvalidSwizzle(swizzle.to_string()))
        })
        .collect()
}

/// Type of a value of `ty` after applying a swizzle
pub fn swizzled_type(ty: &str, swizzle: &str) -> Result<String> {
    validate(swizzle)?;
    if swizzle.is_empty() {
        return Ok(ty.to_string());
    }
    let vector = VectorType::parse(ty).ok_or_else(|| GraphError::UnknownType(ty.to_string()))?;
    let out_of_range = swizzle
        .chars()
        .any(|c| component_index(c).map_or(true, |i| i >= vector.size));
    if out_of_range {
        return Err(GraphError::InvalidSwizzle(swizzle.to_string()));
    }
    Ok(VectorType {
        kind: vector.kind,
        size: swizzle.chars().count(),
    }
    .glsl_name())
}
