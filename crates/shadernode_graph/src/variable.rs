// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader variables and the namespaces they live in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Namespace of a shader variable.
///
/// The set is closed: every variable belongs either to a shader node
/// (namespaced by the node name) or to one of the fixed technique-wide
/// namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// Input or output of the shader node with this name
    Node(String),
    /// Vertex attribute (`Attr`)
    Attr,
    /// Material parameter (`MatParam`)
    MatParam,
    /// Engine-supplied world parameter (`WorldParam`)
    WorldParam,
    /// Implicit global output (`Global`)
    Global,
}

impl Namespace {
    /// Namespace of a shader node
    pub fn node(name: impl Into<String>) -> Self {
        Self::Node(name.into())
    }

    /// The node name if this is a node namespace
    pub fn node_name(&self) -> Option<&str> {
        match self {
            Self::Node(name) => Some(name),
            _ => None,
        }
    }

    /// Name as written in a mapping expression
    pub fn as_str(&self) -> &str {
        match self {
            Self::Node(name) => name,
            Self::Attr => "Attr",
            Self::MatParam => "MatParam",
            Self::WorldParam => "WorldParam",
            Self::Global => "Global",
        }
    }

    /// Prefix the engine adds to the declared GLSL name
    pub fn default_prefix(&self) -> &'static str {
        match self {
            Self::MatParam => "m_",
            Self::WorldParam => "g_",
            Self::Node(_) | Self::Attr | Self::Global => "",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed, namespaced shader value.
///
/// Identity is `(namespace, name)`: two variables with the same namespace and
/// name are equal even when their type or flags differ, which lets a type be
/// changed in place without breaking mappings that refer to the variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderNodeVariable {
    /// GLSL type (`vec4`, `float`, `sampler2D`, ...)
    pub var_type: String,
    /// Namespace the variable belongs to
    pub namespace: Namespace,
    /// Variable name
    pub name: String,
    /// Array size, either a literal or the name of a define
    pub multiplicity: Option<String>,
    /// Engine prefix prepended on declaration (`m_`, `g_`)
    pub prefix: String,
    /// Default value expression (for node inputs)
    pub default_value: Option<String>,
    /// Whether the variable is written out of its stage (a varying)
    pub shader_output: bool,
}

impl ShaderNodeVariable {
    /// Create a new variable
    pub fn new(var_type: impl Into<String>, namespace: Namespace, name: impl Into<String>) -> Self {
        let prefix = namespace.default_prefix().to_string();
        Self {
            var_type: var_type.into(),
            namespace,
            name: name.into(),
            multiplicity: None,
            prefix,
            default_value: None,
            shader_output: false,
        }
    }

    /// Create a vertex attribute (`Attr.inPosition`)
    pub fn attribute(name: impl Into<String>, var_type: impl Into<String>) -> Self {
        Self::new(var_type, Namespace::Attr, name)
    }

    /// Create a material parameter variable (`MatParam.Color`)
    pub fn material_parameter(name: impl Into<String>, var_type: impl Into<String>) -> Self {
        Self::new(var_type, Namespace::MatParam, name)
    }

    /// Create a world parameter variable (`WorldParam.WorldViewProjectionMatrix`)
    pub fn world_parameter(name: impl Into<String>, var_type: impl Into<String>) -> Self {
        Self::new(var_type, Namespace::WorldParam, name)
    }

    /// Create a global variable (`Global.color`)
    pub fn global(name: impl Into<String>, var_type: impl Into<String>) -> Self {
        Self::new(var_type, Namespace::Global, name)
    }

    /// Create a node input/output variable
    pub fn node_variable(
        node: impl Into<String>,
        name: impl Into<String>,
        var_type: impl Into<String>,
    ) -> Self {
        Self::new(var_type, Namespace::node(node), name)
    }

    /// Set the array multiplicity
    pub fn with_multiplicity(mut self, multiplicity: impl Into<String>) -> Self {
        self.multiplicity = Some(multiplicity.into());
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Copy of this variable moved into another namespace
    pub fn in_namespace(&self, namespace: Namespace) -> Self {
        Self {
            prefix: namespace.default_prefix().to_string(),
            namespace,
            ..self.clone()
        }
    }

    /// Check if the variable belongs to a namespace
    pub fn is_in(&self, namespace: &Namespace) -> bool {
        &self.namespace == namespace
    }

    /// Name of the owning node, if this is a node variable
    pub fn node_name(&self) -> Option<&str> {
        self.namespace.node_name()
    }

    /// Name as declared in generated code, prefix included
    pub fn declared_name(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }
}

impl PartialEq for ShaderNodeVariable {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }
}

impl Eq for ShaderNodeVariable {}

impl Hash for ShaderNodeVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for ShaderNodeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_type() {
        let a = ShaderNodeVariable::node_variable("Color", "outColor", "vec4");
        let mut b = a.clone();
        b.var_type = "vec3".to_string();
        b.shader_output = true;
        assert_eq!(a, b);

        let other_ns = ShaderNodeVariable::node_variable("Color1", "outColor", "vec4");
        assert_ne!(a, other_ns);
    }

    #[test]
    fn test_prefixes() {
        let param = ShaderNodeVariable::material_parameter("Color", "vec4");
        assert_eq!(param.declared_name(), "m_Color");

        let world = ShaderNodeVariable::world_parameter("Time", "float");
        assert_eq!(world.declared_name(), "g_Time");
        assert_eq!(world.to_string(), "WorldParam.Time");
    }

    #[test]
    fn test_namespace_move() {
        let def_var =
            ShaderNodeVariable::node_variable("Mix", "color1", "vec4").with_default("vec4(1.0)");
        let moved = def_var.in_namespace(Namespace::node("Mix2"));
        assert_eq!(moved.node_name(), Some("Mix2"));
        assert_eq!(moved.default_value.as_deref(), Some("vec4(1.0)"));
    }
}
