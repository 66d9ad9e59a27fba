//! Schema Model
//!
//! Typed, validated in-memory representation of a property-graph domain
//! model: node types, edge types, properties, inheritance relations,
//! cardinalities, contained-node relations, and constant tables.
//!
//! The model is built once from a fully-parsed [`SchemaSource`] and is
//! immutable thereafter. Resolver and encoder passes are pure functions of
//! it, so a renderer may query it from multiple threads without locking.

mod build;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the universal root node type. Every polymorphic accessor that
/// cannot be given a more specific static type falls back to it. It is also
/// the "any node" sentinel for contained-node declarations and always
/// resolves, without being declared.
pub const ABSTRACT_NODE: &str = "ABSTRACT_NODE";

// =============================================================================
// Value Type
// =============================================================================

/// Semantic value type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    String,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    List,
    NodeRef,
    Unknown,
}

impl ValueType {
    /// Check whether a declared default value matches this value type.
    ///
    /// Numeric defaults are range-checked against the declared width.
    /// NodeRef and Unknown properties cannot carry defaults.
    pub fn admits_default(&self, default: &DefaultValue) -> bool {
        match (self, default) {
            (ValueType::Boolean, DefaultValue::Bool(_)) => true,
            (ValueType::String, DefaultValue::Str(_)) => true,
            (ValueType::Char, DefaultValue::Str(s)) => s.chars().count() == 1,
            (ValueType::Byte, DefaultValue::Int(i)) => i8::try_from(*i).is_ok(),
            (ValueType::Short, DefaultValue::Int(i)) => i16::try_from(*i).is_ok(),
            (ValueType::Int, DefaultValue::Int(i)) => i32::try_from(*i).is_ok(),
            (ValueType::Long, DefaultValue::Int(_)) => true,
            (ValueType::Float | ValueType::Double, DefaultValue::Float(_)) => true,
            (ValueType::Float | ValueType::Double, DefaultValue::Int(_)) => true,
            (ValueType::List, DefaultValue::List(_)) => true,
            _ => false,
        }
    }
}

// =============================================================================
// Cardinality
// =============================================================================

/// Cardinality of a property, neighbor, or contained-node accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Exactly one value
    One,
    /// Optional value
    ZeroOrOne,
    /// Ordered, possibly empty sequence. Never a set: declaration order of
    /// multi-valued properties is semantically meaningful.
    List,
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::One
    }
}

// =============================================================================
// Default Value
// =============================================================================

/// Default value of a property, type-matched against its [`ValueType`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<DefaultValue>),
}

// NaN defaults compare by is_nan, not float equality.
impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DefaultValue::Bool(a), DefaultValue::Bool(b)) => a == b,
            (DefaultValue::Int(a), DefaultValue::Int(b)) => a == b,
            (DefaultValue::Float(a), DefaultValue::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (DefaultValue::Str(a), DefaultValue::Str(b)) => a == b,
            (DefaultValue::List(a), DefaultValue::List(b)) => a == b,
            _ => false,
        }
    }
}

// =============================================================================
// Declared Entities
// =============================================================================

/// A declared property, owned by node types or edge types via `has_keys`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Declared name, unique within its namespace (node- or edge-property)
    pub name: String,
    /// Semantic value type
    pub value_type: ValueType,
    /// Accessor cardinality
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Optional default value, type-matched to `value_type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Stable binary identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proto_id: Option<u32>,
    /// Documentation comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// An abstract, trait-like node kind sharing properties across node types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBaseType {
    pub name: String,
    /// Directly-owned property names
    #[serde(default)]
    pub has_keys: Vec<String>,
    /// Directly-extended base type names
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One allowed endpoint of an outbound edge declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointTarget {
    /// Declared node type name (or the `ABSTRACT_NODE` sentinel)
    pub node_name: String,
    /// Optional cardinality annotation, e.g. `"1:1"`, `"1:0-1"`, `"1:n"`.
    /// The left side constrains the inbound traversal, the right side the
    /// outbound one. Unrecognized annotations degrade to List.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<String>,
}

/// An outbound edge declaration on a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutEdge {
    pub edge_name: String,
    /// Allowed destination nodes in declaration order
    pub inbound_nodes: Vec<EndpointTarget>,
}

/// A strongly-typed child relation declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainedNode {
    /// Declared node type of the children (or `ABSTRACT_NODE`)
    pub node_type: String,
    /// Local accessor name on the owning node
    pub local_name: String,
    #[serde(default)]
    pub cardinality: Cardinality,
}

/// A concrete, instantiable node kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    pub name: String,
    /// Stable numeric label id, required for concrete node types
    pub proto_id: u32,
    #[serde(default)]
    pub has_keys: Vec<String>,
    /// Extended base type names
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub out_edges: Vec<OutEdge>,
    /// Ordered contained-node relations
    #[serde(default)]
    pub contained_nodes: Vec<ContainedNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A typed relation kind connecting two node instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeType {
    pub name: String,
    pub proto_id: u32,
    #[serde(default)]
    pub has_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A declared constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: String,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Constants grouped by category (e.g. dispatch types, operators)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantGroup {
    pub category: String,
    pub constants: Vec<Constant>,
}

// =============================================================================
// Schema Source
// =============================================================================

/// The raw, fully-parsed schema declaration handed to [`Schema::build`].
///
/// The on-disk encoding is out of scope; an external loader deserializes
/// into this structure (all fields are serde-deserializable).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSource {
    /// Node property declarations, in declaration order
    #[serde(default)]
    pub node_keys: Vec<Property>,
    /// Edge property declarations, in declaration order
    #[serde(default)]
    pub edge_keys: Vec<Property>,
    #[serde(default)]
    pub node_base_types: Vec<NodeBaseType>,
    #[serde(default)]
    pub node_types: Vec<NodeType>,
    #[serde(default)]
    pub edge_types: Vec<EdgeType>,
    #[serde(default)]
    pub constants: Vec<ConstantGroup>,
}

// =============================================================================
// Derived Views
// =============================================================================

/// One inbound-edge context of a node: an edge name plus the source nodes
/// that declare an outbound edge of that name pointing at this node.
///
/// The schema only declares edges from their outbound side; this view is
/// derived by inverting every `out_edges` declaration across all node types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InEdgeContext {
    pub edge_name: String,
    /// Source nodes in deterministic scan order (node-type declaration
    /// order), carrying the cardinality annotation from their declaration
    pub neighbor_nodes: Vec<EndpointTarget>,
}

/// Union view over concrete node types and base types, as seen by the
/// type-hierarchy resolver
#[derive(Debug, Clone, Copy)]
pub enum AbstractNodeType<'a> {
    Node(&'a NodeType),
    Base(&'a NodeBaseType),
}

impl<'a> AbstractNodeType<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            AbstractNodeType::Node(n) => &n.name,
            AbstractNodeType::Base(b) => &b.name,
        }
    }

    /// Directly-extended base type names
    pub fn extends(&self) -> &'a [String] {
        match self {
            AbstractNodeType::Node(n) => &n.extends,
            AbstractNodeType::Base(b) => &b.extends,
        }
    }

    pub fn has_keys(&self) -> &'a [String] {
        match self {
            AbstractNodeType::Node(n) => &n.has_keys,
            AbstractNodeType::Base(b) => &b.has_keys,
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// The validated, immutable schema model.
///
/// Built once via [`Schema::build`]; read-only for the remainder of the
/// compilation run. Declaration order is preserved everywhere it is
/// semantically meaningful (driver iteration, accessor offsets).
#[derive(Debug)]
pub struct Schema {
    source: SchemaSource,

    // Name indexes into the declaration vectors
    node_types_by_name: HashMap<String, usize>,
    base_types_by_name: HashMap<String, usize>,
    edge_types_by_name: HashMap<String, usize>,
    node_keys_by_name: HashMap<String, usize>,
    edge_keys_by_name: HashMap<String, usize>,

    /// Derived inbound-edge view: destination node name -> contexts
    in_edge_contexts: HashMap<String, Vec<InEdgeContext>>,
}

impl Schema {
    /// Concrete node types in declaration order
    pub fn node_types(&self) -> &[NodeType] {
        &self.source.node_types
    }

    /// Abstract base types in declaration order
    pub fn node_base_types(&self) -> &[NodeBaseType] {
        &self.source.node_base_types
    }

    /// Edge types in declaration order
    pub fn edge_types(&self) -> &[EdgeType] {
        &self.source.edge_types
    }

    /// Node property declarations in declaration order
    pub fn node_keys(&self) -> &[Property] {
        &self.source.node_keys
    }

    /// Edge property declarations in declaration order
    pub fn edge_keys(&self) -> &[Property] {
        &self.source.edge_keys
    }

    /// Constant groups in declaration order
    pub fn constant_groups(&self) -> &[ConstantGroup] {
        &self.source.constants
    }

    /// Constants declared under a category, in declaration order
    pub fn constants_from_element(&self, category: &str) -> &[Constant] {
        self.source
            .constants
            .iter()
            .find(|g| g.category == category)
            .map(|g| g.constants.as_slice())
            .unwrap_or(&[])
    }

    pub fn node_type_by_name(&self, name: &str) -> Option<&NodeType> {
        self.node_types_by_name
            .get(name)
            .map(|&i| &self.source.node_types[i])
    }

    pub fn node_base_type_by_name(&self, name: &str) -> Option<&NodeBaseType> {
        self.base_types_by_name
            .get(name)
            .map(|&i| &self.source.node_base_types[i])
    }

    pub fn edge_type_by_name(&self, name: &str) -> Option<&EdgeType> {
        self.edge_types_by_name
            .get(name)
            .map(|&i| &self.source.edge_types[i])
    }

    pub fn node_property_by_name(&self, name: &str) -> Option<&Property> {
        self.node_keys_by_name
            .get(name)
            .map(|&i| &self.source.node_keys[i])
    }

    pub fn edge_property_by_name(&self, name: &str) -> Option<&Property> {
        self.edge_keys_by_name
            .get(name)
            .map(|&i| &self.source.edge_keys[i])
    }

    /// Resolve a name to the union view over node and base types
    pub fn abstract_node_type(&self, name: &str) -> Option<AbstractNodeType<'_>> {
        if let Some(node) = self.node_type_by_name(name) {
            return Some(AbstractNodeType::Node(node));
        }
        self.node_base_type_by_name(name).map(AbstractNodeType::Base)
    }

    /// All node and base types (base types first), in declaration order
    pub fn all_abstract_types(&self) -> impl Iterator<Item = AbstractNodeType<'_>> {
        self.source
            .node_base_types
            .iter()
            .map(AbstractNodeType::Base)
            .chain(self.source.node_types.iter().map(AbstractNodeType::Node))
    }

    /// Whether a name resolves as a node reference (declared node type,
    /// declared base type, or the `ABSTRACT_NODE` sentinel)
    pub fn resolves_as_node(&self, name: &str) -> bool {
        name == ABSTRACT_NODE
            || self.node_types_by_name.contains_key(name)
            || self.base_types_by_name.contains_key(name)
    }

    /// Derived inbound-edge contexts for a node, in deterministic scan order
    pub fn in_edge_contexts(&self, node_name: &str) -> &[InEdgeContext] {
        self.in_edge_contexts
            .get(node_name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_value_nan_equality() {
        let a = DefaultValue::Float(f64::NAN);
        let b = DefaultValue::Float(f64::NAN);
        assert_eq!(a, b);
        assert_ne!(DefaultValue::Float(f64::NAN), DefaultValue::Float(1.0));
    }

    #[test]
    fn test_value_type_admits_default() {
        assert!(ValueType::Boolean.admits_default(&DefaultValue::Bool(true)));
        assert!(ValueType::Int.admits_default(&DefaultValue::Int(42)));
        assert!(!ValueType::Byte.admits_default(&DefaultValue::Int(300)));
        assert!(ValueType::Char.admits_default(&DefaultValue::Str("x".into())));
        assert!(!ValueType::Char.admits_default(&DefaultValue::Str("xy".into())));
        assert!(ValueType::Double.admits_default(&DefaultValue::Float(f64::NAN)));
        assert!(!ValueType::NodeRef.admits_default(&DefaultValue::Int(0)));
    }

    #[test]
    fn test_schema_source_deserializes_with_defaults() {
        let source: SchemaSource = serde_json::from_value(serde_json::json!({
            "node_types": [
                { "name": "CALL", "proto_id": 15 }
            ]
        }))
        .unwrap();
        assert_eq!(source.node_types.len(), 1);
        assert!(source.node_types[0].out_edges.is_empty());
        assert!(source.node_keys.is_empty());
    }
}
