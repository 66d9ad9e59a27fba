//! Neighbor/Property Encoder
//!
//! Derives, for each node and edge type, the full set of typed accessors it
//! must expose: per-property semantic type and cardinality, per-endpoint
//! neighbor type and cardinality, contained-node accessors, and stable
//! adjacency offsets. Naming follows a fixed convention so generated output
//! never depends on anything but the declared schema.
//!
//! All encoding is a pure function of the immutable schema plus the
//! resolver; soft errors are reported through a caller-supplied
//! [`Diagnostics`] sink rather than any process-wide state.

pub mod cardinality;
pub mod names;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::hierarchy::HierarchyResolver;
use crate::model::{Cardinality, EdgeType, EndpointTarget, NodeType, Schema, ValueType};

use cardinality::EdgeCardinality;
use names::{camel_case, upper_camel_case};

// =============================================================================
// Semantic Type
// =============================================================================

/// Concrete shape of a property accessor's return type.
///
/// List cardinality always yields an ordered, index-preserving sequence
/// (never a set): declaration order of multi-valued properties is
/// semantically meaningful. An empty sequence is an empty list, not a
/// missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value_type", rename_all = "snake_case")]
pub enum SemanticType {
    /// Exactly one scalar value
    Scalar(ValueType),
    /// Optional scalar value
    Optional(ValueType),
    /// Ordered sequence of scalar values
    Sequence(ValueType),
}

impl SemanticType {
    /// The (value type, cardinality) encoding rule
    pub fn of(value_type: ValueType, cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::One => SemanticType::Scalar(value_type),
            Cardinality::ZeroOrOne => SemanticType::Optional(value_type),
            Cardinality::List => SemanticType::Sequence(value_type),
        }
    }
}

// =============================================================================
// Direction
// =============================================================================

/// Traversal direction of a neighbor accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Out,
    In,
}

impl Direction {
    /// Accessor name suffix
    pub fn suffix(&self) -> &'static str {
        match self {
            Direction::Out => "Out",
            Direction::In => "In",
        }
    }
}

// =============================================================================
// Accessor Descriptors
// =============================================================================

/// A typed property accessor on a node or edge type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAccessor {
    /// Declared property name
    pub property_name: String,
    /// lowerCamelCase accessor name
    pub accessor_name: String,
    /// UpperCamelCase constant name
    pub constant_name: String,
    pub semantic_type: SemanticType,
    pub cardinality: Cardinality,
}

/// A typed neighbor-traversal accessor reading live adjacency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborAccessor {
    /// `⟨neighbor⟩Via⟨Edge⟩⟨Direction⟩`
    pub accessor_name: String,
    pub edge_name: String,
    pub direction: Direction,
    /// Declared name of the neighbor node
    pub neighbor_node: String,
    /// Static class name of the accessor: the neighbor's class when it is
    /// the edge's only allowed endpoint on this side, otherwise the common
    /// root over all allowed endpoints (falling back to the universal root)
    pub neighbor_type: String,
    pub cardinality: Cardinality,
    /// Index into the node's adjacency storage; stable for a given schema
    /// revision
    pub adjacency_offset: usize,
}

/// A typed accessor for a contained-node relation.
///
/// For List cardinality the ordering is defined by an index value on the
/// underlying containment edge; the storage collaborator sorts by it at
/// read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainedNodeAccessor {
    /// Declared local name on the owning node
    pub local_name: String,
    /// lowerCamelCase accessor name
    pub accessor_name: String,
    /// Declared node type of the children
    pub node_type: String,
    /// UpperCamelCase class name of the children
    pub node_class: String,
    pub cardinality: Cardinality,
}

/// Full accessor set of one node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEncoding {
    pub name: String,
    pub class_name: String,
    pub properties: Vec<PropertyAccessor>,
    /// Outbound accessors in declared order, then inbound accessors in
    /// inverted-index order, carrying one continuous offset sequence
    pub neighbors: Vec<NeighborAccessor>,
    pub contained_nodes: Vec<ContainedNodeAccessor>,
}

// =============================================================================
// Encoder
// =============================================================================

/// Derives accessor sets from a validated schema. Pure; safe to query in
/// parallel.
pub struct SchemaEncoder<'a> {
    schema: &'a Schema,
    resolver: &'a HierarchyResolver<'a>,
}

impl<'a> SchemaEncoder<'a> {
    pub fn new(schema: &'a Schema, resolver: &'a HierarchyResolver<'a>) -> Self {
        Self { schema, resolver }
    }

    /// Property accessors for a set of owned node-property names, in
    /// declared key order. References are validated at model load.
    pub fn node_property_accessors(&self, has_keys: &[String]) -> Vec<PropertyAccessor> {
        has_keys
            .iter()
            .filter_map(|key| self.schema.node_property_by_name(key))
            .map(property_accessor)
            .collect()
    }

    /// Property accessors for an edge type's owned keys
    pub fn edge_property_accessors(&self, edge: &EdgeType) -> Vec<PropertyAccessor> {
        edge.has_keys
            .iter()
            .filter_map(|key| self.schema.edge_property_by_name(key))
            .map(property_accessor)
            .collect()
    }

    /// Derive the full accessor set for a node type
    pub fn encode_node(&self, node: &NodeType, diags: &mut Diagnostics) -> NodeEncoding {
        let mut neighbors = Vec::new();
        let mut offset = 0usize;

        // Outbound accessors, declared order
        for out_edge in &node.out_edges {
            let static_type = self.endpoint_type(&out_edge.inbound_nodes);
            for target in &out_edge.inbound_nodes {
                let context = format!("{} -{}-> {}", node.name, out_edge.edge_name, target.node_name);
                let parsed =
                    EdgeCardinality::parse(target.cardinality.as_deref(), &context, diags);
                neighbors.push(NeighborAccessor {
                    accessor_name: neighbor_accessor_name(
                        &target.node_name,
                        &out_edge.edge_name,
                        Direction::Out,
                    ),
                    edge_name: out_edge.edge_name.clone(),
                    direction: Direction::Out,
                    neighbor_node: target.node_name.clone(),
                    neighbor_type: static_type.clone(),
                    cardinality: parsed.outbound,
                    adjacency_offset: offset,
                });
                offset += 1;
            }
        }

        // Inbound accessors, inverted-index order, continuing the offset pass
        for context in self.schema.in_edge_contexts(&node.name) {
            let static_type = self.endpoint_type(&context.neighbor_nodes);
            for source in &context.neighbor_nodes {
                let decl = format!("{} -{}-> {}", source.node_name, context.edge_name, node.name);
                let parsed = EdgeCardinality::parse(source.cardinality.as_deref(), &decl, diags);
                neighbors.push(NeighborAccessor {
                    accessor_name: neighbor_accessor_name(
                        &source.node_name,
                        &context.edge_name,
                        Direction::In,
                    ),
                    edge_name: context.edge_name.clone(),
                    direction: Direction::In,
                    neighbor_node: source.node_name.clone(),
                    neighbor_type: static_type.clone(),
                    cardinality: parsed.inbound,
                    adjacency_offset: offset,
                });
                offset += 1;
            }
        }

        let contained_nodes = node
            .contained_nodes
            .iter()
            .map(|c| ContainedNodeAccessor {
                local_name: c.local_name.clone(),
                accessor_name: camel_case(&c.local_name),
                node_type: c.node_type.clone(),
                node_class: upper_camel_case(&c.node_type),
                cardinality: c.cardinality,
            })
            .collect();

        debug!(node = %node.name, neighbors = neighbors.len(), "node type encoded");

        NodeEncoding {
            name: node.name.clone(),
            class_name: upper_camel_case(&node.name),
            properties: self.node_property_accessors(&node.has_keys),
            neighbors,
            contained_nodes,
        }
    }

    /// Static class name for a set of allowed endpoints on one side of an
    /// edge: the single endpoint's class, or the common root over all of
    /// them, falling back to the universal root node type.
    fn endpoint_type(&self, endpoints: &[EndpointTarget]) -> String {
        if let [single] = endpoints {
            return upper_camel_case(&single.node_name);
        }
        let names: Vec<&str> = endpoints.iter().map(|t| t.node_name.as_str()).collect();
        upper_camel_case(&self.resolver.common_root_or_abstract(&names))
    }
}

fn property_accessor(property: &crate::model::Property) -> PropertyAccessor {
    PropertyAccessor {
        property_name: property.name.clone(),
        accessor_name: camel_case(&property.name),
        constant_name: upper_camel_case(&property.name),
        semantic_type: SemanticType::of(property.value_type, property.cardinality),
        cardinality: property.cardinality,
    }
}

fn neighbor_accessor_name(neighbor: &str, edge: &str, direction: Direction) -> String {
    format!(
        "{}Via{}{}",
        camel_case(neighbor),
        upper_camel_case(edge),
        direction.suffix()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ContainedNode, EdgeType, NodeBaseType, OutEdge, Property, SchemaSource,
    };

    fn test_schema() -> Schema {
        Schema::build(SchemaSource {
            node_keys: vec![
                Property {
                    name: "NAME".into(),
                    value_type: ValueType::String,
                    cardinality: Cardinality::One,
                    default: None,
                    proto_id: Some(5),
                    comment: None,
                },
                Property {
                    name: "ARGUMENT_INDEXES".into(),
                    value_type: ValueType::Int,
                    cardinality: Cardinality::List,
                    default: None,
                    proto_id: Some(6),
                    comment: None,
                },
            ],
            edge_keys: vec![],
            node_base_types: vec![NodeBaseType {
                name: "EXPRESSION".into(),
                has_keys: vec![],
                extends: vec![],
                comment: None,
            }],
            node_types: vec![
                NodeType {
                    name: "CALL".into(),
                    proto_id: 15,
                    has_keys: vec!["NAME".into(), "ARGUMENT_INDEXES".into()],
                    extends: vec!["EXPRESSION".into()],
                    out_edges: vec![OutEdge {
                        edge_name: "AST".into(),
                        inbound_nodes: vec![
                            EndpointTarget {
                                node_name: "IDENTIFIER".into(),
                                cardinality: None,
                            },
                            EndpointTarget {
                                node_name: "LITERAL".into(),
                                cardinality: Some("1:0-1".into()),
                            },
                        ],
                    }],
                    contained_nodes: vec![ContainedNode {
                        node_type: "IDENTIFIER".into(),
                        local_name: "RECEIVER".into(),
                        cardinality: Cardinality::ZeroOrOne,
                    }],
                    comment: None,
                },
                NodeType {
                    name: "IDENTIFIER".into(),
                    proto_id: 27,
                    has_keys: vec!["NAME".into()],
                    extends: vec!["EXPRESSION".into()],
                    out_edges: vec![],
                    contained_nodes: vec![],
                    comment: None,
                },
                NodeType {
                    name: "LITERAL".into(),
                    proto_id: 8,
                    has_keys: vec![],
                    extends: vec!["EXPRESSION".into()],
                    out_edges: vec![],
                    contained_nodes: vec![],
                    comment: None,
                },
            ],
            edge_types: vec![EdgeType {
                name: "AST".into(),
                proto_id: 3,
                has_keys: vec![],
                comment: None,
            }],
            constants: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_property_accessor_shapes() {
        let schema = test_schema();
        let resolver = HierarchyResolver::new(&schema);
        let encoder = SchemaEncoder::new(&schema, &resolver);

        let call = schema.node_type_by_name("CALL").unwrap();
        let props = encoder.node_property_accessors(&call.has_keys);
        assert_eq!(props.len(), 2);

        assert_eq!(props[0].accessor_name, "name");
        assert_eq!(props[0].constant_name, "Name");
        assert_eq!(props[0].semantic_type, SemanticType::Scalar(ValueType::String));

        // List cardinality is an ordered sequence, never a set
        assert_eq!(props[1].accessor_name, "argumentIndexes");
        assert_eq!(
            props[1].semantic_type,
            SemanticType::Sequence(ValueType::Int)
        );
    }

    #[test]
    fn test_outbound_neighbor_accessors() {
        let schema = test_schema();
        let resolver = HierarchyResolver::new(&schema);
        let encoder = SchemaEncoder::new(&schema, &resolver);
        let mut diags = Diagnostics::new();

        let call = schema.node_type_by_name("CALL").unwrap();
        let encoding = encoder.encode_node(call, &mut diags);

        let out: Vec<_> = encoding
            .neighbors
            .iter()
            .filter(|n| n.direction == Direction::Out)
            .collect();
        assert_eq!(out.len(), 2);

        // Multiple destinations: static type is the common root class
        assert_eq!(out[0].accessor_name, "identifierViaAstOut");
        assert_eq!(out[0].neighbor_type, "Expression");
        assert_eq!(out[0].cardinality, Cardinality::List); // no annotation

        assert_eq!(out[1].accessor_name, "literalViaAstOut");
        assert_eq!(out[1].cardinality, Cardinality::ZeroOrOne); // right side of 1:0-1
        assert!(diags.is_empty());
    }

    #[test]
    fn test_inbound_neighbor_accessors() {
        let schema = test_schema();
        let resolver = HierarchyResolver::new(&schema);
        let encoder = SchemaEncoder::new(&schema, &resolver);
        let mut diags = Diagnostics::new();

        let literal = schema.node_type_by_name("LITERAL").unwrap();
        let encoding = encoder.encode_node(literal, &mut diags);

        assert_eq!(encoding.neighbors.len(), 1);
        let inbound = &encoding.neighbors[0];
        assert_eq!(inbound.accessor_name, "callViaAstIn");
        assert_eq!(inbound.direction, Direction::In);
        // Single source: static type is the source's own class
        assert_eq!(inbound.neighbor_type, "Call");
        assert_eq!(inbound.cardinality, Cardinality::One); // left side of 1:0-1
    }

    #[test]
    fn test_offsets_are_one_continuous_pass() {
        let schema = test_schema();
        let resolver = HierarchyResolver::new(&schema);
        let encoder = SchemaEncoder::new(&schema, &resolver);
        let mut diags = Diagnostics::new();

        let call = schema.node_type_by_name("CALL").unwrap();
        let encoding = encoder.encode_node(call, &mut diags);
        let offsets: Vec<usize> = encoding
            .neighbors
            .iter()
            .map(|n| n.adjacency_offset)
            .collect();
        assert_eq!(offsets, vec![0, 1]);

        let identifier = schema.node_type_by_name("IDENTIFIER").unwrap();
        let encoding = encoder.encode_node(identifier, &mut diags);
        // IDENTIFIER has no out edges; its single inbound accessor starts at 0
        assert_eq!(encoding.neighbors.len(), 1);
        assert_eq!(encoding.neighbors[0].adjacency_offset, 0);
    }

    #[test]
    fn test_contained_node_accessor() {
        let schema = test_schema();
        let resolver = HierarchyResolver::new(&schema);
        let encoder = SchemaEncoder::new(&schema, &resolver);
        let mut diags = Diagnostics::new();

        let call = schema.node_type_by_name("CALL").unwrap();
        let encoding = encoder.encode_node(call, &mut diags);

        assert_eq!(encoding.contained_nodes.len(), 1);
        let contained = &encoding.contained_nodes[0];
        assert_eq!(contained.accessor_name, "receiver");
        assert_eq!(contained.node_class, "Identifier");
        assert_eq!(contained.cardinality, Cardinality::ZeroOrOne);
    }
}
