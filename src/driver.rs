//! Generation Driver
//!
//! Orchestrates the production of one resolved codegen unit per declared
//! entity, in a fixed dependency order: node properties, edge properties,
//! edge types, node base types, node types, node relations, constants.
//! Later units reference earlier ones by name, so the ordering is part of
//! the contract. The driver owns no resolution logic; it pulls everything
//! from the encoder and hands structured units to an external renderer.
//!
//! Given the same model, the unit stream is byte-for-byte identical in its
//! structured form across runs; `fingerprint` exposes a checksum of it so
//! consumers can diff releases cheaply.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::encoder::names::{camel_case, upper_camel_case};
use crate::encoder::{
    ContainedNodeAccessor, NeighborAccessor, PropertyAccessor, SchemaEncoder, SemanticType,
};
use crate::hierarchy::HierarchyResolver;
use crate::model::{Cardinality, DefaultValue, Schema, ValueType};

// =============================================================================
// Codegen Units
// =============================================================================

/// A resolved property declaration unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyUnit {
    pub name: String,
    pub accessor_name: String,
    pub constant_name: String,
    pub semantic_type: SemanticType,
    pub cardinality: Cardinality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proto_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A resolved edge type unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTypeUnit {
    pub name: String,
    pub class_name: String,
    pub proto_id: u32,
    pub properties: Vec<PropertyAccessor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A resolved node type or node base type unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeUnit {
    pub name: String,
    pub class_name: String,
    /// Stable label id; absent for base types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proto_id: Option<u32>,
    /// Directly-extended base types, declared order
    pub extends: Vec<String>,
    /// Transitive ancestor closure, ascending name order
    pub extends_recursively: Vec<String>,
    pub properties: Vec<PropertyAccessor>,
    pub neighbors: Vec<NeighborAccessor>,
    pub contained_nodes: Vec<ContainedNodeAccessor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Outbound-edge wiring of one node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutEdgeWiring {
    pub edge_name: String,
    /// Allowed destination nodes, declared order
    pub destinations: Vec<String>,
}

/// Contained-node wiring of one node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainedWiring {
    pub local_name: String,
    pub node_type: String,
    pub cardinality: Cardinality,
}

/// A resolved node-relations unit: the graph wiring a renderer needs to
/// register edge and containment constraints for one node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationsUnit {
    pub node_name: String,
    pub out_edges: Vec<OutEdgeWiring>,
    pub contained_nodes: Vec<ContainedWiring>,
}

/// A resolved constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantUnit {
    pub name: String,
    pub constant_name: String,
    pub value: String,
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A resolved constant-category unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantGroupUnit {
    pub category: String,
    pub constants: Vec<ConstantUnit>,
}

/// One resolved codegen unit, handed to the external renderer.
///
/// Every declared entity yields exactly one unit, including entities with
/// no properties or edges, which still yield an empty-but-present unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodegenUnit {
    NodeProperty(PropertyUnit),
    EdgeProperty(PropertyUnit),
    EdgeType(EdgeTypeUnit),
    NodeBaseType(NodeTypeUnit),
    NodeType(NodeTypeUnit),
    NodeRelations(RelationsUnit),
    ConstantGroup(ConstantGroupUnit),
}

// =============================================================================
// Unit Sink
// =============================================================================

/// Receiver of resolved units; implemented by the external renderer
pub trait UnitSink {
    fn emit(&mut self, unit: CodegenUnit);
}

impl UnitSink for Vec<CodegenUnit> {
    fn emit(&mut self, unit: CodegenUnit) {
        self.push(unit);
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Drives generation over an immutable schema model
pub struct CodegenDriver<'a> {
    schema: &'a Schema,
    resolver: HierarchyResolver<'a>,
}

impl<'a> CodegenDriver<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            resolver: HierarchyResolver::new(schema),
        }
    }

    pub fn resolver(&self) -> &HierarchyResolver<'a> {
        &self.resolver
    }

    /// Produce every unit, in the fixed dependency order, into the sink
    pub fn generate_into(&self, sink: &mut dyn UnitSink, diags: &mut Diagnostics) {
        let encoder = SchemaEncoder::new(self.schema, &self.resolver);

        for property in self.schema.node_keys() {
            sink.emit(CodegenUnit::NodeProperty(property_unit(property)));
        }
        for property in self.schema.edge_keys() {
            sink.emit(CodegenUnit::EdgeProperty(property_unit(property)));
        }

        for edge in self.schema.edge_types() {
            sink.emit(CodegenUnit::EdgeType(EdgeTypeUnit {
                name: edge.name.clone(),
                class_name: upper_camel_case(&edge.name),
                proto_id: edge.proto_id,
                properties: encoder.edge_property_accessors(edge),
                comment: edge.comment.clone(),
            }));
        }

        for base in self.schema.node_base_types() {
            sink.emit(CodegenUnit::NodeBaseType(NodeTypeUnit {
                name: base.name.clone(),
                class_name: upper_camel_case(&base.name),
                proto_id: None,
                extends: base.extends.clone(),
                extends_recursively: self
                    .resolver
                    .extendz_recursively(&base.name)
                    .iter()
                    .cloned()
                    .collect(),
                properties: encoder.node_property_accessors(&base.has_keys),
                neighbors: Vec::new(),
                contained_nodes: Vec::new(),
                comment: base.comment.clone(),
            }));
        }

        for node in self.schema.node_types() {
            let encoding = encoder.encode_node(node, diags);
            sink.emit(CodegenUnit::NodeType(NodeTypeUnit {
                name: encoding.name,
                class_name: encoding.class_name,
                proto_id: Some(node.proto_id),
                extends: node.extends.clone(),
                extends_recursively: self
                    .resolver
                    .extendz_recursively(&node.name)
                    .iter()
                    .cloned()
                    .collect(),
                properties: encoding.properties,
                neighbors: encoding.neighbors,
                contained_nodes: encoding.contained_nodes,
                comment: node.comment.clone(),
            }));
        }

        for node in self.schema.node_types() {
            sink.emit(CodegenUnit::NodeRelations(RelationsUnit {
                node_name: node.name.clone(),
                out_edges: node
                    .out_edges
                    .iter()
                    .map(|e| OutEdgeWiring {
                        edge_name: e.edge_name.clone(),
                        destinations: e
                            .inbound_nodes
                            .iter()
                            .map(|t| t.node_name.clone())
                            .collect(),
                    })
                    .collect(),
                contained_nodes: node
                    .contained_nodes
                    .iter()
                    .map(|c| ContainedWiring {
                        local_name: c.local_name.clone(),
                        node_type: c.node_type.clone(),
                        cardinality: c.cardinality,
                    })
                    .collect(),
            }));
        }

        for group in self.schema.constant_groups() {
            sink.emit(CodegenUnit::ConstantGroup(ConstantGroupUnit {
                category: group.category.clone(),
                constants: group
                    .constants
                    .iter()
                    .map(|c| ConstantUnit {
                        name: c.name.clone(),
                        constant_name: upper_camel_case(&c.name),
                        value: c.value.clone(),
                        value_type: c.value_type,
                        id: c.id,
                        comment: c.comment.clone(),
                    })
                    .collect(),
            }));
        }
    }

    /// Collect every unit into a vector
    pub fn units(&self, diags: &mut Diagnostics) -> Vec<CodegenUnit> {
        let mut units = Vec::new();
        self.generate_into(&mut units, diags);
        debug!(units = units.len(), "codegen units produced");
        units
    }

    /// Checksum of the serialized unit stream. Identical input schemas
    /// always produce identical fingerprints.
    pub fn fingerprint(&self) -> String {
        let mut diags = Diagnostics::new();
        let mut hasher = Sha256::new();
        for unit in self.units(&mut diags) {
            // Struct field order is fixed, so the serialized form is stable
            let bytes = serde_json::to_vec(&unit).expect("unit serialization cannot fail");
            hasher.update(&bytes);
        }
        format!("{:x}", hasher.finalize())
    }
}

fn property_unit(property: &crate::model::Property) -> PropertyUnit {
    PropertyUnit {
        name: property.name.clone(),
        accessor_name: camel_case(&property.name),
        constant_name: upper_camel_case(&property.name),
        semantic_type: SemanticType::of(property.value_type, property.cardinality),
        cardinality: property.cardinality,
        proto_id: property.proto_id,
        default: property.default.clone(),
        comment: property.comment.clone(),
    }
}
