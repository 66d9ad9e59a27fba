//! End-to-end tests over the unit stream
//!
//! Builds schemas from structured JSON fixtures and checks the resolved
//! units the driver hands to a renderer, including the determinism
//! guarantees generated-source diffing depends on.

use propgraph_codegen::{
    load_schema, Cardinality, CodegenDriver, CodegenUnit, DiagnosticCode, Diagnostics,
    Direction, HierarchyResolver, SchemaError, ABSTRACT_NODE,
};
use serde_json::json;

fn fixture() -> serde_json::Value {
    json!({
        "node_keys": [
            { "name": "NAME", "value_type": "string", "cardinality": "one", "proto_id": 5 },
            { "name": "ORDER", "value_type": "int", "cardinality": "one", "proto_id": 6,
              "default": 0 },
            { "name": "ARGUMENT_INDEXES", "value_type": "int", "cardinality": "list",
              "proto_id": 7 }
        ],
        "edge_keys": [
            { "name": "VARIABLE", "value_type": "string", "cardinality": "zero_or_one",
              "proto_id": 11 }
        ],
        "node_base_types": [
            { "name": "EXPRESSION", "has_keys": ["ORDER"] }
        ],
        "node_types": [
            {
                "name": "CALL",
                "proto_id": 15,
                "has_keys": ["NAME", "ARGUMENT_INDEXES"],
                "extends": ["EXPRESSION"],
                "out_edges": [
                    {
                        "edge_name": "AST",
                        "inbound_nodes": [
                            { "node_name": "IDENTIFIER" },
                            { "node_name": "LITERAL" }
                        ]
                    },
                    {
                        "edge_name": "REF",
                        "inbound_nodes": [
                            { "node_name": "METHOD", "cardinality": "1:0-1" }
                        ]
                    }
                ],
                "contained_nodes": [
                    { "node_type": "IDENTIFIER", "local_name": "RECEIVER",
                      "cardinality": "zero_or_one" },
                    { "node_type": "ABSTRACT_NODE", "local_name": "ARGUMENT",
                      "cardinality": "list" }
                ]
            },
            { "name": "IDENTIFIER", "proto_id": 27, "has_keys": ["NAME"],
              "extends": ["EXPRESSION"] },
            { "name": "LITERAL", "proto_id": 8, "extends": ["EXPRESSION"] },
            { "name": "METHOD", "proto_id": 1, "has_keys": ["NAME"] }
        ],
        "edge_types": [
            { "name": "AST", "proto_id": 3 },
            { "name": "REF", "proto_id": 10, "has_keys": ["VARIABLE"] }
        ],
        "constants": [
            {
                "category": "dispatch_types",
                "constants": [
                    { "name": "STATIC_DISPATCH", "value": "STATIC_DISPATCH",
                      "value_type": "string", "id": 1 },
                    { "name": "DYNAMIC_DISPATCH", "value": "DYNAMIC_DISPATCH",
                      "value_type": "string", "id": 2 }
                ]
            }
        ]
    })
}

fn node_unit<'a>(
    units: &'a [CodegenUnit],
    name: &str,
) -> &'a propgraph_codegen::driver::NodeTypeUnit {
    units
        .iter()
        .find_map(|u| match u {
            CodegenUnit::NodeType(n) if n.name == name => Some(n),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no node type unit for {}", name))
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_unit_stream_is_byte_identical_across_runs() {
    let schema_a = load_schema(fixture()).unwrap();
    let schema_b = load_schema(fixture()).unwrap();

    let mut diags = Diagnostics::new();
    let units_a = CodegenDriver::new(&schema_a).units(&mut diags);
    let units_b = CodegenDriver::new(&schema_b).units(&mut diags);

    assert_eq!(
        serde_json::to_string(&units_a).unwrap(),
        serde_json::to_string(&units_b).unwrap()
    );
    assert_eq!(
        CodegenDriver::new(&schema_a).fingerprint(),
        CodegenDriver::new(&schema_b).fingerprint()
    );
}

#[test]
fn test_results_identical_regardless_of_query_order() {
    let schema = load_schema(fixture()).unwrap();
    let resolver = HierarchyResolver::new(&schema);
    let encoder = propgraph_codegen::SchemaEncoder::new(&schema, &resolver);

    let names: Vec<&str> = schema.node_types().iter().map(|n| n.name.as_str()).collect();
    let mut shuffled = names.clone();
    shuffled.reverse();
    shuffled.rotate_left(1);

    for name in &names {
        let node = schema.node_type_by_name(name).unwrap();
        let mut d1 = Diagnostics::new();
        let mut d2 = Diagnostics::new();
        let first = encoder.encode_node(node, &mut d1);
        // Encode everything else in a different order in between
        for other in &shuffled {
            let other_node = schema.node_type_by_name(other).unwrap();
            encoder.encode_node(other_node, &mut Diagnostics::new());
        }
        let second = encoder.encode_node(node, &mut d2);
        assert_eq!(first, second);
    }
}

#[test]
fn test_fixed_generation_order() {
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let ranks: Vec<u8> = units
        .iter()
        .map(|u| match u {
            CodegenUnit::NodeProperty(_) => 0,
            CodegenUnit::EdgeProperty(_) => 1,
            CodegenUnit::EdgeType(_) => 2,
            CodegenUnit::NodeBaseType(_) => 3,
            CodegenUnit::NodeType(_) => 4,
            CodegenUnit::NodeRelations(_) => 5,
            CodegenUnit::ConstantGroup(_) => 6,
        })
        .collect();
    let mut sorted = ranks.clone();
    sorted.sort();
    assert_eq!(ranks, sorted, "units must come out in dependency order");

    // Completeness: one unit per declared entity plus one relations unit
    // per node type.
    assert_eq!(units.len(), 3 + 1 + 2 + 1 + 4 + 4 + 1);
}

// =============================================================================
// Hierarchy Scenarios
// =============================================================================

#[test]
fn test_polymorphic_endpoint_gets_common_base_and_list_cardinality() {
    // CALL -AST-> {IDENTIFIER, LITERAL}, both extending EXPRESSION, with no
    // cardinality suffix.
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let call = node_unit(&units, "CALL");
    let ast_out: Vec<_> = call
        .neighbors
        .iter()
        .filter(|n| n.edge_name == "AST" && n.direction == Direction::Out)
        .collect();
    assert_eq!(ast_out.len(), 2);
    for accessor in &ast_out {
        assert_eq!(accessor.neighbor_type, "Expression");
        assert_eq!(accessor.cardinality, Cardinality::List);
    }
}

#[test]
fn test_disjoint_endpoint_set_falls_back_to_universal_root() {
    // METHOD extends nothing; IDENTIFIER extends EXPRESSION. No shared base.
    let schema = load_schema(fixture()).unwrap();
    let resolver = HierarchyResolver::new(&schema);

    assert_eq!(resolver.common_root(&["METHOD", "IDENTIFIER"]), None);
    assert_eq!(
        resolver.common_root_or_abstract(&["METHOD", "IDENTIFIER"]),
        ABSTRACT_NODE
    );
}

#[test]
fn test_singleton_endpoint_keeps_its_own_type() {
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let call = node_unit(&units, "CALL");
    let ref_out = call
        .neighbors
        .iter()
        .find(|n| n.edge_name == "REF")
        .unwrap();
    assert_eq!(ref_out.neighbor_type, "Method");
    assert_eq!(ref_out.accessor_name, "methodViaRefOut");
    // Right side of "1:0-1"
    assert_eq!(ref_out.cardinality, Cardinality::ZeroOrOne);
}

#[test]
fn test_inbound_accessor_reads_left_cardinality_side() {
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let method = node_unit(&units, "METHOD");
    let ref_in = method
        .neighbors
        .iter()
        .find(|n| n.edge_name == "REF" && n.direction == Direction::In)
        .unwrap();
    assert_eq!(ref_in.accessor_name, "callViaRefIn");
    // Left side of "1:0-1"
    assert_eq!(ref_in.cardinality, Cardinality::One);
}

// =============================================================================
// Accessor Encoding
// =============================================================================

#[test]
fn test_adjacency_offsets_outbound_then_inbound() {
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let call = node_unit(&units, "CALL");
    let offsets: Vec<usize> = call.neighbors.iter().map(|n| n.adjacency_offset).collect();
    assert_eq!(offsets, (0..call.neighbors.len()).collect::<Vec<_>>());

    // Outbound block strictly precedes the inbound block
    let first_in = call
        .neighbors
        .iter()
        .position(|n| n.direction == Direction::In);
    if let Some(first_in) = first_in {
        assert!(call.neighbors[..first_in]
            .iter()
            .all(|n| n.direction == Direction::Out));
    }
}

#[test]
fn test_list_property_is_ordered_sequence() {
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let call = node_unit(&units, "CALL");
    let indexes = call
        .properties
        .iter()
        .find(|p| p.property_name == "ARGUMENT_INDEXES")
        .unwrap();
    assert_eq!(indexes.accessor_name, "argumentIndexes");
    assert!(matches!(
        indexes.semantic_type,
        propgraph_codegen::SemanticType::Sequence(_)
    ));
}

#[test]
fn test_contained_nodes_and_any_node_sentinel() {
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let call = node_unit(&units, "CALL");
    assert_eq!(call.contained_nodes.len(), 2);
    assert_eq!(call.contained_nodes[0].accessor_name, "receiver");
    assert_eq!(call.contained_nodes[0].node_class, "Identifier");
    assert_eq!(call.contained_nodes[1].accessor_name, "argument");
    assert_eq!(call.contained_nodes[1].node_class, "AbstractNode");
    assert_eq!(call.contained_nodes[1].cardinality, Cardinality::List);
}

#[test]
fn test_base_type_units_carry_inherited_keys() {
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let expression = units
        .iter()
        .find_map(|u| match u {
            CodegenUnit::NodeBaseType(b) if b.name == "EXPRESSION" => Some(b),
            _ => None,
        })
        .unwrap();
    assert_eq!(expression.class_name, "Expression");
    assert!(expression.proto_id.is_none());
    assert_eq!(expression.properties.len(), 1);
    assert_eq!(expression.properties[0].accessor_name, "order");

    let call = node_unit(&units, "CALL");
    assert_eq!(call.extends_recursively, vec!["EXPRESSION".to_string()]);
}

#[test]
fn test_constants_unit() {
    let schema = load_schema(fixture()).unwrap();
    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    let group = units
        .iter()
        .find_map(|u| match u {
            CodegenUnit::ConstantGroup(g) => Some(g),
            _ => None,
        })
        .unwrap();
    assert_eq!(group.category, "dispatch_types");
    assert_eq!(group.constants.len(), 2);
    assert_eq!(group.constants[0].constant_name, "StaticDispatch");
    assert_eq!(group.constants[0].id, Some(1));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_duplicate_proto_id_fails_before_any_unit() {
    let mut value = fixture();
    value["node_types"][1]["proto_id"] = json!(15); // collides with CALL
    let err = load_schema(value).unwrap_err();

    match err {
        SchemaError::Validation(diags) => {
            assert!(diags
                .errors()
                .any(|e| e.code == DiagnosticCode::DuplicateIdentifier));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_unresolved_endpoint_fails() {
    let mut value = fixture();
    value["node_types"][0]["out_edges"][0]["inbound_nodes"][0]["node_name"] =
        json!("NO_SUCH_NODE");
    let err = load_schema(value).unwrap_err();
    match err {
        SchemaError::Validation(diags) => {
            assert!(diags
                .errors()
                .any(|e| e.code == DiagnosticCode::UnresolvedReference));
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_unparseable_cardinality_warns_but_generates() {
    let mut value = fixture();
    value["node_types"][0]["out_edges"][1]["inbound_nodes"][0]["cardinality"] =
        json!("2:many");
    let schema = load_schema(value).unwrap();

    let mut diags = Diagnostics::new();
    let units = CodegenDriver::new(&schema).units(&mut diags);

    assert!(!diags.has_errors());
    assert_eq!(diags.warning_count(), 2); // outbound and inbound accessor
    let call = node_unit(&units, "CALL");
    let ref_out = call.neighbors.iter().find(|n| n.edge_name == "REF").unwrap();
    assert_eq!(ref_out.cardinality, Cardinality::List);
}

#[test]
fn test_malformed_source_is_json_error() {
    let err = load_schema(json!({ "node_types": [{ "name": 42 }] })).unwrap_err();
    assert!(matches!(err, SchemaError::Json(_)));
}
