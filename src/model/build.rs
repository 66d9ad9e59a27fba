//! Schema validation and construction
//!
//! Turns a raw [`SchemaSource`] into an immutable [`Schema`]. All structural
//! errors are collected into one [`Diagnostics`] batch before failing, so an
//! evolving schema gets every mistake reported in a single run.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::diagnostics::Diagnostics;

use super::{InEdgeContext, NodeType, Property, Schema, SchemaSource};

impl Schema {
    /// Validate a raw schema source and freeze it into a model.
    ///
    /// Validation checks name uniqueness per namespace, proto-id uniqueness
    /// per category, resolvability of every cross-reference, acyclicity of
    /// the extends relation, and default-value types. On failure the
    /// returned diagnostics contain every structural error found.
    pub fn build(source: SchemaSource) -> Result<Schema, Diagnostics> {
        let mut diags = Diagnostics::new();

        let node_keys_by_name =
            index_by_name(&source.node_keys, |p| &p.name, "node properties", &mut diags);
        let edge_keys_by_name =
            index_by_name(&source.edge_keys, |p| &p.name, "edge properties", &mut diags);
        let edge_types_by_name =
            index_by_name(&source.edge_types, |e| &e.name, "edge types", &mut diags);

        // Node types and base types share one namespace: the extends relation
        // forms a single DAG keyed by name across both.
        let base_types_by_name =
            index_by_name(&source.node_base_types, |b| &b.name, "node types", &mut diags);
        let node_types_by_name = {
            let mut index = HashMap::with_capacity(source.node_types.len());
            for (i, node) in source.node_types.iter().enumerate() {
                if base_types_by_name.contains_key(&node.name)
                    || index.insert(node.name.clone(), i).is_some()
                {
                    diags.duplicate_identifier(
                        &node.name,
                        "node types",
                        format!("type name '{}' declared more than once", node.name),
                    );
                }
            }
            index
        };

        check_proto_ids(
            source.node_types.iter().map(|n| (n.name.as_str(), Some(n.proto_id))),
            "node types",
            &mut diags,
        );
        check_proto_ids(
            source.edge_types.iter().map(|e| (e.name.as_str(), Some(e.proto_id))),
            "edge types",
            &mut diags,
        );
        check_proto_ids(
            source.node_keys.iter().map(|p| (p.name.as_str(), p.proto_id)),
            "node properties",
            &mut diags,
        );
        check_proto_ids(
            source.edge_keys.iter().map(|p| (p.name.as_str(), p.proto_id)),
            "edge properties",
            &mut diags,
        );

        for group in &source.constants {
            let mut seen = HashSet::new();
            for constant in &group.constants {
                if !seen.insert(constant.name.as_str()) {
                    diags.duplicate_identifier(
                        &constant.name,
                        &group.category,
                        format!(
                            "constant '{}' declared more than once in category '{}'",
                            constant.name, group.category
                        ),
                    );
                }
            }
        }

        check_defaults(&source.node_keys, &mut diags);
        check_defaults(&source.edge_keys, &mut diags);

        let schema = Schema {
            in_edge_contexts: invert_out_edges(&source.node_types),
            source,
            node_types_by_name,
            base_types_by_name,
            edge_types_by_name,
            node_keys_by_name,
            edge_keys_by_name,
        };

        schema.check_references(&mut diags);
        schema.check_extends_acyclic(&mut diags);

        if diags.has_errors() {
            return Err(diags);
        }

        debug!(
            node_types = schema.source.node_types.len(),
            base_types = schema.source.node_base_types.len(),
            edge_types = schema.source.edge_types.len(),
            "schema model built"
        );

        Ok(schema)
    }

    /// Resolve every cross-reference: owned property names, extends targets,
    /// out-edge names and endpoint node names, contained-node types.
    fn check_references(&self, diags: &mut Diagnostics) {
        for ty in self.all_abstract_types() {
            for key in ty.has_keys() {
                if self.node_property_by_name(key).is_none() {
                    diags.unresolved_reference(ty.name(), key, "owned node property");
                }
            }
            for target in ty.extends() {
                if self.abstract_node_type(target).is_none() {
                    diags.unresolved_reference(ty.name(), target, "extends");
                }
            }
        }

        for edge in self.edge_types() {
            for key in &edge.has_keys {
                if self.edge_property_by_name(key).is_none() {
                    diags.unresolved_reference(&edge.name, key, "owned edge property");
                }
            }
        }

        for node in self.node_types() {
            for out_edge in &node.out_edges {
                if self.edge_type_by_name(&out_edge.edge_name).is_none() {
                    diags.unresolved_reference(&node.name, &out_edge.edge_name, "out edge");
                }
                for target in &out_edge.inbound_nodes {
                    if !self.resolves_as_node(&target.node_name) {
                        diags.unresolved_reference(
                            &node.name,
                            &target.node_name,
                            "edge endpoint",
                        );
                    }
                }
            }
            for contained in &node.contained_nodes {
                if !self.resolves_as_node(&contained.node_type) {
                    diags.unresolved_reference(
                        &node.name,
                        &contained.node_type,
                        "contained node",
                    );
                }
            }
        }
    }

    /// Reject cycles in the extends relation. The induced graph over node
    /// and base types must be a DAG.
    fn check_extends_acyclic(&self, diags: &mut Diagnostics) {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

        for ty in self.all_abstract_types() {
            let idx = graph.add_node(ty.name().to_string());
            indices.insert(ty.name(), idx);
        }
        for ty in self.all_abstract_types() {
            let from = indices[ty.name()];
            for target in ty.extends() {
                // Unresolved targets are reported separately
                if let Some(&to) = indices.get(target.as_str()) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        for scc in kosaraju_scc(&graph) {
            let is_cycle = scc.len() > 1
                || graph.find_edge(scc[0], scc[0]).is_some();
            if is_cycle {
                let mut members: Vec<String> = scc
                    .iter()
                    .map(|&idx| graph[idx].clone())
                    .collect();
                members.sort();
                diags.cyclic_hierarchy(&members);
            }
        }
    }
}

/// Build a name index over a declaration vector, reporting collisions
fn index_by_name<T>(
    items: &[T],
    name: impl Fn(&T) -> &String,
    namespace: &str,
    diags: &mut Diagnostics,
) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let name = name(item);
        if index.insert(name.clone(), i).is_some() {
            diags.duplicate_identifier(
                name,
                namespace,
                format!("'{}' declared more than once in {}", name, namespace),
            );
        }
    }
    index
}

/// Proto ids are the stable on-disk/wire identifiers consumers depend on
/// across schema versions; collisions within a category are fatal.
fn check_proto_ids<'a>(
    ids: impl Iterator<Item = (&'a str, Option<u32>)>,
    category: &str,
    diags: &mut Diagnostics,
) {
    let mut seen: HashMap<u32, &str> = HashMap::new();
    for (name, proto_id) in ids {
        let Some(proto_id) = proto_id else { continue };
        if let Some(prev) = seen.insert(proto_id, name) {
            diags.duplicate_identifier(
                name,
                category,
                format!(
                    "proto id {} of '{}' collides with '{}' in {}",
                    proto_id, name, prev, category
                ),
            );
        }
    }
}

fn check_defaults(properties: &[Property], diags: &mut Diagnostics) {
    for property in properties {
        if let Some(default) = &property.default {
            if !property.value_type.admits_default(default) {
                diags.type_mismatch_default(
                    &property.name,
                    format!(
                        "default value {:?} does not match declared value type {:?}",
                        default, property.value_type
                    ),
                );
            }
        }
    }
}

/// Invert every outbound-edge declaration into the per-destination inbound
/// view. Scan order is node-type declaration order, which makes the derived
/// context and neighbor ordering deterministic.
fn invert_out_edges(node_types: &[NodeType]) -> HashMap<String, Vec<InEdgeContext>> {
    let mut inverted: HashMap<String, Vec<InEdgeContext>> = HashMap::new();

    for node in node_types {
        for out_edge in &node.out_edges {
            for target in &out_edge.inbound_nodes {
                let contexts = inverted.entry(target.node_name.clone()).or_default();
                let pos = contexts
                    .iter()
                    .position(|c| c.edge_name == out_edge.edge_name);
                let context = match pos {
                    Some(i) => &mut contexts[i],
                    None => {
                        contexts.push(InEdgeContext {
                            edge_name: out_edge.edge_name.clone(),
                            neighbor_nodes: Vec::new(),
                        });
                        contexts.last_mut().unwrap()
                    }
                };
                // A source may list the same destination once per edge
                if !context.neighbor_nodes.iter().any(|n| n.node_name == node.name) {
                    context.neighbor_nodes.push(super::EndpointTarget {
                        node_name: node.name.clone(),
                        cardinality: target.cardinality.clone(),
                    });
                }
            }
        }
    }

    inverted
}
