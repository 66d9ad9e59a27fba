//! Property-Graph Schema Compiler Core
//!
//! Consumes a declarative description of a property-graph domain model
//! (node types, edge types, properties, inheritance, cardinalities,
//! contained-node relations) and resolves it into the strongly-typed units
//! an external renderer turns into source artifacts.
//!
//! ## Features
//!
//! - **Validated Model**: name/proto-id uniqueness, reference resolution,
//!   and extends-DAG acyclicity checked up front, all errors batched
//! - **Hierarchy Resolution**: deterministic common-ancestor computation for
//!   polymorphic edge endpoints, with a documented tie-break policy
//! - **Accessor Encoding**: property, neighbor, and contained-node accessor
//!   derivation with stable adjacency offsets
//! - **Reproducible Output**: identical schemas produce byte-identical unit
//!   streams, checksummed for cheap diffing
//!
//! ## Architecture
//!
//! ```text
//! schema source
//!   └─> Schema (model, built once, immutable)
//!         ├─> HierarchyResolver (extends closures, common roots)
//!         ├─> SchemaEncoder (typed accessors, offsets)
//!         └─> CodegenDriver (fixed-order unit stream)
//!               └─> external renderer (out of scope)
//! ```

pub mod diagnostics;
pub mod driver;
pub mod encoder;
pub mod error;
pub mod hierarchy;
pub mod model;

pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use driver::{CodegenDriver, CodegenUnit, UnitSink};
pub use encoder::{
    Direction, NeighborAccessor, PropertyAccessor, SchemaEncoder, SemanticType,
};
pub use error::{Result, SchemaError};
pub use hierarchy::HierarchyResolver;
pub use model::{
    Cardinality, DefaultValue, Property, Schema, SchemaSource, ValueType, ABSTRACT_NODE,
};

/// Deserialize a schema source from structured JSON and build the validated
/// model in one step.
pub fn load_schema(value: serde_json::Value) -> Result<Schema> {
    let source: SchemaSource = serde_json::from_value(value)?;
    Ok(Schema::build(source)?)
}
