//! Diagnostics
//!
//! Collects warnings and errors during schema validation and encoding.
//! Structural errors are accumulated (not fail-fast) so a whole batch of
//! schema mistakes is reported in one run.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Name or protoId collision within a namespace
    DuplicateIdentifier,
    /// Edge endpoint, extends-target, or contained-node type not found
    UnresolvedReference,
    /// The extends relation contains a cycle
    CyclicHierarchy,
    /// Unparseable edge-endpoint cardinality annotation (recovered as List)
    InvalidCardinality,
    /// A declared default value does not match its property's value type
    TypeMismatchDefault,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateIdentifier => "E001",
            Self::UnresolvedReference => "E002",
            Self::CyclicHierarchy => "E003",
            Self::TypeMismatchDefault => "E004",
            Self::InvalidCardinality => "W001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateIdentifier
            | Self::UnresolvedReference
            | Self::CyclicHierarchy
            | Self::TypeMismatchDefault => Severity::Error,

            Self::InvalidCardinality => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Declared entity that caused this diagnostic (node, edge, property, ...)
    pub entity: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Additional context (e.g., colliding declarations, cycle members)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(entity: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.entity
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from validation and encoding passes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Add a name/protoId collision
    pub fn duplicate_identifier(
        &mut self,
        entity: impl Into<String>,
        namespace: &str,
        detail: impl Into<String>,
    ) {
        self.push(
            DiagnosticItem::new(entity, DiagnosticCode::DuplicateIdentifier, detail)
                .with_context(format!("namespace: {}", namespace)),
        );
    }

    /// Add an unresolved cross-reference
    pub fn unresolved_reference(
        &mut self,
        entity: impl Into<String>,
        target: &str,
        kind: &str,
    ) {
        self.push(DiagnosticItem::new(
            entity,
            DiagnosticCode::UnresolvedReference,
            format!("{} target '{}' is not a declared type", kind, target),
        ));
    }

    /// Add an extends-cycle report
    pub fn cyclic_hierarchy(&mut self, members: &[String]) {
        let entity = members.first().cloned().unwrap_or_default();
        self.push(
            DiagnosticItem::new(
                entity,
                DiagnosticCode::CyclicHierarchy,
                "extends relation contains a cycle",
            )
            .with_context(format!("cycle members: {}", members.join(" -> "))),
        );
    }

    /// Add a default-value type mismatch
    pub fn type_mismatch_default(
        &mut self,
        property: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(DiagnosticItem::new(
            property,
            DiagnosticCode::TypeMismatchDefault,
            detail,
        ));
    }

    /// Add an unparseable-cardinality warning
    pub fn invalid_cardinality(&mut self, entity: impl Into<String>, raw: &str) {
        self.push(DiagnosticItem::new(
            entity,
            DiagnosticCode::InvalidCardinality,
            format!("unrecognized cardinality annotation '{}', defaulting to List", raw),
        ));
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    /// Get total count
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count errors
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Count warnings
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }

        if self.has_errors() {
            writeln!(
                f,
                "\n{} error(s), {} warning(s)",
                self.error_count(),
                self.warning_count()
            )?;
        } else if !self.is_empty() {
            writeln!(f, "\n{} warning(s)", self.warning_count())?;
        }

        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
