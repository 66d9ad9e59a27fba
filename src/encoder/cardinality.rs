//! Edge-endpoint cardinality parsing
//!
//! Endpoint declarations may carry an annotation of the form
//! `"<inbound>:<outbound>"`, e.g. `"1:1"`, `"1:0-1"`, `"1:n"`. Each side is
//! read by the traversal direction that matches it: outbound accessors read
//! the right-hand side, inbound accessors the left-hand side.
//!
//! Parsing is lenient against older schema sources: an absent annotation
//! means List on both sides, and an unparseable one degrades to List with an
//! `InvalidCardinality` warning instead of aborting the run.

use tracing::warn;

use crate::diagnostics::Diagnostics;
use crate::model::Cardinality;

/// Parsed per-direction cardinality of an edge endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCardinality {
    /// Left side of the colon
    pub inbound: Cardinality,
    /// Right side of the colon
    pub outbound: Cardinality,
}

impl EdgeCardinality {
    /// Parse an endpoint annotation. `context` names the declaration for
    /// the diagnostic (e.g. `"CALL -AST-> METHOD"`).
    pub fn parse(raw: Option<&str>, context: &str, diags: &mut Diagnostics) -> Self {
        let Some(raw) = raw else {
            return Self {
                inbound: Cardinality::List,
                outbound: Cardinality::List,
            };
        };

        let parsed = raw.split_once(':').and_then(|(left, right)| {
            Some(Self {
                inbound: parse_side(left)?,
                outbound: parse_side(right)?,
            })
        });

        parsed.unwrap_or_else(|| {
            warn!(context, raw, "unrecognized cardinality annotation, defaulting to List");
            diags.invalid_cardinality(context, raw);
            Self {
                inbound: Cardinality::List,
                outbound: Cardinality::List,
            }
        })
    }
}

fn parse_side(side: &str) -> Option<Cardinality> {
    match side.trim() {
        "1" => Some(Cardinality::One),
        "0-1" => Some(Cardinality::ZeroOrOne),
        "n" | "*" => Some(Cardinality::List),
        _ => None,
    }
}
