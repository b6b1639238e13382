//! graphmap-sparql — compiles a View plus per-request bindings into an
//! executable SPARQL SELECT.
//!
//! Two strategies share one contract: a fully-generated walk of the view,
//! and an operator-supplied template with `${name}` placeholders. Both
//! accept post-hoc composition (raw filter fragments, solution modifiers,
//! a circular-radius geo constraint) and both pass a local
//! well-formedness check before the string leaves the compiler.

mod compose;
mod escape;
mod generated;
mod geo;
mod template;

use tracing::debug;

use graphmap_core::{ModelSpec, Request, Result, View};

pub use compose::check as check_query;
pub use escape::{escape_literal, format_object};
pub use geo::{GeoCircle, WITHIN_CIRCLE};
pub use template::{is_template, substitute};

/// Post-hoc composition applied to either strategy: opaque filter
/// fragments inside the condition block, modifier fragments after it, an
/// optional geo constraint on the root identity variable.
#[derive(Debug, Clone, Default)]
pub struct Extras {
    pub filters: Vec<String>,
    pub modifiers: Vec<String>,
    pub geo: Option<GeoCircle>,
}

/// The two compilation strategies behind one compile contract.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStrategy {
    /// Walk the view depth-first and emit patterns.
    Generated,
    /// Operator-supplied query text, a template iff it contains a
    /// `${name}` placeholder.
    Template(String),
}

impl QueryStrategy {
    /// Compile to an executable query string. Pure function of its
    /// inputs: identical (view, bindings, extras) compile byte-identically.
    pub fn compile(
        &self,
        model: &ModelSpec,
        view: &View,
        request: &Request,
        extras: &Extras,
    ) -> Result<String> {
        let query = match self {
            QueryStrategy::Generated => generated::compile(model, view, request, extras)?,
            QueryStrategy::Template(text) => template::compile(text, request, extras)?,
        };
        compose::check(&query)?;
        debug!(%query, "compiled query");
        Ok(query)
    }
}
