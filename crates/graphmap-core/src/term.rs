//! RDF terms and binding rows — the typed values the store hands back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_INT: &str = "http://www.w3.org/2001/XMLSchema#int";
pub const XSD_LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// One typed graph value: a URI, a literal with optional datatype and
/// language tag, or a blank-node surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Uri(String),
    Literal {
        lexical: String,
        #[serde(default)]
        datatype: Option<String>,
        #[serde(default)]
        lang: Option<String>,
    },
    Blank(String),
}

impl Term {
    pub fn uri(value: impl Into<String>) -> Self {
        Term::Uri(value.into())
    }

    pub fn literal(lexical: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            lang: None,
        }
    }

    pub fn lang_literal(lexical: impl Into<String>, lang: impl Into<String>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: None,
            lang: Some(lang.into()),
        }
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::Blank(id.into())
    }

    /// Lexical form: the URI, the literal text, or the blank-node id.
    pub fn lexical_form(&self) -> &str {
        match self {
            Term::Uri(u) => u,
            Term::Literal { lexical, .. } => lexical,
            Term::Blank(id) => id,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Term::Uri(_) | Term::Blank(_))
    }
}

/// One result record from query execution: variable name → term.
///
/// Variables a row does not bind are simply absent (OPTIONAL blocks leave
/// their variables unbound).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BindingRow {
    bindings: BTreeMap<String, Term>,
}

impl BindingRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style bind; later binds of the same variable overwrite.
    pub fn bind(mut self, var: impl Into<String>, term: Term) -> Self {
        self.bindings.insert(var.into(), term);
        self
    }

    pub fn get(&self, var: &str) -> Option<&Term> {
        self.bindings.get(var)
    }

    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
