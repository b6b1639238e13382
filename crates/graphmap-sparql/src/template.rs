//! Explicit-template mode: the operator supplies a literal query with
//! `${name}` placeholders, substituted textually from request bindings.

use once_cell::sync::Lazy;
use regex::Regex;

use graphmap_core::{GraphmapError, Request, Result, IDENTITY_VAR};

use crate::compose;
use crate::escape::escape_literal;
use crate::Extras;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern"));

/// A string is a template iff it contains at least one well-formed
/// `${...}` placeholder; otherwise it is used verbatim.
pub fn is_template(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// Substitute every placeholder from request bindings (first bound value
/// wins), escaping each value. An unresolved placeholder is a
/// `BindingMismatch`.
pub fn substitute(template: &str, request: &Request) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let name = &caps[1];
        let value = request.first(name).ok_or_else(|| {
            GraphmapError::BindingMismatch(format!("unresolved placeholder '${{{}}}'", name))
        })?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(&escape_literal(value));
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Full template compilation: substitute, then merge extras (raw filters
/// and the geo pattern inside the condition block, modifiers after it).
pub fn compile(template: &str, request: &Request, extras: &Extras) -> Result<String> {
    let query = if is_template(template) {
        substitute(template, request)?
    } else {
        template.to_string()
    };
    let mut fragments = extras.filters.clone();
    if let Some(geo) = &extras.geo {
        fragments.push(geo.pattern(IDENTITY_VAR));
    }
    let query = compose::inject_into_group(&query, &fragments)?;
    Ok(compose::append_modifiers(&query, &extras.modifiers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use url::Url;

    fn request(uri: &str) -> Request {
        Request::new(Url::parse(uri).expect("test uri parses"))
    }

    // ── recognition ───────────────────────────────────────────────

    #[test]
    fn placeholder_makes_a_template() {
        assert!(is_template("SELECT ?s WHERE { ?s ?p \"${v}\" }"));
        assert!(!is_template("SELECT ?s WHERE { ?s ?p ?o }"));
        assert!(!is_template("no placeholder: $ { not one }"));
    }

    // ── substitution ──────────────────────────────────────────────

    #[test]
    fn substitutes_bound_values() {
        let r = request("http://api.example.org/alerts?severity=3&area=Kent");
        let out = substitute(
            "SELECT ?s WHERE { ?s ex:sev \"${severity}\" ; ex:area \"${area}\" }",
            &r,
        )
        .unwrap();
        assert_eq!(
            out,
            "SELECT ?s WHERE { ?s ex:sev \"3\" ; ex:area \"Kent\" }"
        );
    }

    #[test]
    fn first_bound_value_wins() {
        let r = request("http://api.example.org/alerts?v=one&v=two");
        let out = substitute("\"${v}\"", &r).unwrap();
        assert_eq!(out, "\"one\"");
    }

    #[test]
    fn unresolved_placeholder_is_binding_mismatch() {
        let r = request("http://api.example.org/alerts");
        let err = substitute("\"${missing}\"", &r).unwrap_err();
        assert!(matches!(err, GraphmapError::BindingMismatch(_)));
        assert!(err.to_string().contains("${missing}"));
    }

    #[test]
    fn substituted_values_are_escaped() {
        let mut r = request("http://api.example.org/alerts");
        r.add("v", "\"} hostile");
        let out = substitute("\"${v}\"", &r).unwrap();
        assert_eq!(out, "\"\\\"} hostile\"");
    }

    // ── full compilation ──────────────────────────────────────────

    #[test]
    fn verbatim_template_survives_untouched() {
        let r = request("http://api.example.org/alerts");
        let query = "SELECT ?s WHERE { ?s ?p ?o . }";
        let out = compile(query, &r, &Extras::default()).unwrap();
        assert_eq!(out, query);
    }

    #[test]
    fn extras_compose_around_the_group() {
        let r = request("http://api.example.org/alerts");
        let extras = Extras {
            filters: vec!["FILTER(?o > 2)".to_string()],
            modifiers: vec!["LIMIT 10".to_string()],
            geo: None,
        };
        let out = compile("SELECT ?s\nWHERE {\n  ?s ?p ?o .\n}", &r, &extras).unwrap();
        assert_eq!(
            out,
            "SELECT ?s\nWHERE {\n  ?s ?p ?o .\n  FILTER(?o > 2)\n}\nLIMIT 10"
        );
    }
}
