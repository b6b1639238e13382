//! Escaping and object formatting for values interpolated from request
//! bindings or filter fragments. Interpolation without escaping is query
//! injection.

/// Backslash-escape a string for use inside a double-quoted SPARQL
/// literal.
pub fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a request-bound value as a SPARQL object term: plain numbers
/// stay bare, http(s) URIs become IRI refs, everything else is a quoted
/// escaped literal.
pub fn format_object(raw: &str) -> String {
    if is_plain_number(raw) {
        return raw.to_string();
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return format!("<{}>", raw);
    }
    format!("\"{}\"", escape_literal(raw))
}

fn is_plain_number(raw: &str) -> bool {
    !raw.is_empty()
        && !raw.ends_with('.')
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        && raw.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quotes_and_backslashes_escaped() {
        assert_eq!(escape_literal(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_literal("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn injection_attempt_stays_inside_the_literal() {
        let hostile = "\"} . ?s ?p ?o . FILTER(\"";
        let rendered = format_object(hostile);
        // Every interior quote is escaped, so the literal cannot close early.
        assert_eq!(rendered, "\"\\\"} . ?s ?p ?o . FILTER(\\\"\"");
    }

    #[test]
    fn numbers_stay_bare() {
        assert_eq!(format_object("3"), "3");
        assert_eq!(format_object("-2.5"), "-2.5");
    }

    #[test]
    fn almost_numbers_are_quoted() {
        assert_eq!(format_object("3."), "\"3.\"");
        assert_eq!(format_object("inf"), "\"inf\"");
        assert_eq!(format_object("1e5"), "\"1e5\"");
    }

    #[test]
    fn uris_become_iri_refs() {
        assert_eq!(
            format_object("http://x.example.org/area/1"),
            "<http://x.example.org/area/1>"
        );
    }
}
