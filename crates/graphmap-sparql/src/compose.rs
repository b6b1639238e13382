//! Post-hoc composition: merging fragments into an already-formed query
//! and local well-formedness checking. String scanning is quote-aware so
//! braces inside literals never count.

use graphmap_core::{GraphmapError, Result};

/// Insert fragments immediately before the closing delimiter of the
/// query's outermost group pattern (the WHERE block).
pub(crate) fn inject_into_group(query: &str, fragments: &[String]) -> Result<String> {
    if fragments.is_empty() {
        return Ok(query.to_string());
    }
    let mut depth = 0i32;
    let mut scanner = Scanner::default();
    let mut insert_at = None;
    for (i, c) in query.char_indices() {
        if scanner.in_literal(c) {
            continue;
        }
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    insert_at = Some(i);
                }
            }
            _ => {}
        }
    }
    let at = insert_at.ok_or_else(|| {
        GraphmapError::QueryCompilation("no group pattern to merge fragments into".into())
    })?;
    let mut out = String::with_capacity(query.len() + 64 * fragments.len());
    out.push_str(&query[..at]);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    for fragment in fragments {
        out.push_str("  ");
        out.push_str(fragment);
        out.push('\n');
    }
    out.push_str(&query[at..]);
    Ok(out)
}

/// Append solution modifiers after the query body, one per line.
pub(crate) fn append_modifiers(query: &str, modifiers: &[String]) -> String {
    let mut out = query.trim_end().to_string();
    for modifier in modifiers {
        out.push('\n');
        out.push_str(modifier);
    }
    out
}

/// Local well-formedness: balanced braces, parentheses, and quotes, and
/// at least one group pattern. Anything subtler is the store's to reject.
pub fn check(query: &str) -> Result<()> {
    let mut braces = 0i32;
    let mut parens = 0i32;
    let mut scanner = Scanner::default();
    let mut has_group = false;
    for c in query.chars() {
        if scanner.in_literal(c) {
            continue;
        }
        match c {
            '{' => {
                braces += 1;
                has_group = true;
            }
            '}' => {
                braces -= 1;
                if braces < 0 {
                    return Err(GraphmapError::QueryCompilation(
                        "unbalanced '}' in query".into(),
                    ));
                }
            }
            '(' => parens += 1,
            ')' => {
                parens -= 1;
                if parens < 0 {
                    return Err(GraphmapError::QueryCompilation(
                        "unbalanced ')' in query".into(),
                    ));
                }
            }
            _ => {}
        }
    }
    if scanner.open {
        return Err(GraphmapError::QueryCompilation(
            "unterminated string literal in query".into(),
        ));
    }
    if braces != 0 {
        return Err(GraphmapError::QueryCompilation(
            "unbalanced '{' in query".into(),
        ));
    }
    if parens != 0 {
        return Err(GraphmapError::QueryCompilation(
            "unbalanced '(' in query".into(),
        ));
    }
    if !has_group {
        return Err(GraphmapError::QueryCompilation(
            "query has no group pattern".into(),
        ));
    }
    Ok(())
}

/// Tracks double-quoted literal state across a character scan.
#[derive(Default)]
struct Scanner {
    open: bool,
    escaped: bool,
}

impl Scanner {
    // Feed one character; true while the scan position is inside a literal
    // (or at its delimiters), meaning structural characters must not count.
    fn in_literal(&mut self, c: char) -> bool {
        if self.open {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.open = false;
            }
            true
        } else if c == '"' {
            self.open = true;
            true
        } else {
            false
        }
    }
}
