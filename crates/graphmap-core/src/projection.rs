//! Projection path-expression parser.
//!
//! Grammar: `path := segment (',' segment)*`;
//! `segment := name ('.' segment | '(' path ')')*`; `name := ident | '*'`.
//!
//! A dot steps into exactly one nested field; parentheses branch into
//! multiple children of the same parent. Repeated mentions of the same
//! parent merge into one node with a unioned child set, and children are
//! sorted during canonicalization, so two syntactically different but
//! semantically equal inputs parse to structurally equal trees and render
//! identically.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    error::{ParseError as NomParseError, VerboseError},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded},
    IResult,
};

use crate::error::{GraphmapError, Result};

pub const WILDCARD: &str = "*";

/// One node of the projection tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub children: Vec<Segment>,
}

impl Segment {
    fn new(name: String) -> Self {
        Segment {
            name,
            children: Vec::new(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    fn merge_child(&mut self, child: Segment) {
        merge_into(&mut self.children, child);
    }

    fn canonicalize(&mut self) -> Result<()> {
        if self.is_wildcard() && !self.children.is_empty() {
            return Err(GraphmapError::ProjectionSyntax(
                "wildcard segment cannot have children".into(),
            ));
        }
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
        for child in &mut self.children {
            child.canonicalize()?;
        }
        Ok(())
    }
}

fn merge_into(nodes: &mut Vec<Segment>, seg: Segment) {
    if let Some(existing) = nodes.iter_mut().find(|n| n.name == seg.name) {
        for child in seg.children {
            existing.merge_child(child);
        }
    } else {
        nodes.push(seg);
    }
}

/// A parsed, canonicalized path expression. Pure function of its input
/// string, safely cacheable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub segments: Vec<Segment>,
}

impl Projection {
    /// Parse and canonicalize a path expression.
    pub fn parse(input: &str) -> Result<Projection> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(GraphmapError::ProjectionSyntax(
                "empty path expression".into(),
            ));
        }
        let segments = match all_consuming(path::<VerboseError<&str>>)(trimmed) {
            Ok((_, segments)) => segments,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(GraphmapError::ProjectionSyntax(nom::error::convert_error(
                    trimmed, e,
                )))
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(GraphmapError::ProjectionSyntax(
                    "incomplete path expression".into(),
                ))
            }
        };
        let mut merged: Vec<Segment> = Vec::new();
        for seg in segments {
            merge_into(&mut merged, seg);
        }
        let mut projection = Projection { segments: merged };
        for seg in &mut projection.segments {
            seg.canonicalize()?;
        }
        projection.segments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projection)
    }
}

/// Canonical rendering: one name per line, children indented two spaces,
/// a trailing `.` marking non-leaf names.
impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            render(f, seg, 0)?;
        }
        Ok(())
    }
}

fn render(f: &mut fmt::Formatter<'_>, seg: &Segment, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "  ")?;
    }
    if seg.children.is_empty() {
        writeln!(f, "{}", seg.name)?;
    } else {
        writeln!(f, "{}.", seg.name)?;
    }
    for child in &seg.children {
        render(f, child, depth + 1)?;
    }
    Ok(())
}

// ── nom grammar ───────────────────────────────────────────────────

enum Continuation {
    Dot(Segment),
    Branch(Vec<Segment>),
}

fn ident<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn name<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    alt((
        map(char('*'), |_| WILDCARD.to_string()),
        map(ident, |s: &str| s.to_string()),
    ))(input)
}

fn continuation<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Continuation, E> {
    alt((
        map(preceded(char('.'), segment), Continuation::Dot),
        map(
            delimited(char('('), path, char(')')),
            Continuation::Branch,
        ),
    ))(input)
}

fn segment<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Segment, E> {
    let (input, seg_name) = name(input)?;
    let (input, continuations) = many0(continuation)(input)?;
    let mut seg = Segment::new(seg_name);
    for cont in continuations {
        match cont {
            Continuation::Dot(child) => seg.merge_child(child),
            Continuation::Branch(children) => {
                for child in children {
                    seg.merge_child(child);
                }
            }
        }
    }
    Ok((input, seg))
}

fn path<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Vec<Segment>, E> {
    separated_list1(char(','), delimited(multispace0, segment, multispace0))(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── canonicalization ──────────────────────────────────────────

    #[test]
    fn dot_chain_and_nested_parens_are_structurally_equal() {
        let a = Projection::parse("p.q.r").unwrap();
        let b = Projection::parse("p(q(r))").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_parent_mentions_merge() {
        let p = Projection::parse("p.r,p(s,t.z),f.g").unwrap();
        assert_eq!(
            p.to_string(),
            "f.\n  g\np.\n  r\n  s\n  t.\n    z\n"
        );
    }

    #[test]
    fn rendering_is_grouping_independent() {
        let a = Projection::parse("p(s,t.z),p.r").unwrap();
        let b = Projection::parse("p.r,p.s,p.t.z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn leaf_names_render_without_trailing_dot() {
        let p = Projection::parse("severity").unwrap();
        assert_eq!(p.to_string(), "severity\n");
    }

    #[test]
    fn wildcard_parses_as_leaf() {
        let p = Projection::parse("*").unwrap();
        assert!(p.segments[0].is_wildcard());
    }

    #[test]
    fn wildcard_beside_named_segments() {
        let p = Projection::parse("floodArea(*),severity").unwrap();
        assert_eq!(p.segments.len(), 2);
        assert!(p.segments[0].children[0].is_wildcard());
    }

    // ── syntax errors ─────────────────────────────────────────────

    #[test]
    fn unbalanced_parens_rejected() {
        let err = Projection::parse("p(q").unwrap_err();
        assert!(matches!(err, GraphmapError::ProjectionSyntax(_)));
    }

    #[test]
    fn empty_segment_rejected() {
        assert!(Projection::parse("p..q").is_err());
        assert!(Projection::parse("p,,q").is_err());
        assert!(Projection::parse("").is_err());
    }

    #[test]
    fn trailing_separators_rejected() {
        assert!(Projection::parse("p,").is_err());
        assert!(Projection::parse("p.").is_err());
    }

    #[test]
    fn wildcard_with_children_rejected() {
        let err = Projection::parse("*(x)").unwrap_err();
        assert!(err.to_string().contains("wildcard"));
    }
}
