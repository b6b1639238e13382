//! Generated mode: compile a View plus request bindings into a SPARQL
//! SELECT by walking the view depth-first from its root class.
//!
//! Variables are path-qualified field names (`floodArea_county`), so
//! identically-named properties at different nesting levels cannot
//! collide. Optionality is contagious downward: a property below an
//! optional ancestor lives inside that ancestor's OPTIONAL block.

use std::collections::BTreeSet;

use graphmap_core::model::{curie_prefix, is_absolute_uri};
use graphmap_core::{qualify, GraphmapError, ModelSpec, Request, Result, View, IDENTITY_VAR};

use crate::escape::format_object;
use crate::Extras;

pub fn compile(
    model: &ModelSpec,
    view: &View,
    request: &Request,
    extras: &Extras,
) -> Result<String> {
    let mut ctx = Ctx::default();
    if !view.class_uri.is_empty() {
        let class_ref = ctx.term_ref(&view.class_uri);
        ctx.line(1, &format!("?{} a {} .", IDENTITY_VAR, class_ref));
    }
    walk(&mut ctx, view, IDENTITY_VAR, None, request, 1);

    let mut lines: Vec<String> = Vec::new();
    for prefix in &ctx.prefixes {
        let namespace = model.prefixes.get(prefix).ok_or_else(|| {
            GraphmapError::QueryCompilation(format!("prefix '{}' not declared in model", prefix))
        })?;
        lines.push(format!("PREFIX {}: <{}>", prefix, namespace));
    }
    let mut select = format!("SELECT ?{}", IDENTITY_VAR);
    for var in &ctx.select {
        select.push_str(" ?");
        select.push_str(var);
    }
    lines.push(select);
    lines.push("WHERE {".to_string());
    lines.extend(ctx.body);
    for filter in &ctx.filters {
        lines.push(format!("  {}", filter));
    }
    for raw in &extras.filters {
        lines.push(format!("  {}", raw));
    }
    if let Some(geo) = &extras.geo {
        lines.push(format!("  {}", geo.pattern(IDENTITY_VAR)));
    }
    lines.push("}".to_string());
    // The identity ordering is the grouping precondition; callers that
    // supply their own ORDER BY take that obligation on themselves.
    let caller_orders = extras
        .modifiers
        .iter()
        .any(|m| m.to_ascii_uppercase().contains("ORDER BY"));
    if !caller_orders {
        lines.push(format!("ORDER BY ?{}", IDENTITY_VAR));
    }
    lines.extend(extras.modifiers.iter().cloned());
    Ok(lines.join("\n"))
}

#[derive(Default)]
struct Ctx {
    prefixes: BTreeSet<String>,
    select: Vec<String>,
    body: Vec<String>,
    filters: Vec<String>,
}

impl Ctx {
    fn line(&mut self, indent: usize, text: &str) {
        self.body.push(format!("{}{}", "  ".repeat(indent), text));
    }

    // Prefixed names are emitted as-is and their prefix recorded; absolute
    // URIs become IRI refs and need no declaration.
    fn term_ref(&mut self, uri: &str) -> String {
        if is_absolute_uri(uri) {
            format!("<{}>", uri)
        } else {
            if let Some(prefix) = curie_prefix(uri) {
                self.prefixes.insert(prefix.to_string());
            }
            uri.to_string()
        }
    }
}

fn walk(
    ctx: &mut Ctx,
    view: &View,
    subject_var: &str,
    prefix: Option<&str>,
    request: &Request,
    indent: usize,
) {
    for field in &view.fields {
        let var = qualify(prefix, &field.json_name);
        ctx.select.push(var.clone());
        let predicate = ctx.term_ref(&field.uri);
        let triple = format!("?{} {} ?{} .", subject_var, predicate, var);
        if field.optional {
            ctx.line(indent, "OPTIONAL {");
            ctx.line(indent + 1, &triple);
            if let Some(subview) = &field.nested {
                emit_nested(ctx, subview, &var, request, indent + 1);
            }
            ctx.line(indent, "}");
        } else {
            ctx.line(indent, &triple);
            if let Some(subview) = &field.nested {
                emit_nested(ctx, subview, &var, request, indent);
            }
        }
        if field.filterable {
            if let Some(value) = request.first(&var) {
                ctx.filters
                    .push(format!("FILTER(?{} = {})", var, format_object(value)));
            }
        }
    }
}

fn emit_nested(ctx: &mut Ctx, subview: &View, var: &str, request: &Request, indent: usize) {
    if !subview.class_uri.is_empty() {
        let class_ref = ctx.term_ref(&subview.class_uri);
        ctx.line(indent, &format!("?{} a {} .", var, class_ref));
    }
    walk(ctx, subview, var, Some(var), request, indent);
}
