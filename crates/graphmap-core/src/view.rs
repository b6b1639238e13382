//! View compiler — a ModelSpec pruned by a Projection.
//!
//! A View mirrors the ClassSpec/PropertySpec shape but holds only the
//! selected subset, with sub-views by value. Recursion is finite because
//! nesting depth is bounded by the projection (default depth 1: object
//! properties appear as identity-only leaves).

use crate::error::{GraphmapError, Result};
use crate::model::{ClassId, ModelSpec, PropertySpec};
use crate::projection::{Projection, Segment};

/// The shape actually queried and emitted for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub class_uri: String,
    pub json_name: String,
    pub fields: Vec<ViewField>,
}

/// One selected property, flags carried from the source property.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewField {
    pub uri: String,
    pub json_name: String,
    pub optional: bool,
    pub multivalued: bool,
    pub filterable: bool,
    pub set_like: bool,
    pub hidden: bool,
    pub nested: Option<View>,
}

impl ViewField {
    fn leaf(prop: &PropertySpec) -> ViewField {
        ViewField {
            uri: prop.uri.clone(),
            json_name: prop.json_name.clone(),
            optional: prop.optional,
            multivalued: prop.multivalued,
            filterable: prop.filterable,
            set_like: prop.set_like,
            hidden: prop.hidden,
            nested: None,
        }
    }
}

/// Variable name for a field reached through `prefix` — path-qualified so
/// identically-named properties at different nesting levels cannot collide
/// (`floodArea_county` for `county` under `floodArea`).
pub fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) => format!("{}_{}", p, name),
        None => name.to_string(),
    }
}

impl View {
    /// Compile a view of `root`, pruned by `projection`. No projection
    /// means the identity view: every non-hidden property, depth 1.
    pub fn compile(
        model: &ModelSpec,
        root: ClassId,
        projection: Option<&Projection>,
    ) -> Result<View> {
        match projection {
            None => identity_view(model, root),
            Some(p) => projected_view(model, root, &p.segments),
        }
    }
}

fn identity_view(model: &ModelSpec, id: ClassId) -> Result<View> {
    let class = model.class(id)?;
    let fields = class
        .properties
        .iter()
        .filter(|p| !p.hidden)
        .map(ViewField::leaf)
        .collect();
    Ok(View {
        class_uri: class.type_uri.clone(),
        json_name: class.json_name.clone(),
        fields,
    })
}

fn projected_view(model: &ModelSpec, id: ClassId, segments: &[Segment]) -> Result<View> {
    let class = model.class(id)?;
    let mut fields: Vec<ViewField> = Vec::new();
    for seg in segments {
        if seg.is_wildcard() {
            // Expand all direct non-hidden children, non-recursively.
            for prop in class.properties.iter().filter(|p| !p.hidden) {
                push_field(&mut fields, ViewField::leaf(prop));
            }
            continue;
        }
        let prop = class.property(&seg.name).ok_or_else(|| {
            GraphmapError::BindingMismatch(format!(
                "no field '{}' in class '{}'",
                seg.name, class.json_name
            ))
        })?;
        if seg.children.is_empty() {
            push_field(&mut fields, ViewField::leaf(prop));
            continue;
        }
        let nested_id = prop.nested.ok_or_else(|| {
            GraphmapError::BindingMismatch(format!(
                "field '{}' in class '{}' has no nested fields",
                seg.name, class.json_name
            ))
        })?;
        let mut field = ViewField::leaf(prop);
        field.nested = Some(projected_view(model, nested_id, &seg.children)?);
        push_field(&mut fields, field);
    }
    Ok(View {
        class_uri: class.type_uri.clone(),
        json_name: class.json_name.clone(),
        fields,
    })
}

// Wildcard and explicit mentions can both name a field; the expanded
// (nested) mention wins over a leaf mention.
fn push_field(fields: &mut Vec<ViewField>, field: ViewField) {
    match fields.iter_mut().find(|f| f.json_name == field.json_name) {
        Some(existing) => {
            if field.nested.is_some() {
                *existing = field;
            }
        }
        None => fields.push(field),
    }
}
