//! Tree materializer — expands a flat per-entity ValueSet into the nested
//! TreeResult the view describes.
//!
//! Object-valued fields are assembled from sibling path-qualified columns
//! of the same wide row group; the compiled query projects every variable
//! the view names, so a missing column only arises with hand-written
//! templates and materializes as an absent field.

use tracing::warn;

use crate::error::{GraphmapError, Result};
use crate::group::ValueSet;
use crate::model::ExtraValuePolicy;
use crate::term::{BindingRow, Term};
use crate::view::{qualify, View, ViewField};

/// One materialized value: a scalar term or a nested entity tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeValue {
    Scalar(Term),
    Nested(TreeResult),
}

/// Per-entity nested result: identity plus ordered field → values, field
/// order following the view.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeResult {
    pub identity: Term,
    pub fields: Vec<(String, Vec<TreeValue>)>,
}

impl TreeResult {
    pub fn values(&self, field: &str) -> &[TreeValue] {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }
}

/// Materialize one grouped entity against its view.
pub fn materialize(set: &ValueSet, view: &View, policy: ExtraValuePolicy) -> Result<TreeResult> {
    let rows: Vec<&BindingRow> = set.rows().iter().collect();
    build(set.identity.clone(), &rows, view, None, policy)
}

fn build(
    identity: Term,
    rows: &[&BindingRow],
    view: &View,
    prefix: Option<&str>,
    policy: ExtraValuePolicy,
) -> Result<TreeResult> {
    let mut fields = Vec::with_capacity(view.fields.len());
    for field in &view.fields {
        let var = qualify(prefix, &field.json_name);
        let values = match &field.nested {
            Some(subview) => nested_values(rows, field, subview, &var, policy)?,
            None => scalar_values(rows, field, &var, policy)?,
        };
        fields.push((field.json_name.clone(), values));
    }
    Ok(TreeResult { identity, fields })
}

fn scalar_values(
    rows: &[&BindingRow],
    field: &ViewField,
    var: &str,
    policy: ExtraValuePolicy,
) -> Result<Vec<TreeValue>> {
    // All values seen across the grouped rows, in row order.
    let mut values: Vec<Term> = rows.iter().filter_map(|r| r.get(var)).cloned().collect();
    if field.set_like || !field.multivalued {
        values = distinct_in_order(values);
    }
    if !field.multivalued && values.len() > 1 {
        values = resolve_extra(values, var, policy)?;
    }
    Ok(values.into_iter().map(TreeValue::Scalar).collect())
}

fn nested_values(
    rows: &[&BindingRow],
    field: &ViewField,
    subview: &View,
    var: &str,
    policy: ExtraValuePolicy,
) -> Result<Vec<TreeValue>> {
    // Distinct nested identities in first-seen row order; identity
    // repetition across wide rows is structural, never data.
    let identities = distinct_in_order(rows.iter().filter_map(|r| r.get(var)).cloned().collect());
    let identities = if !field.multivalued && identities.len() > 1 {
        resolve_extra(identities, var, policy)?
    } else {
        identities
    };
    let mut values = Vec::with_capacity(identities.len());
    for ident in identities {
        let subrows: Vec<&BindingRow> = rows
            .iter()
            .filter(|r| r.get(var) == Some(&ident))
            .copied()
            .collect();
        values.push(TreeValue::Nested(build(
            ident,
            &subrows,
            subview,
            Some(var),
            policy,
        )?));
    }
    Ok(values)
}

fn distinct_in_order(values: Vec<Term>) -> Vec<Term> {
    let mut out: Vec<Term> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

fn resolve_extra(values: Vec<Term>, var: &str, policy: ExtraValuePolicy) -> Result<Vec<Term>> {
    match policy {
        ExtraValuePolicy::FirstWins => {
            warn!(
                var,
                discarded = values.len() - 1,
                "single-valued field bound multiple distinct values"
            );
            Ok(values.into_iter().take(1).collect())
        }
        ExtraValuePolicy::LastWins => {
            let last = values.len() - 1;
            Ok(values.into_iter().skip(last).collect())
        }
        ExtraValuePolicy::Error => Err(GraphmapError::Configuration(format!(
            "single-valued field '{}' bound {} distinct values",
            var,
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupedRows;
    use crate::model::{ClassId, ModelSpec};
    use crate::projection::Projection;
    use pretty_assertions::assert_eq;

    fn flood_model() -> ModelSpec {
        serde_yaml::from_str(
            r#"
prefixes:
  rt: "http://environment.example.org/def/core/"
classes:
  - type_uri: "rt:FloodAlertOrWarning"
    json_name: floodAlert
    properties:
      - uri: "rt:severity"
        json_name: severity
      - uri: "rt:message"
        json_name: message
        optional: true
        multivalued: true
      - uri: "rt:tag"
        json_name: tag
        optional: true
        multivalued: true
        set_like: true
      - uri: "rt:floodArea"
        json_name: floodArea
        multivalued: true
        nested: 1
  - type_uri: "rt:FloodArea"
    json_name: floodArea
    properties:
      - uri: "rt:county"
        json_name: county
"#,
        )
        .expect("fixture model parses")
    }

    fn group(rows: Vec<BindingRow>) -> ValueSet {
        GroupedRows::new(rows.into_iter(), "item")
            .next()
            .expect("one group")
    }

    fn scalars(tree: &TreeResult, field: &str) -> Vec<String> {
        tree.values(field)
            .iter()
            .map(|v| match v {
                TreeValue::Scalar(t) => t.lexical_form().to_string(),
                TreeValue::Nested(_) => panic!("expected scalar"),
            })
            .collect()
    }

    // ── scalar fields ─────────────────────────────────────────────

    #[test]
    fn multivalued_accumulates_in_row_order_without_dedup() {
        let model = flood_model();
        let view = View::compile(&model, ClassId(0), Some(&Projection::parse("message").unwrap()))
            .unwrap();
        let set = group(vec![
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("message", Term::literal("m2")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("message", Term::literal("m1")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("message", Term::literal("m2")),
        ]);
        let tree = materialize(&set, &view, ExtraValuePolicy::FirstWins).unwrap();
        assert_eq!(scalars(&tree, "message"), vec!["m2", "m1", "m2"]);
    }

    #[test]
    fn set_like_deduplicates_keeping_first() {
        let model = flood_model();
        let view =
            View::compile(&model, ClassId(0), Some(&Projection::parse("tag").unwrap())).unwrap();
        let set = group(vec![
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("tag", Term::literal("b")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("tag", Term::literal("a")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("tag", Term::literal("b")),
        ]);
        let tree = materialize(&set, &view, ExtraValuePolicy::FirstWins).unwrap();
        assert_eq!(scalars(&tree, "tag"), vec!["b", "a"]);
    }

    #[test]
    fn identical_repeats_collapse_silently_on_single_valued() {
        // Cartesian fan-out repeats the same severity on every row.
        let model = flood_model();
        let view =
            View::compile(&model, ClassId(0), Some(&Projection::parse("severity").unwrap()))
                .unwrap();
        let set = group(vec![
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("severity", Term::literal("3")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("severity", Term::literal("3")),
        ]);
        let tree = materialize(&set, &view, ExtraValuePolicy::Error).unwrap();
        assert_eq!(scalars(&tree, "severity"), vec!["3"]);
    }

    // ── extra-value policies ──────────────────────────────────────

    fn conflicted_set() -> ValueSet {
        group(vec![
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("severity", Term::literal("3")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("severity", Term::literal("2")),
        ])
    }

    #[test]
    fn first_wins_keeps_first_distinct() {
        let model = flood_model();
        let view =
            View::compile(&model, ClassId(0), Some(&Projection::parse("severity").unwrap()))
                .unwrap();
        let tree = materialize(&conflicted_set(), &view, ExtraValuePolicy::FirstWins).unwrap();
        assert_eq!(scalars(&tree, "severity"), vec!["3"]);
    }

    #[test]
    fn last_wins_keeps_last_distinct() {
        let model = flood_model();
        let view =
            View::compile(&model, ClassId(0), Some(&Projection::parse("severity").unwrap()))
                .unwrap();
        let tree = materialize(&conflicted_set(), &view, ExtraValuePolicy::LastWins).unwrap();
        assert_eq!(scalars(&tree, "severity"), vec!["2"]);
    }

    #[test]
    fn error_policy_surfaces_configuration_fault() {
        let model = flood_model();
        let view =
            View::compile(&model, ClassId(0), Some(&Projection::parse("severity").unwrap()))
                .unwrap();
        let err = materialize(&conflicted_set(), &view, ExtraValuePolicy::Error).unwrap_err();
        assert!(matches!(err, GraphmapError::Configuration(_)));
    }

    // ── nested expansion ──────────────────────────────────────────

    #[test]
    fn nested_entities_regroup_from_qualified_columns() {
        let model = flood_model();
        let view = View::compile(
            &model,
            ClassId(0),
            Some(&Projection::parse("severity,floodArea.county").unwrap()),
        )
        .unwrap();
        // Wide rows: one alert spanning two areas.
        let set = group(vec![
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("severity", Term::literal("3"))
                .bind("floodArea", Term::uri("area1"))
                .bind("floodArea_county", Term::literal("Kent")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("severity", Term::literal("3"))
                .bind("floodArea", Term::uri("area2"))
                .bind("floodArea_county", Term::literal("Surrey")),
        ]);
        let tree = materialize(&set, &view, ExtraValuePolicy::FirstWins).unwrap();
        let areas = tree.values("floodArea");
        assert_eq!(areas.len(), 2);
        let counties: Vec<String> = areas
            .iter()
            .map(|v| match v {
                TreeValue::Nested(sub) => match &sub.values("county")[0] {
                    TreeValue::Scalar(t) => t.lexical_form().to_string(),
                    _ => panic!("expected scalar county"),
                },
                _ => panic!("expected nested area"),
            })
            .collect();
        assert_eq!(counties, vec!["Kent", "Surrey"]);
    }

    #[test]
    fn nested_child_values_attach_to_their_own_parent() {
        // area1 has two counties, area2 one; values must not bleed across.
        let model = flood_model();
        let view = View::compile(
            &model,
            ClassId(0),
            Some(&Projection::parse("floodArea.county").unwrap()),
        )
        .unwrap();
        let set = group(vec![
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("floodArea", Term::uri("area1"))
                .bind("floodArea_county", Term::literal("Kent")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("floodArea", Term::uri("area2"))
                .bind("floodArea_county", Term::literal("Surrey")),
            BindingRow::new()
                .bind("item", Term::uri("A"))
                .bind("floodArea", Term::uri("area1"))
                .bind("floodArea_county", Term::literal("Essex")),
        ]);
        let tree = materialize(&set, &view, ExtraValuePolicy::FirstWins).unwrap();
        let areas = tree.values("floodArea");
        assert_eq!(areas.len(), 2);
        match &areas[0] {
            TreeValue::Nested(sub) => {
                assert_eq!(sub.identity, Term::uri("area1"));
                // county is single-valued: first distinct wins
                assert_eq!(sub.values("county").len(), 1);
            }
            _ => panic!("expected nested"),
        }
    }

    #[test]
    fn absent_column_materializes_as_empty_field() {
        let model = flood_model();
        let view =
            View::compile(&model, ClassId(0), Some(&Projection::parse("message").unwrap()))
                .unwrap();
        let set = group(vec![BindingRow::new().bind("item", Term::uri("A"))]);
        let tree = materialize(&set, &view, ExtraValuePolicy::FirstWins).unwrap();
        assert!(tree.values("message").is_empty());
    }
}
