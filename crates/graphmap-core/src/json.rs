//! JSON rendering of materialized trees, plus the unordered-array
//! comparator used by golden-file tests.

use serde_json::{Map, Value};

use crate::policy::OutputPolicy;
use crate::term::{
    Term, XSD_BOOLEAN, XSD_DECIMAL, XSD_DOUBLE, XSD_FLOAT, XSD_INT, XSD_INTEGER, XSD_LONG,
};
use crate::tree::{TreeResult, TreeValue};
use crate::view::View;

/// Render one entity tree as a JSON object. Field order follows the view;
/// empty fields are omitted; `@id` carries the entity identity.
pub fn tree_to_json(tree: &TreeResult, view: &View, policy: &dyn OutputPolicy) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "@id".to_string(),
        Value::String(render_identity(&tree.identity, policy)),
    );
    for field in &view.fields {
        let values = tree.values(&field.json_name);
        if values.is_empty() {
            continue;
        }
        let name = policy.field_name_for(field);
        let rendered: Vec<Value> = values
            .iter()
            .filter_map(|value| match value {
                TreeValue::Scalar(term) => term_to_json(term, &name, policy),
                TreeValue::Nested(sub) => {
                    if policy.allow_nesting(&name) {
                        field
                            .nested
                            .as_ref()
                            .map(|subview| tree_to_json(sub, subview, policy))
                    } else {
                        Some(Value::String(render_identity(&sub.identity, policy)))
                    }
                }
            })
            .collect();
        if field.multivalued {
            obj.insert(name, Value::Array(rendered));
        } else if let Some(first) = rendered.into_iter().next() {
            obj.insert(name, first);
        }
    }
    Value::Object(obj)
}

fn render_identity(term: &Term, policy: &dyn OutputPolicy) -> String {
    match term {
        Term::Uri(u) => policy.render_uri(u),
        Term::Blank(id) => format!("_:{}", id),
        Term::Literal { lexical, .. } => lexical.clone(),
    }
}

fn term_to_json(term: &Term, field_name: &str, policy: &dyn OutputPolicy) -> Option<Value> {
    match term {
        Term::Uri(u) => Some(Value::String(policy.render_uri(u))),
        Term::Blank(id) => Some(Value::String(format!("_:{}", id))),
        Term::Literal {
            lexical,
            datatype,
            lang,
        } => {
            if let Some(tag) = lang {
                if !policy.include_language_tag(field_name, tag) {
                    return None;
                }
            }
            Some(literal_to_json(lexical, datatype.as_deref()))
        }
    }
}

// Numeric/boolean datatypes map to native JSON; anything unparseable
// falls back to the lexical string.
fn literal_to_json(lexical: &str, datatype: Option<&str>) -> Value {
    match datatype {
        Some(XSD_INTEGER) | Some(XSD_INT) | Some(XSD_LONG) => lexical
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(lexical.to_string())),
        Some(XSD_DECIMAL) | Some(XSD_DOUBLE) | Some(XSD_FLOAT) => lexical
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(lexical.to_string())),
        Some(XSD_BOOLEAN) => match lexical {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(lexical.to_string()),
        },
        _ => Value::String(lexical.to_string()),
    }
}

/// Equality up to array permutation: array-valued fields compare as
/// multisets (membership and count both matter), objects by key, scalars
/// exactly. The comparator golden-file tests use.
pub fn json_multiset_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut claimed = vec![false; ys.len()];
            for x in xs {
                let matched = ys.iter().enumerate().find(|(i, y)| {
                    !claimed[*i] && json_multiset_eq(x, y)
                });
                match matched {
                    Some((i, _)) => claimed[i] = true,
                    None => return false,
                }
            }
            true
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_multiset_eq(x, y)))
        }
        _ => a == b,
    }
}
