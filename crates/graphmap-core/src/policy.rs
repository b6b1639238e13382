//! Output policy — a small injected policy consulted only at
//! serialization time. Implemented by the caller; the defaults here are
//! the identity behavior.

use crate::view::ViewField;

pub trait OutputPolicy: Send + Sync {
    /// JSON field name to emit for a selected property.
    fn field_name_for(&self, field: &ViewField) -> String {
        field.json_name.clone()
    }

    /// Rendering of a URI value (e.g. shortening, relativizing).
    fn render_uri(&self, uri: &str) -> String {
        uri.to_string()
    }

    /// Whether a literal carrying `tag` is emitted for this field.
    fn include_language_tag(&self, _field_name: &str, _tag: &str) -> bool {
        true
    }

    /// Whether nested entities are emitted as objects; when false the
    /// nested identity is emitted instead.
    fn allow_nesting(&self, _field_name: &str) -> bool {
        true
    }
}

/// Identity policy: mapping names as-is, URIs verbatim, every language
/// tag, nesting everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOutputPolicy;

impl OutputPolicy for DefaultOutputPolicy {}
