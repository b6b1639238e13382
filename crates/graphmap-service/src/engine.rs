//! The per-request pipeline: parse projection → compile view → compile
//! query → execute → group → materialize → serialize.
//!
//! Each call runs single-threaded over its own state; the engine itself
//! holds only immutable structures plus the view cache, so it is shared
//! freely across concurrent callers.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use graphmap_core::{
    materialize, tree_to_json, ExtraValuePolicy, GraphmapError, GraphStore, GroupedRows,
    ModelSpec, OutputPolicy, Projection, Request, Result, RowStream, TreeResult, View,
    IDENTITY_VAR,
};
use graphmap_sparql::{Extras, GeoCircle, QueryStrategy};

use crate::cache::ViewCache;
use crate::endpoint::{EndpointSpec, EndpointTable};

/// Reserved request parameters consumed by the engine.
pub const PARAM_VIEW: &str = "_view";
pub const PARAM_LIMIT: &str = "_limit";
pub const PARAM_OFFSET: &str = "_offset";
pub const PARAM_LAT: &str = "_lat";
pub const PARAM_LONG: &str = "_long";
pub const PARAM_RADIUS: &str = "_radius";

pub struct Engine {
    model: Arc<ModelSpec>,
    endpoints: EndpointTable,
    store: Arc<dyn GraphStore>,
    cache: ViewCache,
}

impl Engine {
    /// Build an engine over a validated model and endpoint table. Fails
    /// fast on configuration faults; nothing is re-validated per request.
    pub fn new(
        model: ModelSpec,
        endpoints: EndpointTable,
        store: Arc<dyn GraphStore>,
    ) -> Result<Self> {
        model.validate()?;
        for spec in endpoints.iter() {
            if let Some(class) = &spec.class {
                if model.find_class(class).is_none() {
                    return Err(GraphmapError::Configuration(format!(
                        "endpoint '{}' targets unknown class '{}'",
                        spec.name, class
                    )));
                }
            }
        }
        Ok(Engine {
            model: Arc::new(model),
            endpoints,
            store,
            cache: ViewCache::default(),
        })
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    /// Compile the query an endpoint/request pair would execute — the
    /// inspection/debugging surface.
    pub fn compile_query(&self, endpoint: &str, request: &Request) -> Result<String> {
        let spec = self.endpoints.get(endpoint)?;
        let view = match self.view_for(spec, request)? {
            Some(view) => view,
            // Template endpoints without a result class compile against
            // an empty view; the template ignores it.
            None => Arc::new(View {
                class_uri: String::new(),
                json_name: spec.name.clone(),
                fields: vec![],
            }),
        };
        self.compile_for(spec, &view, request)
    }

    /// Run the full pipeline, returning the lazy per-entity tree stream.
    pub fn run_trees(&self, endpoint: &str, request: &Request) -> Result<TreeStream> {
        let spec = self.endpoints.get(endpoint)?;
        let view = self.view_for(spec, request)?.ok_or_else(|| {
            GraphmapError::Configuration(format!(
                "endpoint '{}' has no class to materialize results against",
                spec.name
            ))
        })?;
        let query = self.compile_for(spec, &view, request)?;
        let rows = self.store.execute(&query)?;
        debug!(endpoint, "executing");
        Ok(TreeStream {
            view,
            extra_values: self.model.extra_values,
            groups: GroupedRows::new(rows, IDENTITY_VAR),
        })
    }

    /// Run the pipeline and serialize every entity through the output
    /// policy.
    pub fn run(
        &self,
        endpoint: &str,
        request: &Request,
        policy: &dyn OutputPolicy,
    ) -> Result<Vec<Value>> {
        let stream = self.run_trees(endpoint, request)?;
        let view = stream.view_arc();
        let mut results = Vec::new();
        for tree in stream {
            results.push(tree_to_json(&tree?, &view, policy));
        }
        Ok(results)
    }

    fn view_for(&self, spec: &EndpointSpec, request: &Request) -> Result<Option<Arc<View>>> {
        let class = match &spec.class {
            Some(class) => class,
            None => return Ok(None),
        };
        let root = self.model.find_class(class).ok_or_else(|| {
            GraphmapError::Configuration(format!("unknown class '{}'", class))
        })?;
        let projection_text = request.first(PARAM_VIEW).unwrap_or("");
        let view = self.cache.get_or_compile(&spec.name, projection_text, || {
            let projection = if projection_text.is_empty() {
                None
            } else {
                Some(Projection::parse(projection_text)?)
            };
            View::compile(&self.model, root, projection.as_ref())
        })?;
        Ok(Some(view))
    }

    fn compile_for(&self, spec: &EndpointSpec, view: &View, request: &Request) -> Result<String> {
        let strategy = match &spec.template {
            Some(template) => QueryStrategy::Template(template.clone()),
            None => QueryStrategy::Generated,
        };
        let extras = self.extras_for(spec, request)?;
        strategy.compile(&self.model, view, request, &extras)
    }

    fn extras_for(&self, spec: &EndpointSpec, request: &Request) -> Result<Extras> {
        let mut extras = Extras {
            modifiers: spec.modifiers.clone(),
            ..Extras::default()
        };
        if let Some(raw) = request.first(PARAM_LIMIT) {
            extras.modifiers.push(format!("LIMIT {}", parse_count(PARAM_LIMIT, raw)?));
        }
        if let Some(raw) = request.first(PARAM_OFFSET) {
            extras
                .modifiers
                .push(format!("OFFSET {}", parse_count(PARAM_OFFSET, raw)?));
        }
        extras.geo = self.geo_for(request)?;
        Ok(extras)
    }

    fn geo_for(&self, request: &Request) -> Result<Option<GeoCircle>> {
        let lat = request.first(PARAM_LAT);
        let lon = request.first(PARAM_LONG);
        let radius = request.first(PARAM_RADIUS);
        match (lat, lon, radius) {
            (None, None, None) => Ok(None),
            (Some(lat), Some(lon), Some(radius)) => Ok(Some(GeoCircle::new(
                parse_coord(PARAM_LAT, lat)?,
                parse_coord(PARAM_LONG, lon)?,
                parse_coord(PARAM_RADIUS, radius)?,
            ))),
            _ => Err(GraphmapError::BindingMismatch(format!(
                "geo constraint requires {}, {} and {} together",
                PARAM_LAT, PARAM_LONG, PARAM_RADIUS
            ))),
        }
    }
}

fn parse_count(name: &str, raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| {
        GraphmapError::BindingMismatch(format!(
            "parameter '{}' must be a non-negative integer, got '{}'",
            name, raw
        ))
    })
}

fn parse_coord(name: &str, raw: &str) -> Result<f64> {
    raw.parse().map_err(|_| {
        GraphmapError::BindingMismatch(format!(
            "parameter '{}' must be a number, got '{}'",
            name, raw
        ))
    })
}

/// Lazy, forward-only stream of materialized entity trees. Dropping it
/// cancels the underlying row stream; never restart an exhausted one.
pub struct TreeStream {
    view: Arc<View>,
    extra_values: ExtraValuePolicy,
    groups: GroupedRows<RowStream>,
}

impl TreeStream {
    pub fn view_arc(&self) -> Arc<View> {
        Arc::clone(&self.view)
    }
}

impl Iterator for TreeStream {
    type Item = Result<TreeResult>;

    fn next(&mut self) -> Option<Self::Item> {
        let set = self.groups.next()?;
        Some(materialize(&set, &self.view, self.extra_values))
    }
}
