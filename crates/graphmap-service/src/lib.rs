//! graphmap-service — named endpoints over the mapping/query/result
//! pipeline.
//!
//! Holds the immutable ModelSpec and EndpointTable consumed from the
//! configuration loader, a `GraphStore` handle, and the concurrent view
//! cache. The request layer calls `Engine::run` (or `run_trees` for the
//! lazy stream, `compile_query` for inspection); everything else is
//! internal.

mod cache;
mod endpoint;
mod engine;

pub use endpoint::{EndpointSpec, EndpointTable};
pub use engine::{
    Engine, TreeStream, PARAM_LAT, PARAM_LIMIT, PARAM_LONG, PARAM_OFFSET, PARAM_RADIUS,
    PARAM_VIEW,
};
