//! Store port — the single narrow contract the graph store is consumed
//! through. Implemented by the store client; core logic depends only on
//! this trait.

use crate::error::Result;
use crate::term::BindingRow;

/// Ordered stream of binding rows from one execution. Forward-only;
/// dropping it is cancellation.
pub type RowStream = Box<dyn Iterator<Item = BindingRow> + Send>;

/// Execute a compiled query and return its rows in the store's declared
/// order. The compiled query string is the wire contract: the store must
/// honor result ordering (rows for one entity arrive contiguously when the
/// query orders by the identity variable).
///
/// Execution is synchronous/blocking from this system's perspective;
/// timeout and cancellation belong to the implementing client. Failures
/// surface as `GraphmapError::QueryExecution` and are never retried here.
pub trait GraphStore: Send + Sync {
    fn execute(&self, query: &str) -> Result<RowStream>;
}
