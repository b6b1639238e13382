//! View cache keyed by (endpoint, projection string).
//!
//! View compilation is a pure function of immutable inputs, so population
//! is at-most-once-effective: concurrent duplicate computation is wasteful
//! but not incorrect — results are equal and any write wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use graphmap_core::{Result, View};

#[derive(Default)]
pub(crate) struct ViewCache {
    inner: RwLock<HashMap<(String, String), Arc<View>>>,
}

impl ViewCache {
    pub(crate) fn get_or_compile(
        &self,
        endpoint: &str,
        projection: &str,
        compute: impl FnOnce() -> Result<View>,
    ) -> Result<Arc<View>> {
        let key = (endpoint.to_string(), projection.to_string());
        if let Ok(guard) = self.inner.read() {
            if let Some(view) = guard.get(&key) {
                debug!(endpoint, projection, "view cache hit");
                return Ok(Arc::clone(view));
            }
        }
        debug!(endpoint, projection, "view cache miss");
        let view = Arc::new(compute()?);
        if let Ok(mut guard) = self.inner.write() {
            guard.insert(key, Arc::clone(&view));
        }
        Ok(view)
    }
}
