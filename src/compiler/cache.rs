//! Process-wide, graph-key-keyed compile cache.
//!
//! Mirrors the `once_cell::sync::Lazy` + `parking_lot::Mutex` global-state
//! pattern used for shared runtime state elsewhere in this codebase.

use crate::compiler::{compile_uncached, CompiledGraph, GraphError};
use crate::ir::GraphSpec;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

static CACHE: Lazy<Mutex<HashMap<String, Arc<CompiledGraph>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Compile `spec`, reusing a cached [`CompiledGraph`] when one exists for
/// this spec's graph key. Cached entries are immutable and never evicted
/// within the process's lifetime.
pub fn compile_cached(spec: &GraphSpec) -> Result<Arc<CompiledGraph>, GraphError> {
    let key = crate::compiler::key::graph_key(spec);
    if let Some(hit) = CACHE.lock().get(&key) {
        return Ok(Arc::clone(hit));
    }
    let compiled = Arc::new(compile_uncached(spec)?);
    CACHE.lock().insert(key, Arc::clone(&compiled));
    Ok(compiled)
}

/// Remove every entry from the cache. Exposed for tests that need a clean
/// cache between graph-key collision scenarios.
#[cfg(test)]
pub fn clear_cache() {
    CACHE.lock().clear();
}
