//! String interning for cache values.

use std::sync::Arc;

use rustc_hash::FxHashSet;

/// Hash-consing pool handing out shared `Arc<str>` values
///
/// One pool is used per cache query so that repeated values (symbols, IDs,
/// citations) are allocated once per distinct value.
#[derive(Debug, Default)]
pub struct StringPool {
    values: FxHashSet<Arc<str>>,
    requests: usize,
}

impl StringPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared copy of `value`
    pub fn intern(&mut self, value: &str) -> Arc<str> {
        self.requests += 1;
        if let Some(existing) = self.values.get(value) {
            return Arc::clone(existing);
        }
        let interned: Arc<str> = Arc::from(value);
        self.values.insert(Arc::clone(&interned));
        interned
    }

    /// Shared copy of an optional value
    pub fn intern_opt(&mut self, value: Option<&str>) -> Option<Arc<str>> {
        value.map(|v| self.intern(v))
    }

    /// Number of distinct values held
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.values.len()
    }

    /// Number of values requested
    #[must_use]
    pub const fn requests(&self) -> usize {
        self.requests
    }
}
