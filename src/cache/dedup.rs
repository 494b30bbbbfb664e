//! Per-field duplicate suppression.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

/// Remembers which values have been emitted for each output field
///
/// Owned by a job and passed to its assembler. Call [`DedupTracker::reset`]
/// between independent documents.
#[derive(Debug, Default)]
pub struct DedupTracker {
    seen: FxHashMap<&'static str, FxHashSet<Arc<str>>>,
}

impl DedupTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `field`, returning whether it was new
    pub fn first_seen(&mut self, field: &'static str, value: &Arc<str>) -> bool {
        let seen = self.seen.entry(field).or_default();
        if seen.contains(value) {
            false
        } else {
            seen.insert(Arc::clone(value));
            true
        }
    }

    /// Values of `values` not yet seen for `field`, in input order
    pub fn unseen<'a, I>(&mut self, field: &'static str, values: I) -> Vec<Arc<str>>
    where
        I: IntoIterator<Item = &'a Arc<str>>,
    {
        values
            .into_iter()
            .filter(|value| self.first_seen(field, value))
            .cloned()
            .collect()
    }

    /// Forget every field
    pub fn reset(&mut self) {
        for seen in self.seen.values_mut() {
            seen.clear();
        }
    }

    /// Forget one field
    pub fn reset_field(&mut self, field: &'static str) {
        if let Some(seen) = self.seen.get_mut(field) {
            seen.clear();
        }
    }

    /// Number of values remembered for a field
    #[must_use]
    pub fn seen_count(&self, field: &'static str) -> usize {
        self.seen.get(field).map_or(0, FxHashSet::len)
    }
}
