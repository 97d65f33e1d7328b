use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use bson::Document;

use crate::error::Result;
use crate::filter::Filter;

/// Filter fragments merged into every filter created with
/// [`crate::Options::globals`], e.g. a tenant condition that must always
/// apply.
///
/// Clones share the same list. Readers take a snapshot without locking, so
/// filters built on other threads are never blocked by writers.
///
/// ```ignore
/// let globals = GlobalFilters::new();
/// globals.add(&Filter::new().equal("tenant_id", "123"))?;
/// let filter = Filter::with_options(Options::new().globals(&globals));
/// ```
#[derive(Clone)]
pub struct GlobalFilters {
    filters: Arc<ArcSwap<Vec<Document>>>,
}

impl GlobalFilters {
    pub fn new() -> Self {
        Self {
            filters: Arc::new(ArcSwap::from_pointee(Vec::new())),
        }
    }

    /// Build `filter` and register its document. A filter that fails to build
    /// is rejected with its error.
    pub fn add(&self, filter: &Filter<'_>) -> Result<()> {
        let document = filter.build()?;
        self.add_document(document);
        Ok(())
    }

    /// Register a raw document as-is.
    pub fn add_document(&self, document: Document) {
        self.filters.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(document.clone());
            next
        });
        tracing::debug!(count = self.len(), "global filter added");
    }

    pub fn clear(&self) {
        self.filters.store(Arc::new(Vec::new()));
        tracing::debug!("global filters cleared");
    }

    /// The registered documents at this instant.
    pub fn snapshot(&self) -> Arc<Vec<Document>> {
        self.filters.load_full()
    }

    pub fn len(&self) -> usize {
        self.filters.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for GlobalFilters {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GlobalFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalFilters")
            .field("filters", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::thread;

    #[test]
    fn clones_share_registrations() {
        let globals = GlobalFilters::new();
        let shared = globals.clone();
        globals.add_document(doc! { "tenant": "a" });
        assert_eq!(shared.len(), 1);
        shared.clear();
        assert!(globals.is_empty());
    }

    #[test]
    fn snapshot_is_stable_across_writes() {
        let globals = GlobalFilters::new();
        globals.add_document(doc! { "a": 1 });
        let before = globals.snapshot();
        globals.add_document(doc! { "b": 2 });
        assert_eq!(before.len(), 1);
        assert_eq!(globals.snapshot().len(), 2);
    }

    #[test]
    fn concurrent_adds_are_all_kept() {
        let globals = GlobalFilters::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let globals = globals.clone();
                thread::spawn(move || globals.add_document(doc! { "n": i }))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(globals.len(), 8);
    }
}
