use std::time::{Duration, Instant};

/// Cache of the flattened MBean name set with a freshness window.
///
/// Expiry of the window is the only refresh trigger. The window length is an
/// operator-configurable, non-load-bearing choice.
#[derive(Debug)]
pub struct MBeanIndexCache {
    ttl: Duration,
    entry: Option<IndexEntry>,
}

#[derive(Debug)]
struct IndexEntry {
    names: Vec<String>,
    refreshed_at: Instant,
}

// === impl MBeanIndexCache ===

impl MBeanIndexCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Whether the freshness window of the last fetch still holds.
    pub fn is_valid(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| entry.refreshed_at.elapsed() < self.ttl)
    }

    /// The cached name set, while valid.
    pub fn get(&self) -> Option<Vec<String>> {
        if !self.is_valid() {
            return None;
        }
        self.entry.as_ref().map(|entry| entry.names.clone())
    }

    pub fn put(&mut self, names: Vec<String>) {
        self.entry = Some(IndexEntry {
            names,
            refreshed_at: Instant::now(),
        });
    }
}
