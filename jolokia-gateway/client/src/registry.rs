use jolokia_gateway_core::{Bridge, BridgeClients, ConstructionError, EndpointTarget};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

/// Constructs protocol clients for the registry.
///
/// The seam exists so the registry's concurrency contract can be exercised
/// without real TLS material.
#[async_trait::async_trait]
pub trait NewClient: Send + Sync {
    type Client: Send + Sync + 'static;

    async fn new_client(
        &self,
        target: &EndpointTarget,
        token: &str,
    ) -> Result<Self::Client, ConstructionError>;
}

/// Identity of a cached client: the endpoint plus the caller's credential.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: String,
    token: String,
}

impl fmt::Debug for CacheKey {
    // The credential must never reach log output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// A concurrency-safe cache of live protocol clients.
///
/// Repeated calls with an equal (endpoint, credential) key receive the same
/// client instance. Concurrent first use of a key collapses into a single
/// construction whose result all callers share; a failed construction is not
/// cached, so the next call retries. Entries idle longer than `idle_timeout`
/// are swept on access, and the least recently used entry is evicted when
/// the registry is at `capacity`; every distinct credential mints an entry,
/// so growth must be bounded.
pub struct ClientRegistry<N: NewClient> {
    new_client: N,
    entries: Mutex<HashMap<CacheKey, Entry<N::Client>>>,
    capacity: usize,
    idle_timeout: Duration,
}

struct Entry<C> {
    cell: Arc<OnceCell<Arc<C>>>,
    last_used: Instant,
}

// === impl ClientRegistry ===

impl<N: NewClient> ClientRegistry<N> {
    pub fn new(new_client: N, capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            new_client,
            entries: Mutex::new(HashMap::new()),
            capacity,
            idle_timeout,
        }
    }

    pub async fn get_or_create(
        &self,
        target: &EndpointTarget,
        token: &str,
    ) -> Result<Arc<N::Client>, ConstructionError> {
        let key = CacheKey {
            endpoint: target.url(),
            token: token.to_string(),
        };

        let cell = self.checkout(key);
        cell.get_or_try_init(|| async {
            debug!(endpoint = %target, "constructing bridge client");
            self.new_client.new_client(target, token).await.map(Arc::new)
        })
        .await
        .cloned()
    }

    /// Returns the per-key construction cell, sweeping idle entries and
    /// evicting at capacity. The lock is never held across construction.
    fn checkout(&self, key: CacheKey) -> Arc<OnceCell<Arc<N::Client>>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        entries.retain(|entry_key, entry| {
            let keep = now.duration_since(entry.last_used) < self.idle_timeout;
            if !keep {
                trace!(key = ?entry_key, "dropping idle client");
            }
            keep
        });

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            if let Some(lru) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(entry_key, _)| entry_key.clone())
            {
                debug!(key = ?lru, "evicting least recently used client");
                entries.remove(&lru);
            }
        }

        let entry = entries.entry(key).or_insert_with(|| Entry {
            cell: Arc::new(OnceCell::new()),
            last_used: now,
        });
        entry.last_used = now;
        entry.cell.clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[async_trait::async_trait]
impl<N> BridgeClients for ClientRegistry<N>
where
    N: NewClient,
    N::Client: Bridge,
{
    async fn get_or_create(
        &self,
        target: &EndpointTarget,
        token: &str,
    ) -> Result<Arc<dyn Bridge>, ConstructionError> {
        let client: Arc<dyn Bridge> = ClientRegistry::get_or_create(self, target, token).await?;
        Ok(client)
    }
}
