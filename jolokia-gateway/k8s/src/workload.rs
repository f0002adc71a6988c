use crate::Pod;
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

/// Failure to consult the cluster API for a workload.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct LookupError(#[from] kube::Error);

/// Looks up workloads by namespace and name.
#[async_trait::async_trait]
pub trait WorkloadStore: Send + Sync {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>, LookupError>;
}

/// Cluster-backed workload lookup.
#[derive(Clone)]
pub struct PodStore {
    client: Client,
}

// === impl PodStore ===

impl PodStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl WorkloadStore for PodStore {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>, LookupError> {
        debug!(%namespace, %name, "fetching pod");
        let api = Api::<Pod>::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}
