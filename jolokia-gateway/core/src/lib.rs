#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod error;
mod reply;
mod target;

pub use self::{
    error::{AuthError, ConstructionError, UpstreamError},
    reply::{ResourceContents, ToolContent, ToolReply},
    target::{EndpointTarget, InvalidTarget},
};

use serde_json::Value;
use std::sync::Arc;

/// The identity the cluster reports for a verified bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub groups: Vec<String>,
}

/// Verifies a caller's bearer token against the cluster identity authority.
///
/// Implementations must not cache verdicts: a token may be revoked between
/// calls, so every inbound call is revalidated.
#[async_trait::async_trait]
pub trait AuthenticateToken: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Bridge-protocol operations against a single resolved endpoint.
///
/// `Ok(None)` is a valid-but-empty upstream response, distinct from an
/// `UpstreamError`.
#[async_trait::async_trait]
pub trait Bridge: Send + Sync {
    async fn version(&self) -> Result<Option<Value>, UpstreamError>;

    async fn list(&self, path: Option<&str>) -> Result<Value, UpstreamError>;

    async fn read(&self, mbean: &str, attribute: &str) -> Result<Option<Value>, UpstreamError>;

    async fn write(
        &self,
        mbean: &str,
        attribute: &str,
        value: Value,
    ) -> Result<Option<Value>, UpstreamError>;

    async fn exec(
        &self,
        mbean: &str,
        operation: &str,
        arguments: Vec<Value>,
    ) -> Result<Option<Value>, UpstreamError>;

    /// The flattened `domain:properties` names of every registered MBean.
    async fn list_mbeans(&self) -> Result<Vec<String>, UpstreamError>;
}

/// Creates or reuses bridge clients keyed by (endpoint, credential).
#[async_trait::async_trait]
pub trait BridgeClients: Send + Sync {
    async fn get_or_create(
        &self,
        target: &EndpointTarget,
        token: &str,
    ) -> Result<Arc<dyn Bridge>, ConstructionError>;
}
