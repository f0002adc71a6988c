use jolokia_gateway_core::{
    AuthenticateToken, Bridge, BridgeClients, ToolReply, UpstreamError,
};
use jolokia_gateway_k8s::{resolve, Pod, WorkloadStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Orchestrates one inbound tool call: authenticate the caller, look the pod
/// up, resolve its bridge endpoint, and proxy the requested operation.
///
/// Every exit path returns a structured reply; no internal error type
/// crosses this boundary verbatim.
pub struct Gateway<A, W, C> {
    auth: A,
    workloads: W,
    clients: C,
}

/// Where the shared front half of a call ended up.
enum Connection {
    Bridge(Arc<dyn Bridge>),
    NotATarget,
}

// === impl Gateway ===

impl<A, W, C> Gateway<A, W, C>
where
    A: AuthenticateToken,
    W: WorkloadStore,
    C: BridgeClients,
{
    pub fn new(auth: A, workloads: W, clients: C) -> Self {
        Self {
            auth,
            workloads,
            clients,
        }
    }

    /// Reads the version document of the Jolokia endpoint on a pod.
    #[instrument(skip(self, token))]
    pub async fn version(
        &self,
        token: Option<&str>,
        namespace: &str,
        pod_name: &str,
    ) -> ToolReply {
        let bridge = match self.connect(token, namespace, pod_name).await {
            Ok(Connection::Bridge(bridge)) => bridge,
            Ok(Connection::NotATarget) => return not_a_target(pod_name),
            Err(reply) => return reply,
        };

        match bridge.version().await {
            Ok(Some(version)) => {
                info!(pod = %pod_name, "retrieved jolokia version");
                ToolReply::resource(
                    format!("jolokia://{pod_name}/version"),
                    "application/json",
                    version.to_string(),
                )
            }
            Ok(None) => {
                warn!(pod = %pod_name, "jolokia version response was empty");
                ToolReply::text(format!(
                    "Successfully connected to pod '{pod_name}', but no version information was returned by the Jolokia endpoint."
                ))
            }
            Err(error) => upstream_error(pod_name, &error),
        }
    }

    /// Reads one attribute of one MBean on a pod.
    #[instrument(skip(self, token))]
    pub async fn read_attribute(
        &self,
        token: Option<&str>,
        namespace: &str,
        pod_name: &str,
        mbean: &str,
        attribute: &str,
    ) -> ToolReply {
        let bridge = match self.connect(token, namespace, pod_name).await {
            Ok(Connection::Bridge(bridge)) => bridge,
            Ok(Connection::NotATarget) => return not_a_target(pod_name),
            Err(reply) => return reply,
        };

        match bridge.read(mbean, attribute).await {
            Ok(Some(value)) => ToolReply::text(render(&value)),
            Ok(None) => ToolReply::text(format!(
                "Successfully connected to pod '{pod_name}', but no value was returned for attribute '{attribute}' on MBean '{mbean}'."
            )),
            Err(error) => upstream_error(pod_name, &error),
        }
    }

    /// The shared front half of every operation. Each failure arm is already
    /// a boundary reply, so callers only branch on the outcome.
    async fn connect(
        &self,
        token: Option<&str>,
        namespace: &str,
        pod_name: &str,
    ) -> Result<Connection, ToolReply> {
        let token = token.unwrap_or_default();
        if let Err(error) = self.auth.authenticate(token).await {
            warn!(%error, "authentication failed");
            return Err(ToolReply::error(format!(
                "Failed to validate authentication: {error}"
            )));
        }

        let pod = match self.workloads.get_pod(namespace, pod_name).await {
            Ok(Some(pod)) => pod,
            Ok(None) => {
                return Err(ToolReply::error(format!(
                    "Pod not found: {pod_name} in namespace: {namespace}"
                )))
            }
            Err(error) => {
                warn!(%error, "workload lookup failed");
                return Err(ToolReply::error(format!(
                    "Failed to query Kubernetes API: {error}"
                )));
            }
        };

        // The resolver assumes a populated address, so readiness is checked
        // here first.
        if !is_ready(&pod) {
            return Err(ToolReply::error(format!(
                "Pod {pod_name} does not have an IP address yet. It may still be starting."
            )));
        }

        let target = match resolve(&pod) {
            Ok(Some(target)) => target,
            Ok(None) => return Ok(Connection::NotATarget),
            Err(error) => {
                warn!(%error, "endpoint resolution failed");
                return Err(ToolReply::error(format!(
                    "Pod '{pod_name}' produced an error while deriving the url to the jolokia service: {error}"
                )));
            }
        };
        debug!(%target, "resolved bridge endpoint");

        match self.clients.get_or_create(&target, token).await {
            Ok(bridge) => Ok(Connection::Bridge(bridge)),
            Err(error) => {
                warn!(%error, "client construction failed");
                Err(ToolReply::error(format!(
                    "Pod '{pod_name}' produced an error while connecting to the application's jolokia service: {error}"
                )))
            }
        }
    }
}

fn is_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.pod_ip.as_deref())
        .is_some_and(|ip| !ip.is_empty())
}

fn not_a_target(pod_name: &str) -> ToolReply {
    ToolReply::text(format!(
        "The pod '{pod_name}' was found but does not expose a Jolokia port, so it is not a pod of interest."
    ))
}

fn upstream_error(pod_name: &str, error: &UpstreamError) -> ToolReply {
    warn!(%error, pod = %pod_name, "bridge call failed");
    ToolReply::error(format!(
        "Pod '{pod_name}' produced an error while querying the application's jolokia service: {error}"
    ))
}

/// Attribute values are rendered as bare text when they are strings and as
/// JSON otherwise.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
