use crate::{Container, Pod};
use jolokia_gateway_core::{EndpointTarget, InvalidTarget};
use std::num::NonZeroU16;
use thiserror::Error;
use tracing::{debug, trace};

/// The reserved container-port name that marks a pod as a bridge target.
pub const JOLOKIA_PORT_NAME: &str = "jolokia";

/// Pod annotation overriding the endpoint scheme.
pub const PROTOCOL_ANNOTATION: &str = "hawt.io/protocol";

/// Pod annotation overriding the endpoint path.
pub const PATH_ANNOTATION: &str = "hawt.io/jolokiaPath";

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_PATH: &str = "/jolokia/";

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The pod declares a jolokia port but has no assigned IP address.
    ///
    /// Callers check readiness before resolving, so this signals a
    /// construction bug rather than a pod that is still starting.
    #[error("pod has no assigned IP address")]
    NoAddress,

    #[error("container port {0} is not a valid port number")]
    InvalidPort(i32),

    #[error(transparent)]
    InvalidTarget(#[from] InvalidTarget),
}

/// Derives the Jolokia endpoint for a pod.
///
/// Returns `Ok(None)` when no container declares a port named `jolokia`: the
/// pod is simply not a bridge target, which is a successful outcome.
pub fn resolve(pod: &Pod) -> Result<Option<EndpointTarget>, ResolveError> {
    let port = match jolokia_port(pod) {
        Some(port) => port,
        None => {
            trace!("no jolokia port declared");
            return Ok(None);
        }
    };
    let port = u16::try_from(port)
        .ok()
        .and_then(NonZeroU16::new)
        .ok_or(ResolveError::InvalidPort(port))?;

    let host = pod
        .status
        .as_ref()
        .and_then(|status| status.pod_ip.as_deref())
        .filter(|ip| !ip.is_empty())
        .ok_or(ResolveError::NoAddress)?;

    let protocol = annotation(pod, PROTOCOL_ANNOTATION).unwrap_or(DEFAULT_PROTOCOL);
    let path = annotation(pod, PATH_ANNOTATION).unwrap_or(DEFAULT_PATH);

    let target = EndpointTarget::new(protocol, host, port, path)?;
    debug!(%target, "resolved jolokia endpoint");
    Ok(Some(target))
}

/// Scans every container for the reserved port name.
///
/// Within a container the first matching port is taken; when several
/// containers declare the port, the last container scanned wins. The
/// tie-break is deliberate, long-standing behavior and must not be changed
/// to first-wins without confirming the intended semantics.
fn jolokia_port(pod: &Pod) -> Option<i32> {
    let mut found = None;
    for container in &pod.spec.as_ref()?.containers {
        if let Some(port) = container_port(container) {
            trace!(container = %container.name, port, "container declares the jolokia port");
            found = Some(port);
        }
    }
    found
}

fn container_port(container: &Container) -> Option<i32> {
    container
        .ports
        .iter()
        .flatten()
        .find(|port| port.name.as_deref() == Some(JOLOKIA_PORT_NAME))
        .map(|port| port.container_port)
}

fn annotation<'p>(pod: &'p Pod, name: &str) -> Option<&'p str> {
    pod.metadata
        .annotations
        .as_ref()?
        .get(name)
        .map(String::as_str)
}
