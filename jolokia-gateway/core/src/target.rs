use std::{fmt, num::NonZeroU16};
use thiserror::Error;

/// A resolved bridge endpoint.
///
/// Derived once per resolution call and never persisted beyond it. The
/// composed URL is validated on construction, so holding an `EndpointTarget`
/// implies a well-formed address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EndpointTarget {
    protocol: String,
    host: String,
    port: NonZeroU16,
    path: String,
}

#[derive(Debug, Error)]
#[error("invalid endpoint {url:?}: {source}")]
pub struct InvalidTarget {
    url: String,
    #[source]
    source: http::uri::InvalidUri,
}

// === impl EndpointTarget ===

impl EndpointTarget {
    pub fn new(
        protocol: impl Into<String>,
        host: impl Into<String>,
        port: NonZeroU16,
        path: impl Into<String>,
    ) -> Result<Self, InvalidTarget> {
        let target = Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            path: path.into(),
        };

        let url = target.to_string();
        if let Err(source) = url.parse::<http::Uri>() {
            return Err(InvalidTarget { url, source });
        }

        Ok(target)
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> NonZeroU16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The canonical URL, e.g. `https://10.1.2.3:8778/jolokia/`.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EndpointTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}:{}{}",
            self.protocol, self.host, self.port, self.path
        )
    }
}
