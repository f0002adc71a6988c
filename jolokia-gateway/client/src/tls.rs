use jolokia_gateway_core::ConstructionError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// TLS material presented to workload endpoints.
///
/// The gateway authenticates itself to targets with a client certificate and
/// key (mutual TLS). Target certificates are typically self-signed or not
/// chained to any cluster-known authority, so `trust_upstream_certificates`
/// disables upstream verification, hostname checks included. The flag keeps
/// that trade-off visible in configuration instead of burying it in client
/// setup.
#[derive(Clone, Debug)]
pub struct ProxyTls {
    cert: PathBuf,
    key: PathBuf,
    trust_upstream_certificates: bool,
}

// === impl ProxyTls ===

impl ProxyTls {
    pub fn new(
        cert: impl Into<PathBuf>,
        key: impl Into<PathBuf>,
        trust_upstream_certificates: bool,
    ) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
            trust_upstream_certificates,
        }
    }

    pub fn trust_upstream_certificates(&self) -> bool {
        self.trust_upstream_certificates
    }

    /// Builds the client identity for mutual TLS toward a target.
    ///
    /// The material is read on every call so that rotated certificates are
    /// picked up by the next client construction.
    pub fn identity(&self) -> Result<reqwest::Identity, ConstructionError> {
        debug!(cert = %self.cert.display(), key = %self.key.display(), "loading proxy TLS identity");
        let bundle = self.pem_bundle()?;
        reqwest::Identity::from_pem(&bundle)
            .map_err(|error| ConstructionError::Identity(error.to_string()))
    }

    /// Certificate chain and private key concatenated into one PEM bundle.
    fn pem_bundle(&self) -> Result<Vec<u8>, ConstructionError> {
        let mut bundle = read(&self.cert)?;
        bundle.push(b'\n');
        bundle.extend(read(&self.key)?);
        Ok(bundle)
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ConstructionError> {
    std::fs::read(path).map_err(|source| ConstructionError::TlsMaterial {
        path: path.display().to_string(),
        source,
    })
}
