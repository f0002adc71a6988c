use thiserror::Error;

/// Failure to verify a caller's bearer credential.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The inbound request carried no usable token.
    #[error("no bearer token provided")]
    MissingToken,

    /// The identity authority reviewed the token and rejected it.
    #[error("token rejected: {0}")]
    Rejected(String),

    /// The review request itself failed or returned no verdict.
    #[error("token review failed: {0}")]
    Review(String),
}

/// Failure to construct a bridge client for a resolved endpoint.
///
/// Never cached: the next call with the same key retries construction.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("failed to read TLS material from {path}: {source}")]
    TlsMaterial {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid client TLS identity: {0}")]
    Identity(String),

    #[error("bearer token is not a valid header value")]
    Credential,

    #[error("failed to build HTTP client: {0}")]
    Http(String),
}

/// A bridge-protocol call that failed at or on the way to the upstream.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    #[error("{url} answered HTTP {status}")]
    Http { url: String, status: u16 },

    /// The endpoint answered, but the bridge reported a failure.
    #[error("bridge returned status {status}: {error}")]
    Bridge { status: u16, error: String },

    #[error("failed to decode bridge response: {0}")]
    Decode(String),
}
