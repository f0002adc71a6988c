use crate::gateway::Gateway;
use futures::future;
use http_body_util::BodyExt;
use hyper::{http, Request, Response};
use jolokia_gateway_client::{ClientRegistry, JolokiaFactory};
use jolokia_gateway_core::ToolReply;
use jolokia_gateway_k8s::{PodStore, TokenReviewValidator};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{trace, warn};

/// The fully wired gateway the service dispatches to.
pub type GatewayHandle =
    Gateway<TokenReviewValidator, PodStore, ClientRegistry<JolokiaFactory>>;

type Body = http_body_util::Full<bytes::Bytes>;

/// Serves the gateway's tool operations over HTTPS.
///
/// The caller's bearer credential arrives on the `Authorization` header and
/// is forwarded, per call, into the gateway; it is never persisted here.
#[derive(Clone)]
pub struct ToolService {
    gateway: Arc<GatewayHandle>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read request body: {0}")]
    Request(#[from] hyper::Error),

    #[error("failed to encode json response: {0}")]
    Json(#[from] serde_json::Error),
}

enum Route {
    Version,
    ReadAttribute,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionParams {
    namespace: String,
    pod_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadAttributeParams {
    namespace: String,
    pod_name: String,
    mbean: String,
    attribute: String,
}

// === impl ToolService ===

impl ToolService {
    pub fn new(gateway: Arc<GatewayHandle>) -> Self {
        Self { gateway }
    }
}

impl tower::Service<Request<hyper::body::Incoming>> for ToolService {
    type Response = Response<Body>;
    type Error = Error;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<hyper::body::Incoming>) -> Self::Future {
        trace!(method = %req.method(), path = %req.uri().path(), "inbound tool request");
        let route = match (req.method(), req.uri().path()) {
            (&http::Method::POST, "/tools/version") => Route::Version,
            (&http::Method::POST, "/tools/readAttribute") => Route::ReadAttribute,
            _ => {
                return Box::pin(future::ok(
                    Response::builder()
                        .status(http::StatusCode::NOT_FOUND)
                        .body(Body::default())
                        .expect("not found response must be valid"),
                ))
            }
        };

        let gateway = self.gateway.clone();
        Box::pin(async move {
            let token = bearer_token(req.headers()).map(String::from);
            let bytes = req.into_body().collect().await?.to_bytes();

            let reply = match route {
                Route::Version => match parse::<VersionParams>(&bytes) {
                    Ok(params) => {
                        gateway
                            .version(token.as_deref(), &params.namespace, &params.pod_name)
                            .await
                    }
                    Err(reply) => reply,
                },
                Route::ReadAttribute => match parse::<ReadAttributeParams>(&bytes) {
                    Ok(params) => {
                        gateway
                            .read_attribute(
                                token.as_deref(),
                                &params.namespace,
                                &params.pod_name,
                                &params.mbean,
                                &params.attribute,
                            )
                            .await
                    }
                    Err(reply) => reply,
                },
            };

            json_response(&reply)
        })
    }
}

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(headers: &http::HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn parse<T: DeserializeOwned>(bytes: &bytes::Bytes) -> Result<T, ToolReply> {
    serde_json::from_slice(bytes).map_err(|error| {
        warn!(%error, "failed to parse tool parameters");
        ToolReply::error(format!("Invalid tool parameters: {error}"))
    })
}

fn json_response(reply: &ToolReply) -> Result<Response<Body>, Error> {
    let bytes = serde_json::to_vec(reply)?;
    Ok(Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("tool response must be valid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::http::header::{HeaderValue, AUTHORIZATION};

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        let mut headers = http::HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer your-mock-bearer-token"),
        );
        assert_eq!(bearer_token(&headers), Some("your-mock-bearer-token"));
    }

    #[test]
    fn version_params_are_camel_case() {
        let params: VersionParams = serde_json::from_str(
            r#"{"namespace": "hawtio-dev", "podName": "hawtio-example-999"}"#,
        )
        .unwrap();
        assert_eq!(params.namespace, "hawtio-dev");
        assert_eq!(params.pod_name, "hawtio-example-999");
    }

    #[test]
    fn read_attribute_params_are_camel_case() {
        let params: ReadAttributeParams = serde_json::from_str(
            r#"{
                "namespace": "hawtio-dev",
                "podName": "hawtio-example-999",
                "mbean": "org.apache.camel:context=MyCamel,type=context,name=\"MyCamel\"",
                "attribute": "CamelId"
            }"#,
        )
        .unwrap();
        assert_eq!(params.attribute, "CamelId");
    }

    #[test]
    fn malformed_parameters_become_an_error_reply() {
        let bytes = bytes::Bytes::from_static(b"{\"namespace\": 42}");
        let reply = parse::<VersionParams>(&bytes).unwrap_err();
        assert!(reply.is_error);
        assert!(reply
            .message()
            .unwrap()
            .starts_with("Invalid tool parameters:"));
    }
}
