use crate::{cache::MBeanIndexCache, registry::NewClient, tls::ProxyTls};
use jolokia_gateway_core::{Bridge, ConstructionError, EndpointTarget, UpstreamError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Settings shared by every client the factory constructs.
#[derive(Clone, Debug)]
pub struct ClientParams {
    pub tls: ProxyTls,
    pub request_timeout: Duration,
    pub mbean_index_ttl: Duration,
}

/// A bridge-protocol client bound to one endpoint and one credential.
///
/// Every operation is one POST of a typed JSON request to the endpoint URL,
/// with the caller's bearer token attached to each request.
pub struct JolokiaClient {
    url: String,
    http: reqwest::Client,
    mbean_index: Mutex<MBeanIndexCache>,
}

/// Builds `JolokiaClient`s from shared TLS material and timing parameters.
#[derive(Clone, Debug)]
pub struct JolokiaFactory {
    params: ClientParams,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum BridgeRequest<'a> {
    Version,
    List {
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<&'a str>,
    },
    Read {
        mbean: &'a str,
        attribute: &'a str,
    },
    Write {
        mbean: &'a str,
        attribute: &'a str,
        value: &'a Value,
    },
    Exec {
        mbean: &'a str,
        operation: &'a str,
        arguments: &'a [Value],
    },
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    status: u16,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

// === impl JolokiaClient ===

impl JolokiaClient {
    pub fn connect(
        target: &EndpointTarget,
        token: &str,
        params: &ClientParams,
    ) -> Result<Self, ConstructionError> {
        debug!(%target, "creating jolokia client");

        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ConstructionError::Credential)?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        // A default header, so the credential rides on every request.
        headers.insert(AUTHORIZATION, bearer);

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(params.tls.identity()?)
            .default_headers(headers)
            .timeout(params.request_timeout);
        if params.tls.trust_upstream_certificates() {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|error| ConstructionError::Http(error.to_string()))?;

        Ok(Self {
            url: target.url(),
            http,
            mbean_index: Mutex::new(MBeanIndexCache::new(params.mbean_index_ttl)),
        })
    }

    async fn execute(&self, request: &BridgeRequest<'_>) -> Result<Option<Value>, UpstreamError> {
        trace!(url = %self.url, "issuing bridge request");
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|error| UpstreamError::Transport {
                url: self.url.clone(),
                detail: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Http {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<BridgeResponse>()
            .await
            .map_err(|error| UpstreamError::Decode(error.to_string()))?;
        interpret(body)
    }

    async fn list_inner(&self, path: Option<&str>) -> Result<Value, UpstreamError> {
        let value = self.execute(&BridgeRequest::List { path }).await?;
        Ok(value.unwrap_or_else(|| Value::Object(Default::default())))
    }

    /// The `attr` section of an MBean's list entry.
    pub async fn list_attributes(&self, mbean: &str) -> Result<Value, UpstreamError> {
        self.mbean_section(mbean, "attr").await
    }

    /// The `op` section of an MBean's list entry.
    pub async fn list_operations(&self, mbean: &str) -> Result<Value, UpstreamError> {
        self.mbean_section(mbean, "op").await
    }

    async fn mbean_section(&self, mbean: &str, key: &str) -> Result<Value, UpstreamError> {
        let info = self.list_inner(Some(&list_path(mbean))).await?;
        Ok(section(&info, key))
    }
}

#[async_trait::async_trait]
impl Bridge for JolokiaClient {
    async fn version(&self) -> Result<Option<Value>, UpstreamError> {
        self.execute(&BridgeRequest::Version).await
    }

    async fn list(&self, path: Option<&str>) -> Result<Value, UpstreamError> {
        self.list_inner(path).await
    }

    async fn read(&self, mbean: &str, attribute: &str) -> Result<Option<Value>, UpstreamError> {
        self.execute(&BridgeRequest::Read { mbean, attribute }).await
    }

    async fn write(
        &self,
        mbean: &str,
        attribute: &str,
        value: Value,
    ) -> Result<Option<Value>, UpstreamError> {
        self.execute(&BridgeRequest::Write {
            mbean,
            attribute,
            value: &value,
        })
        .await
    }

    async fn exec(
        &self,
        mbean: &str,
        operation: &str,
        arguments: Vec<Value>,
    ) -> Result<Option<Value>, UpstreamError> {
        self.execute(&BridgeRequest::Exec {
            mbean,
            operation,
            arguments: &arguments,
        })
        .await
    }

    async fn list_mbeans(&self) -> Result<Vec<String>, UpstreamError> {
        // The lock is held across the refetch so concurrent refreshes
        // collapse into one.
        let mut cache = self.mbean_index.lock().await;
        if let Some(names) = cache.get() {
            trace!("serving mbean names from cache");
            return Ok(names);
        }

        let tree = self.list_inner(None).await?;
        let names = flatten_domains(&tree)?;
        cache.put(names.clone());
        Ok(names)
    }
}

// === impl JolokiaFactory ===

impl JolokiaFactory {
    pub fn new(params: ClientParams) -> Self {
        Self { params }
    }
}

#[async_trait::async_trait]
impl NewClient for JolokiaFactory {
    type Client = JolokiaClient;

    async fn new_client(
        &self,
        target: &EndpointTarget,
        token: &str,
    ) -> Result<JolokiaClient, ConstructionError> {
        JolokiaClient::connect(target, token, &self.params)
    }
}

/// Maps a decoded bridge response to its value, distinguishing a
/// valid-but-empty response from a bridge failure.
fn interpret(body: BridgeResponse) -> Result<Option<Value>, UpstreamError> {
    if body.status != 200 {
        return Err(UpstreamError::Bridge {
            status: body.status,
            error: body
                .error
                .unwrap_or_else(|| "unspecified bridge error".to_string()),
        });
    }
    Ok(body.value.filter(|value| !value.is_null()))
}

/// Flattens the namespace tree into `domain:properties` names.
fn flatten_domains(tree: &Value) -> Result<Vec<String>, UpstreamError> {
    let domains = tree
        .as_object()
        .ok_or_else(|| UpstreamError::Decode("mbean namespace tree is not an object".to_string()))?;

    let mut names = Vec::new();
    for (domain, beans) in domains {
        let beans = beans.as_object().ok_or_else(|| {
            UpstreamError::Decode(format!("domain {domain} is not an object"))
        })?;
        for properties in beans.keys() {
            names.push(format!("{domain}:{properties}"));
        }
    }
    Ok(names)
}

/// Escapes an MBean name into a list path: the separator characters are
/// `!`-escaped, then the first `:` splits domain from properties.
fn list_path(mbean: &str) -> String {
    let escaped = mbean.replace('!', "!!").replace('/', "!/");
    match escaped.split_once(':') {
        Some((domain, properties)) => format!("{domain}/{properties}"),
        None => escaped,
    }
}

fn section(info: &Value, key: &str) -> Value {
    info.get(key)
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn version_request_serializes_to_protocol_shape() {
        let request = serde_json::to_value(BridgeRequest::Version).unwrap();
        assert_eq!(request, json!({"type": "version"}));
    }

    #[test]
    fn list_request_omits_absent_path() {
        let request = serde_json::to_value(BridgeRequest::List { path: None }).unwrap();
        assert_eq!(request, json!({"type": "list"}));

        let request =
            serde_json::to_value(BridgeRequest::List { path: Some("java.lang/type=Memory") })
                .unwrap();
        assert_eq!(
            request,
            json!({"type": "list", "path": "java.lang/type=Memory"})
        );
    }

    #[test]
    fn read_request_carries_mbean_and_attribute() {
        let request = serde_json::to_value(BridgeRequest::Read {
            mbean: "org.apache.camel:context=MyCamel,type=context,name=\"MyCamel\"",
            attribute: "CamelId",
        })
        .unwrap();
        assert_eq!(
            request,
            json!({
                "type": "read",
                "mbean": "org.apache.camel:context=MyCamel,type=context,name=\"MyCamel\"",
                "attribute": "CamelId",
            })
        );
    }

    #[test]
    fn write_request_carries_the_value() {
        let value = json!(42);
        let request = serde_json::to_value(BridgeRequest::Write {
            mbean: "java.lang:type=Memory",
            attribute: "Verbose",
            value: &value,
        })
        .unwrap();
        assert_eq!(
            request,
            json!({
                "type": "write",
                "mbean": "java.lang:type=Memory",
                "attribute": "Verbose",
                "value": 42,
            })
        );
    }

    #[test]
    fn exec_request_carries_arguments() {
        let arguments = vec![json!(5), json!("ctx")];
        let request = serde_json::to_value(BridgeRequest::Exec {
            mbean: "java.lang:type=Memory",
            operation: "gc",
            arguments: &arguments,
        })
        .unwrap();
        assert_eq!(
            request,
            json!({
                "type": "exec",
                "mbean": "java.lang:type=Memory",
                "operation": "gc",
                "arguments": [5, "ctx"],
            })
        );
    }

    #[test]
    fn successful_response_yields_value() {
        let body: BridgeResponse =
            serde_json::from_value(json!({"status": 200, "value": {"agent": "2.1.0"}})).unwrap();
        assert_eq!(interpret(body).unwrap(), Some(json!({"agent": "2.1.0"})));
    }

    #[test]
    fn missing_value_is_empty_not_an_error() {
        let body: BridgeResponse = serde_json::from_value(json!({"status": 200})).unwrap();
        assert_eq!(interpret(body).unwrap(), None);
    }

    #[test]
    fn null_value_is_empty_not_an_error() {
        let body: BridgeResponse =
            serde_json::from_value(json!({"status": 200, "value": null})).unwrap();
        assert_eq!(interpret(body).unwrap(), None);
    }

    #[test]
    fn bridge_failure_carries_upstream_detail() {
        let body: BridgeResponse = serde_json::from_value(json!({
            "status": 404,
            "error": "javax.management.InstanceNotFoundException: no.such:type=Bean",
        }))
        .unwrap();
        assert_eq!(
            interpret(body),
            Err(UpstreamError::Bridge {
                status: 404,
                error: "javax.management.InstanceNotFoundException: no.such:type=Bean".to_string(),
            })
        );
    }

    #[test]
    fn flattens_domains_to_qualified_names() {
        let tree = json!({
            "java.lang": {
                "type=Memory": {},
                "type=Threading": {},
            },
            "org.apache.camel": {
                "context=MyCamel,type=context,name=\"MyCamel\"": {},
            },
        });

        let mut names = flatten_domains(&tree).unwrap();
        names.sort();
        assert_eq!(
            names,
            vec![
                "java.lang:type=Memory".to_string(),
                "java.lang:type=Threading".to_string(),
                "org.apache.camel:context=MyCamel,type=context,name=\"MyCamel\"".to_string(),
            ]
        );
    }

    #[test]
    fn malformed_tree_is_a_decode_error() {
        assert!(matches!(
            flatten_domains(&json!([])),
            Err(UpstreamError::Decode(_))
        ));
    }

    #[test]
    fn list_path_splits_domain_and_escapes_separators() {
        assert_eq!(list_path("java.lang:type=Memory"), "java.lang/type=Memory");
        assert_eq!(
            list_path("my.domain:path=a/b,flag=x!y"),
            "my.domain/path=a!/b,flag=x!!y"
        );
    }

    #[test]
    fn section_defaults_to_empty_object() {
        let info = json!({"attr": {"HeapMemoryUsage": {"type": "CompositeData"}}});
        assert_eq!(
            section(&info, "attr"),
            json!({"HeapMemoryUsage": {"type": "CompositeData"}})
        );
        assert_eq!(section(&info, "op"), json!({}));
    }
}
