use crate::{gateway::Gateway, server::ToolService};
use anyhow::{bail, Result};
use clap::Parser;
use jolokia_gateway_client::{ClientParams, ClientRegistry, JolokiaFactory, ProxyTls};
use jolokia_gateway_k8s::{PodStore, TokenReviewValidator};
use prometheus_client::registry::Registry;
use std::{path::PathBuf, sync::Arc};
use tokio::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[clap(name = "jolokia-gateway", about = "Proxies Jolokia operations to cluster workloads")]
pub struct Args {
    #[clap(
        long,
        default_value = "jolokia_gateway=info,warn",
        env = "JOLOKIA_GATEWAY_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    #[clap(flatten)]
    server: kubert::ServerArgs,

    /// Client certificate presented to workload endpoints.
    #[clap(long, default_value = "/etc/tls/private/proxying/tls.crt")]
    proxy_tls_cert: PathBuf,

    /// Private key for the client certificate.
    #[clap(long, default_value = "/etc/tls/private/proxying/tls.key")]
    proxy_tls_key: PathBuf,

    /// Accept any certificate a workload endpoint presents.
    ///
    /// Workload certificates are usually self-signed or not chained to a
    /// cluster-known authority; mutual TLS still presents the proxy
    /// certificate to the target.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    trust_upstream_certificates: bool,

    /// Timeout for one bridge request, in milliseconds.
    #[clap(long, default_value = "10000")]
    request_timeout_ms: u64,

    /// Freshness window of the per-client MBean name cache, in seconds.
    #[clap(long, default_value = "60")]
    mbean_index_ttl_secs: u64,

    /// Maximum number of live bridge clients.
    #[clap(long, default_value = "64")]
    client_cache_capacity: usize,

    /// Idle time after which a cached bridge client is dropped, in seconds.
    #[clap(long, default_value = "600")]
    client_cache_idle_secs: u64,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            server,
            proxy_tls_cert,
            proxy_tls_key,
            trust_upstream_certificates,
            request_timeout_ms,
            mbean_index_ttl_secs,
            client_cache_capacity,
            client_cache_idle_secs,
        } = self;

        let mut prom = <Registry>::default();
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .with_optional_server(Some(server))
            .build()
            .await?;

        let tls = ProxyTls::new(proxy_tls_cert, proxy_tls_key, trust_upstream_certificates);
        let factory = JolokiaFactory::new(ClientParams {
            tls,
            request_timeout: Duration::from_millis(request_timeout_ms),
            mbean_index_ttl: Duration::from_secs(mbean_index_ttl_secs),
        });
        let registry = ClientRegistry::new(
            factory,
            client_cache_capacity,
            Duration::from_secs(client_cache_idle_secs),
        );

        let kube = runtime.client();
        let gateway = Arc::new(Gateway::new(
            TokenReviewValidator::new(kube.clone()),
            PodStore::new(kube),
            registry,
        ));

        let runtime = runtime.spawn_server(move || ToolService::new(gateway));

        info!("jolokia gateway running");

        // Block on the shutdown signal; wait for background tasks to finish
        // before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
