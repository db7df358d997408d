use crate::{
    controller, index,
    k8s::{self, labels::Selector, AuthConfig, Client, Resource},
    lease, status,
};
use anyhow::{bail, Result};
use clap::Parser;
use kube::runtime::watcher;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "authconfig-status-controller",
    about = "Keeps the readiness of AuthConfig resources in sync with the authorization cache"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "authconfig=info,warn",
        env = "AUTHCONFIG_STATUS_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Only AuthConfigs whose labels match this selector are managed. All
    /// others are reported as not ready.
    #[clap(long, env = "AUTH_CONFIG_LABEL_SELECTOR")]
    auth_config_label_selector: Option<Selector>,

    /// Delay before checking again on a managed AuthConfig that is not yet
    /// cached.
    #[clap(long, default_value = "1000")]
    status_requeue_ms: u64,

    /// Bound on each API request made while reconciling an AuthConfig.
    #[clap(long, default_value = "5000")]
    request_timeout_ms: u64,

    /// Only write statuses while this replica holds the status Lease.
    #[clap(long)]
    leader_elect: bool,

    #[clap(long, default_value = "authorino")]
    lease_namespace: String,

    /// The Deployment that owns the status Lease.
    #[clap(long, default_value = "authorino")]
    deployment_name: String,

    /// Restricts the controller to a single namespace. All namespaces are
    /// watched by default.
    #[clap(long)]
    watch_namespace: Option<String>,
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
            auth_config_label_selector: selector,
            status_requeue_ms,
            request_timeout_ms,
            leader_elect,
            lease_namespace,
            deployment_name,
            watch_namespace,
        } = self;

        // The host index stands in for the authorization cache: an AuthConfig
        // is ready once it serves at least one host.
        let host_index = index::Index::shared(selector.clone());

        let mut prom = <Registry>::default();
        let status_metrics =
            status::ControllerMetrics::register(prom.sub_registry_with_prefix("authconfig_status"));
        index::metrics::register(
            prom.sub_registry_with_prefix("authconfig_index"),
            host_index.clone(),
        );
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        if !api_resource_exists::<AuthConfig>(&runtime.client()).await {
            bail!("authconfigs.authorino.kuadrant.io resource kind not found");
        }

        let leadership = if leader_elect {
            let hostname = std::env::var("HOSTNAME")
                .map_err(|_| anyhow::anyhow!("leader election requires `HOSTNAME` to be set"))?;
            let claims =
                lease::init(&runtime, &lease_namespace, &deployment_name, &hostname).await?;
            Some(lease::Leadership::new(claims, hostname))
        } else {
            None
        };

        // Spawn the AuthConfig watch that feeds the host index.
        let configs = runtime.watch(
            auth_configs(runtime.client(), watch_namespace.as_deref()),
            watcher::Config::default(),
        );
        tokio::spawn(
            kubert::index::namespaced(host_index.clone(), configs)
                .instrument(info_span!("authconfigs")),
        );

        let reconciler = status::Reconciler::new(
            status::KubeStatusClient::new(runtime.client()),
            host_index,
            selector,
            status_metrics,
        )
        .with_requeue_after(Duration::from_millis(status_requeue_ms))
        .with_request_timeout(Duration::from_millis(request_timeout_ms));

        let mut status_controller = tokio::spawn(
            controller::run(
                auth_configs(runtime.client(), watch_namespace.as_deref()),
                Arc::new(controller::Context::new(reconciler)),
                leadership,
                runtime.shutdown_handle(),
            )
            .instrument(info_span!("status_controller")),
        );

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting. Losing the status Lease stops the controller early, which
        // terminates the process so that it may be restarted as a follower.
        tokio::select! {
            res = runtime.run() => {
                if res.is_err() {
                    bail!("Aborted");
                }
            }
            res = &mut status_controller => res??,
        }

        Ok(())
    }
}

fn auth_configs(client: Client, namespace: Option<&str>) -> k8s::Api<AuthConfig> {
    match namespace {
        Some(ns) => k8s::Api::namespaced(client, ns),
        None => k8s::Api::all(client),
    }
}

async fn api_resource_exists<T>(client: &Client) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    client
        .list_api_group_resources(&T::api_version(&dt))
        .await
        .ok()
        .iter()
        .flat_map(|r| r.resources.iter())
        .any(|r| r.kind == T::kind(&dt))
}
