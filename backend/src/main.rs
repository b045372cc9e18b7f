//! Storefront entry-point: loads settings, wires adapters, and serves the REST API.

mod server;

#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, ServerSettings, bootstrap_admin, build_http_state, create_server};
use storefront::inbound::http::health::HealthState;

/// Build Prometheus middleware, logging and discarding failures so the
/// service still starts without metrics.
#[cfg(feature = "metrics")]
fn initialize_metrics<F, E>(make: F) -> Option<PrometheusMetrics>
where
    F: FnOnce() -> Result<PrometheusMetrics, E>,
    E: std::fmt::Display,
{
    match make() {
        Ok(metrics) => Some(metrics),
        Err(error) => {
            warn!(%error, "failed to initialise Prometheus metrics; continuing without them");
            None
        }
    }
}

#[cfg(feature = "metrics")]
fn prometheus_builder() -> PrometheusMetricsBuilder {
    PrometheusMetricsBuilder::new("storefront")
        .registry(prometheus::Registry::new())
        .endpoint("/metrics")
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    info!(?settings, "settings loaded");

    let bind_addr = settings.bind_addr()?;
    let cors = settings.cors_policy()?;
    let http_state = build_http_state(&settings).await?;
    if let Some(admin) = settings.admin_bootstrap() {
        bootstrap_admin(&http_state, &admin).await?;
    }

    let config = ServerConfig::new(bind_addr, http_state)
        .with_cors(cors)
        .with_rate_limit(settings.rate_limit());
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(initialize_metrics(|| prometheus_builder().build()));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "listening");
    let result = server.await;
    health_state.mark_unhealthy();
    result
}

#[cfg(test)]
mod tests;
