//! Tests for the application bootstrap, covering metrics initialisation
//! and readiness signalling.

#[cfg(feature = "metrics")]
use super::{PrometheusMetricsBuilder, initialize_metrics};
use super::{HealthState, ServerConfig, create_server};
use actix_web::web;
use rstest::{fixture, rstest};
use std::net::SocketAddr;
use std::sync::Arc;
use storefront::inbound::http::state::{HttpState, HttpStatePorts};
use storefront::outbound::memory::{MemoryAccountRepository, MemoryItemRepository};
use storefront::outbound::security::{Argon2PasswordHasher, JwtCredentialIssuer};

#[fixture]
fn health_state() -> web::Data<HealthState> {
    web::Data::new(HealthState::new())
}

fn http_state() -> HttpState {
    HttpState::from(HttpStatePorts {
        items: Arc::new(MemoryItemRepository::new()),
        accounts: Arc::new(MemoryAccountRepository::new()),
        issuer: Arc::new(JwtCredentialIssuer::new(b"bootstrap-test-secret")),
        hasher: Arc::new(Argon2PasswordHasher::new()),
    })
}

#[fixture]
fn server_config() -> ServerConfig {
    let bind_addr: SocketAddr = "127.0.0.1:0".parse().expect("loopback address");
    ServerConfig::new(bind_addr, http_state())
}

#[cfg(feature = "metrics")]
#[test]
fn initialize_metrics_returns_none_on_error() {
    let metrics = initialize_metrics(|| -> Result<_, &str> { Err("boom") });
    assert!(metrics.is_none(), "expected metrics to be absent on error");
}

#[cfg(feature = "metrics")]
#[test]
fn initialize_metrics_returns_metrics_on_success() {
    let metrics = initialize_metrics(|| {
        PrometheusMetricsBuilder::new("test")
            .endpoint("/metrics")
            .build()
    });

    assert!(
        metrics.is_some(),
        "expected metrics to be present on success"
    );
}

#[cfg(feature = "metrics")]
#[fixture]
fn prometheus_metrics() -> actix_web_prom::PrometheusMetrics {
    PrometheusMetricsBuilder::new("test")
        .endpoint("/metrics")
        .build()
        .expect("metrics should build for tests")
}

#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready(
    health_state: web::Data<HealthState>,
    server_config: ServerConfig,
) {
    assert!(!health_state.is_ready(), "state should start unready");
    assert_eq!(server_config.bind_addr().port(), 0);

    let _server =
        create_server(health_state.clone(), server_config).expect("server should build");

    assert!(
        health_state.is_ready(),
        "server creation should mark readiness"
    );
}

#[cfg(feature = "metrics")]
#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready_with_metrics(
    health_state: web::Data<HealthState>,
    server_config: ServerConfig,
    prometheus_metrics: actix_web_prom::PrometheusMetrics,
) {
    assert!(!health_state.is_ready(), "state should start unready");

    let _server = create_server(
        health_state.clone(),
        server_config.with_metrics(Some(prometheus_metrics)),
    )
    .expect("server should build with metrics");

    assert!(
        health_state.is_ready(),
        "server creation should mark readiness"
    );
}

#[rstest]
#[actix_rt::test]
async fn create_server_reports_bind_failures(health_state: web::Data<HealthState>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("reserve a port");
    let taken = listener.local_addr().expect("local address");
    let config = ServerConfig::new(taken, http_state());

    let result = create_server(health_state.clone(), config);

    assert!(result.is_err(), "binding an occupied port should fail");
    assert!(!health_state.is_ready(), "failed startup must stay unready");
}
