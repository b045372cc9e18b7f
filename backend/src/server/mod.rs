//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::ServerSettings;
pub(crate) use state_builders::{bootstrap_admin, build_http_state};

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;

use actix_governor::Governor;
use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Condition;
use actix_web::{App, HttpServer, web};

use storefront::Trace;
use storefront::middleware::{CorsPolicy, PeerRateLimitConfig, RateLimit, security_headers};
#[cfg(debug_assertions)]
use storefront::doc::ApiDoc;
use storefront::inbound::http::api_scope;
use storefront::inbound::http::health::{HealthState, live, ready};
use storefront::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// CORS, headers, and the shared limiter state, built once per server.
#[derive(Clone)]
struct EdgeLayers {
    cors: CorsPolicy,
    limit_requests: bool,
    limiter: PeerRateLimitConfig,
}

impl EdgeLayers {
    fn new(cors: CorsPolicy, rate_limit: Option<RateLimit>) -> std::io::Result<Self> {
        let limiter = rate_limit
            .map(|limit| limit.config())
            .transpose()
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
        Ok(Self {
            cors,
            limit_requests: limiter.is_some(),
            limiter: limiter.unwrap_or_default(),
        })
    }
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    edge: &EdgeLayers,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let limiter = Condition::new(edge.limit_requests, Governor::new(&edge.limiter));
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(edge.cors.middleware())
        .wrap(security_headers())
        .wrap(Trace)
        .service(api_scope().wrap(limiter))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the listener is bound.
/// - `config`: pre-built [`ServerConfig`] carrying the handler state, the
///   bind address, the edge policies, and optional metrics middleware.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when the rate limit is invalid or binding the
/// socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        bind_addr,
        http_state,
        cors,
        rate_limit,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;
    let edge = EdgeLayers::new(cors, rate_limit)?;

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(server_health_state.clone(), http_state.clone(), &edge);

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
