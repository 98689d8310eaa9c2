//! NourishNet API
//!
//! HTTP surface over the subscription and delivery engines.
//!
//! ## REST Endpoints
//!
//! - `GET /api/v1/plans` - Plan catalog
//! - `GET /api/v1/subscriptions` - List caller's subscriptions
//! - `GET /api/v1/subscriptions/active` - Caller's active subscription
//! - `POST /api/v1/subscriptions` - Purchase a plan
//! - `GET|PATCH /api/v1/subscriptions/{id}` - Read or update a subscription
//! - `POST /api/v1/subscriptions/{id}/pause|resume|cancel` - Status changes
//! - `POST /api/v1/deliveries` - Open a delivery for an order
//! - `GET /api/v1/deliveries` - List caller's deliveries (`?limit=`)
//! - `GET /api/v1/deliveries/active` - Caller's in-flight delivery
//! - `GET /api/v1/deliveries/{id}` - Track a delivery
//! - `GET /api/v1/deliveries/by-order/{order_id}` - Delivery for an order
//! - `POST /api/v1/deliveries/{id}/status` - Advance delivery status
//! - `PUT /api/v1/deliveries/{id}/tracking[/location|/route|/eta]` - Tracking
//! - `PUT /api/v1/deliveries/{id}/estimated-time` - Promised delivery time
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;

use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use nourish_db::Repositories;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("nourish_api=debug".parse()?)
                .add_directive("nourish_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting NourishNet API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        max_connections = config.pool.max_connections,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool and bring the schema up to date
    let pool = nourish_db::create_pool_with_options(&config.database_url, &config.pool).await?;
    nourish_db::run_migrations(&pool).await?;
    tracing::info!("Database pool created, migrations applied");

    let repos = Repositories::new(pool.clone());
    let state = AppState::new(repos, pool.clone(), config.clone());

    let app = build_router(state, metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api_v1 = Router::new()
        .route("/plans", get(handlers::list_plans))
        // Subscription routes
        .route(
            "/subscriptions",
            get(handlers::list_subscriptions).post(handlers::create_subscription),
        )
        .route(
            "/subscriptions/active",
            get(handlers::get_active_subscription),
        )
        .route(
            "/subscriptions/{id}",
            get(handlers::get_subscription).patch(handlers::update_subscription),
        )
        .route(
            "/subscriptions/{id}/pause",
            post(handlers::pause_subscription),
        )
        .route(
            "/subscriptions/{id}/resume",
            post(handlers::resume_subscription),
        )
        .route(
            "/subscriptions/{id}/cancel",
            post(handlers::cancel_subscription),
        )
        // Delivery routes
        .route(
            "/deliveries",
            get(handlers::list_deliveries).post(handlers::create_delivery),
        )
        .route("/deliveries/active", get(handlers::get_active_delivery))
        .route(
            "/deliveries/by-order/{order_id}",
            get(handlers::get_delivery_by_order),
        )
        .route("/deliveries/{id}", get(handlers::get_delivery))
        .route(
            "/deliveries/{id}/status",
            post(handlers::advance_delivery_status),
        )
        .route("/deliveries/{id}/tracking", put(handlers::replace_tracking))
        .route(
            "/deliveries/{id}/tracking/location",
            put(handlers::update_location),
        )
        .route(
            "/deliveries/{id}/tracking/route",
            put(handlers::update_route),
        )
        .route("/deliveries/{id}/tracking/eta", put(handlers::update_eta))
        .route(
            "/deliveries/{id}/estimated-time",
            put(handlers::set_estimated_time),
        );

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Innermost, closest to the handler
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most operations are a single indexed row read or write
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("nourish_operation_duration_seconds".to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    metrics::describe_counter!(
        "nourish_subscriptions_created_total",
        "Total subscriptions purchased by plan type"
    );
    metrics::describe_counter!(
        "nourish_subscriptions_cancelled_total",
        "Total subscriptions cancelled"
    );
    metrics::describe_counter!(
        "nourish_deliveries_created_total",
        "Total deliveries opened"
    );
    metrics::describe_counter!(
        "nourish_delivery_status_changes_total",
        "Total delivery status changes by target status"
    );
    metrics::describe_histogram!(
        "nourish_operation_duration_seconds",
        "Handler latency in seconds by operation and result"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
