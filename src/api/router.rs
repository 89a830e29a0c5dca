use axum::{middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state
///
/// `metrics` mounts the Prometheus endpoint at `metrics_path` when present.
pub fn create_router(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .nest("/v1", v1::create_v1_router())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state);

    let router = match metrics {
        Some(metrics) => router.merge(create_metrics_router(metrics, metrics_path)),
        None => router,
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
