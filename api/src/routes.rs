use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no authentication required)
    let public_routes = Router::new().route("/health", get(handlers::health::health_check));

    // Protected routes (HTTP Basic authentication required)
    let protected_routes = Router::new()
        .route("/api/schedules", post(handlers::schedules::create_schedule))
        .route("/api/schedules", get(handlers::schedules::list_schedules))
        .route(
            "/api/schedules/:id/repost-now",
            post(handlers::schedules::repost_now),
        )
        .route(
            "/api/schedules/:id/toggle",
            post(handlers::schedules::toggle_schedule),
        )
        .route(
            "/api/schedules/:id",
            delete(handlers::schedules::delete_schedule),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Metrics endpoint (no authentication for Prometheus scraping)
    let metrics_routes = Router::new().route("/metrics", get(handlers::metrics::metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(metrics_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
