// ABOUTME: API route definitions.
// ABOUTME: Image names in paths are percent-encoded by clients ("/" becomes %2F).

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;
use crate::runtime::{BinaryProbe, CommandRunner};

/// Build the API router with all routes.
pub fn build_router<R, P>(state: AppState<R, P>) -> Router
where
    R: CommandRunner + 'static,
    P: BinaryProbe + 'static,
{
    Router::new()
        .route("/health", get(handlers::health::<R, P>))
        .route("/api/images", get(handlers::list_images::<R, P>))
        .route("/api/images/pull", post(handlers::pull_image::<R, P>))
        .route("/api/images/push", post(handlers::push_image::<R, P>))
        .route("/api/images/tag", post(handlers::tag_image::<R, P>))
        .route("/api/images/save", post(handlers::save_image::<R, P>))
        .route("/api/images/load", post(handlers::load_image::<R, P>))
        .route(
            "/api/images/registry/health",
            get(handlers::registry_health::<R, P>),
        )
        .route(
            "/api/images/:name",
            get(handlers::get_image::<R, P>).delete(handlers::delete_image::<R, P>),
        )
        .route("/api/bulk/delete", post(handlers::bulk_delete::<R, P>))
        .route("/api/bulk/push", post(handlers::bulk_push::<R, P>))
        .route(
            "/api/registry/config",
            get(handlers::get_registry_config::<R, P>).put(handlers::put_registry_config::<R, P>),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
