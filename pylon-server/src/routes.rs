use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::context::attach_request_context;
use crate::handlers;
use crate::state::AppState;

/// Build the relay's router with all middleware applied.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::home))
        .route("/inbox", post(handlers::inbox));

    // The stats surface is only mounted for dev deployments, matching
    // the debug-only behavior relay operators expect.
    if state.config.dev_mode {
        router = router.route("/stats", get(handlers::stats));
    }

    router
        .layer(axum::middleware::from_fn(attach_request_context))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
