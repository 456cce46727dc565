use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::auth::basic_auth_middleware;
use super::handlers::*;

pub const RECOVERY_PATH: &str = "/api/v2/dbaas/adapter/opensearch/users/restore-password";
pub const RECOVERY_STATE_PATH: &str = "/api/v2/dbaas/adapter/opensearch/users/restore-password/state";
pub const HEALTH_PATH: &str = "/health";

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        // credential sets are unbounded in size
        .route(
            RECOVERY_PATH,
            post(recover_users).layer(DefaultBodyLimit::disable()),
        )
        .route(RECOVERY_STATE_PATH, get(get_recovery_state))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            basic_auth_middleware,
        ));

    Router::new()
        .route(HEALTH_PATH, get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
