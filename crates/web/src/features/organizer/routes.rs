use axum::{Router, middleware, routing::get};

use super::handlers::{competitions, registrations, stats};
use crate::middleware::auth::require_session;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/competitions", get(competitions))
        .route("/registrations", get(registrations))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
