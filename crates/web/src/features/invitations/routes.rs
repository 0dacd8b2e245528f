use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{list_incoming, respond};
use crate::middleware::auth::require_session;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_incoming))
        .route("/:id/respond", post(respond))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
