use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    cancel_registration, check_registration, create_registration, delete_registration,
    get_registration, list_registrations, update_status,
};
use crate::middleware::auth::require_session;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_registrations).post(create_registration))
        .route("/check", get(check_registration))
        .route("/:id", get(get_registration).delete(delete_registration))
        .route("/:id/status", put(update_status))
        .route("/:id/cancel", post(cancel_registration))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
