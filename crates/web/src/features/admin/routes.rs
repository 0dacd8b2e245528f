use axum::{Router, middleware, routing::get};

use super::handlers::{create_user, delete_user, get_user, list_users, update_user};
use crate::middleware::auth::require_session;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
