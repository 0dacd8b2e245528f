use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    create_competition, delete_competition, get_competition, list_competitions,
    list_registrations, list_results, record_result, transition_competition, update_competition,
};
use crate::middleware::auth::require_session;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_competition))
        .route("/:id", put(update_competition).delete(delete_competition))
        .route("/:id/transition", post(transition_competition))
        .route("/:id/results", post(record_result))
        .route("/:id/registrations", get(list_registrations))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/", get(list_competitions))
        .route("/:id", get(get_competition))
        .route("/:id/results", get(list_results))
        .merge(protected)
}
