use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use super::handlers::{
    add_member, create_team, disband_team, get_team, invite, list_invitations, list_teams,
    remove_member, request_to_join, update_status,
};
use crate::middleware::auth::require_session;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_team))
        .route("/:id", delete(disband_team))
        .route("/:id/members", post(add_member))
        .route("/:id/members/:user_id", delete(remove_member))
        .route("/:id/status", put(update_status))
        .route("/:id/invitations", get(list_invitations).post(invite))
        .route("/:id/requests", post(request_to_join))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/", get(list_teams))
        .route("/:id", get(get_team))
        .merge(protected)
}
