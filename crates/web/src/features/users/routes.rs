use axum::{
    Router, middleware,
    routing::{delete, get},
};

use super::handlers::{
    add_portfolio_item, award_achievement, delete_portfolio_item, get_user, list_achievements,
    list_portfolio, update_user,
};
use crate::middleware::auth::require_session;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_user).put(update_user))
        .route("/:id/portfolio", get(list_portfolio).post(add_portfolio_item))
        .route("/:id/portfolio/:item_id", delete(delete_portfolio_item))
        .route(
            "/:id/achievements",
            get(list_achievements).post(award_achievement),
        )
        .route_layer(middleware::from_fn_with_state(state, require_session))
}
