use std::sync::Arc;

use axum::extract::FromRef;
use storage::Database;
use storage::services::{LifecycleRules, TeamRules};

use crate::middleware::auth::SessionKeys;
use crate::notifications::Notifier;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionKeys,
    pub notifier: Arc<dyn Notifier>,
    pub team_rules: TeamRules,
    pub lifecycle_rules: LifecycleRules,
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
