use std::sync::Arc;

use anyhow::Context;
use storage::Database;
use storage::services::{LifecycleRules, TeamRules};

mod app;
mod config;
mod error;
mod features;
mod middleware;
mod notifications;
mod state;

use config::Config;
use middleware::auth::SessionKeys;
use notifications::{LogNotifier, Notifier, WebhookNotifier};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting competitions API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::with_max_connections(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let team_rules = TeamRules::new(config.team_max_size, config.team_min_size)
        .context("Invalid TEAM_MAX_SIZE / TEAM_MIN_SIZE")?;
    let lifecycle_rules = LifecycleRules {
        allow_skip_moderation: config.allow_skip_moderation,
    };

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            tracing::info!("Notifications delivered to webhook");
            Arc::new(WebhookNotifier::new(url.as_str()).context("Failed to build notifier")?)
        }
        None => {
            tracing::info!("NOTIFY_WEBHOOK_URL not set, notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState {
        db,
        sessions: SessionKeys::new(&config.session_secret, config.session_ttl_hours),
        notifier,
        team_rules,
        lifecycle_rules,
    };

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    axum::serve(listener, app::router(state))
        .await
        .context("Server error")?;

    Ok(())
}
