use anyhow::{Context, Result};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub team_max_size: i64,
    pub team_min_size: i64,
    pub allow_skip_moderation: bool,
    pub notify_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let session_secret =
            std::env::var("SESSION_SECRET").context("Cannot load SESSION_SECRET env variable")?;
        if session_secret.len() < 32 {
            anyhow::bail!("SESSION_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            session_secret,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 720)?,
            team_max_size: parse_or("TEAM_MAX_SIZE", 3)?,
            team_min_size: parse_or("TEAM_MIN_SIZE", 2)?,
            allow_skip_moderation: parse_or("ALLOW_SKIP_MODERATION", true)?,
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        })
    }
}

/// Reads an optional variable, falling back to `default` when unset
fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_defaults_when_unset() {
        let value: i64 = parse_or("SPORTS_TEST_SURELY_UNSET_VARIABLE", 3).unwrap();
        assert_eq!(value, 3);
    }
}
