use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use storage::error::StorageError;
use storage::models::{Actor, Role, User};
use storage::repository::UserRepository;

use crate::error::WebError;
use crate::state::AppState;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material for HS256 session tokens
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, WebError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| WebError::InternalServerError(format!("Failed to sign session: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Actor, WebError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| WebError::Unauthorized(format!("Invalid session token: {e}")))?;

        Ok(Actor::new(data.claims.sub, data.claims.role))
    }
}

/// Actor for a stored account, using its current role.
///
/// Tokens outlive role changes and blocks, so the row is authoritative.
fn current_actor(user: &User) -> Result<Actor, WebError> {
    if user.is_blocked() {
        return Err(StorageError::Forbidden("account is blocked".to_string()).into());
    }

    Ok(Actor::new(user.id.clone(), user.role))
}

/// Resolves the bearer token into an [`Actor`] request extension
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| WebError::Unauthorized("Missing bearer token".to_string()))?;

    let claimed = match state.sessions.verify(token.trim()) {
        Ok(actor) => actor,
        Err(e) => {
            tracing::warn!("Rejected session token");
            return Err(e);
        }
    };

    let user = UserRepository::new(state.db.pool())
        .find_by_id(&claimed.user_id)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => {
                WebError::Unauthorized("Account no longer exists".to_string())
            }
            other => other.into(),
        })?;

    let actor = current_actor(&user)?;
    if actor.role != claimed.role {
        tracing::info!(
            user_id = %actor.user_id,
            token_role = %claimed.role,
            role = %actor.role,
            "Session role superseded"
        );
    }

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
