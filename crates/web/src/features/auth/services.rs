use rand::{Rng, distributions::Alphanumeric};
use storage::{
    dto::user::{LoginRequest, RegisterUserRequest, VerifyEmailRequest},
    error::StorageError,
    models::{Role, User, UserStatus},
    repository::{NewUser, UserRepository},
};

use crate::error::{WebError, WebResult};
use crate::notifications::notify_best_effort;
use crate::state::AppState;

pub async fn hash_password(password: String) -> WebResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| WebError::InternalServerError(format!("Hashing task failed: {e}")))?
        .map_err(|e| WebError::InternalServerError(format!("Failed to hash password: {e}")))
}

async fn verify_password(password: String, hash: String) -> WebResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| WebError::InternalServerError(format!("Hashing task failed: {e}")))?
        .map_err(|e| WebError::InternalServerError(format!("Failed to verify password: {e}")))
}

/// Six digit code sent to confirm an email address
pub fn verification_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Random password handed out once when an administrator creates an account
pub fn temporary_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Role a self-registering user may claim
fn self_service_role(requested: Option<Role>) -> WebResult<Role> {
    match requested.unwrap_or(Role::Athlete) {
        Role::Admin => Err(StorageError::Forbidden(
            "the ADMIN role cannot be self-assigned".to_string(),
        )
        .into()),
        role => Ok(role),
    }
}

pub async fn register(state: &AppState, req: &RegisterUserRequest) -> WebResult<User> {
    let role = self_service_role(req.role)?;
    let code = verification_code();

    let user = UserRepository::new(state.db.pool())
        .create(&NewUser {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash: hash_password(req.password.clone()).await?,
            role,
            status: UserStatus::Active,
            region: req.region.clone(),
            organization: req.organization.clone(),
            email_verified: false,
            verification_code: Some(code.clone()),
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    notify_best_effort(
        state.notifier.as_ref(),
        &user.email,
        "Confirm your email",
        &format!("Your verification code is {code}"),
    )
    .await;

    Ok(user)
}

pub async fn verify_email(state: &AppState, req: &VerifyEmailRequest) -> WebResult<User> {
    let user = UserRepository::new(state.db.pool())
        .verify_email(&req.email, &req.code)
        .await?;

    tracing::info!(user_id = %user.id, "Email verified");
    Ok(user)
}

/// Checks credentials and issues a session token
pub async fn login(state: &AppState, req: &LoginRequest) -> WebResult<(String, User)> {
    let invalid = || WebError::Unauthorized("Invalid email or password".to_string());

    let user = UserRepository::new(state.db.pool())
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(req.password.clone(), user.password_hash.clone()).await? {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }

    if user.is_blocked() {
        return Err(StorageError::Forbidden("account is blocked".to_string()).into());
    }

    let token = state.sessions.issue(&user.id, user.role)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok((token, user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_code_is_six_digits() {
        for _ in 0..100 {
            let code = verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_temporary_password_shape() {
        let password = temporary_password();
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, temporary_password());
    }

    #[test]
    fn test_admin_role_cannot_be_claimed() {
        assert_eq!(self_service_role(None).unwrap(), Role::Athlete);
        assert_eq!(self_service_role(Some(Role::Organizer)).unwrap(), Role::Organizer);
        assert!(self_service_role(Some(Role::Admin)).is_err());
    }

    #[tokio::test]
    async fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse".to_string()).await.unwrap();
        assert!(verify_password("correct horse".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }
}
