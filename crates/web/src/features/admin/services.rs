use sqlx::PgPool;
use storage::{
    dto::common::PageParams,
    dto::user::{AdminCreateUserRequest, AdminUpdateUserRequest, UserFilter},
    error::Result,
    models::{Actor, User, UserStatus},
    repository::{NewUser, UserRepository},
    services::policy::{Action, Resource, authorize},
};

use crate::error::WebResult;
use crate::features::auth::services::{hash_password, temporary_password};
use crate::notifications::notify_best_effort;
use crate::state::AppState;

fn authorize_admin(actor: &Actor) -> Result<()> {
    authorize(actor, Action::AdministerUsers, Resource::Platform)
}

pub async fn list_users(
    pool: &PgPool,
    actor: &Actor,
    filter: &UserFilter,
    page: PageParams,
) -> Result<(Vec<User>, i64)> {
    authorize_admin(actor)?;
    page.validate()?;
    UserRepository::new(pool).list(filter, page).await
}

pub async fn get_user(pool: &PgPool, actor: &Actor, user_id: &str) -> Result<User> {
    authorize_admin(actor)?;
    UserRepository::new(pool).find_by_id(user_id).await
}

/// Creates an account with a temporary password, returned to the caller once
pub async fn create_user(
    state: &AppState,
    actor: &Actor,
    req: &AdminCreateUserRequest,
) -> WebResult<(User, String)> {
    authorize_admin(actor)?;

    let password = temporary_password();
    let user = UserRepository::new(state.db.pool())
        .create(&NewUser {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash: hash_password(password.clone()).await?,
            role: req.role,
            status: req.status.unwrap_or(UserStatus::Active),
            region: req.region.clone(),
            organization: None,
            email_verified: true,
            verification_code: None,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, created_by = %actor.user_id, "User created by administrator");

    notify_best_effort(
        state.notifier.as_ref(),
        &user.email,
        "Your account was created",
        &format!("Sign in with your email and the temporary password {password}"),
    )
    .await;

    Ok((user, password))
}

pub async fn update_user(
    pool: &PgPool,
    actor: &Actor,
    user_id: &str,
    req: &AdminUpdateUserRequest,
) -> Result<User> {
    authorize_admin(actor)?;

    let user = UserRepository::new(pool).admin_update(user_id, req).await?;
    tracing::info!(user_id, role = %user.role, status = ?user.status, "User updated by administrator");
    Ok(user)
}

pub async fn delete_user(pool: &PgPool, actor: &Actor, user_id: &str) -> Result<()> {
    authorize_admin(actor)?;

    UserRepository::new(pool).delete(user_id).await?;
    tracing::info!(user_id, deleted_by = %actor.user_id, "User deleted");
    Ok(())
}
