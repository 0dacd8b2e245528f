use sqlx::PgPool;
use storage::{
    dto::user::{
        CreateAchievementRequest, CreatePortfolioItemRequest, UpdateProfileRequest,
        UserProfileResponse,
    },
    error::Result,
    models::{Achievement, Actor, PortfolioItem, User},
    repository::{AchievementRepository, PortfolioRepository, UserRepository},
    services::policy::{Action, Resource, authorize},
};

fn authorize_profile(actor: &Actor, user_id: &str) -> Result<()> {
    authorize(actor, Action::ManageProfile, Resource::User { user_id })
}

/// Profile with participation counts
pub async fn get_profile(pool: &PgPool, actor: &Actor, user_id: &str) -> Result<UserProfileResponse> {
    authorize_profile(actor, user_id)?;

    let repo = UserRepository::new(pool);
    let user = repo.find_by_id(user_id).await?;
    let counts = repo.profile_counts(user_id).await?;

    Ok(UserProfileResponse {
        user: user.into(),
        registrations_count: counts.registrations_count,
        teams_count: counts.teams_count,
        achievements_count: counts.achievements_count,
    })
}

pub async fn update_profile(
    pool: &PgPool,
    actor: &Actor,
    user_id: &str,
    request: &UpdateProfileRequest,
) -> Result<User> {
    authorize_profile(actor, user_id)?;

    let user = UserRepository::new(pool).update_profile(user_id, request).await?;
    tracing::info!(user_id, "Profile updated");
    Ok(user)
}

pub async fn list_portfolio(pool: &PgPool, actor: &Actor, user_id: &str) -> Result<Vec<PortfolioItem>> {
    authorize_profile(actor, user_id)?;
    PortfolioRepository::new(pool).list(user_id).await
}

pub async fn add_portfolio_item(
    pool: &PgPool,
    actor: &Actor,
    user_id: &str,
    request: &CreatePortfolioItemRequest,
) -> Result<PortfolioItem> {
    authorize_profile(actor, user_id)?;
    UserRepository::new(pool).find_by_id(user_id).await?;

    PortfolioRepository::new(pool).create(user_id, request).await
}

pub async fn delete_portfolio_item(
    pool: &PgPool,
    actor: &Actor,
    user_id: &str,
    item_id: &str,
) -> Result<()> {
    authorize_profile(actor, user_id)?;
    PortfolioRepository::new(pool).delete(user_id, item_id).await
}

pub async fn list_achievements(pool: &PgPool, user_id: &str) -> Result<Vec<Achievement>> {
    UserRepository::new(pool).find_by_id(user_id).await?;
    AchievementRepository::new(pool).list(user_id).await
}

/// Achievements are awarded by administrators only
pub async fn award_achievement(
    pool: &PgPool,
    actor: &Actor,
    user_id: &str,
    request: &CreateAchievementRequest,
) -> Result<Achievement> {
    authorize(actor, Action::AdministerUsers, Resource::Platform)?;

    let achievement = AchievementRepository::new(pool).create(user_id, request).await?;
    tracing::info!(user_id, achievement_id = %achievement.id, "Achievement awarded");
    Ok(achievement)
}
