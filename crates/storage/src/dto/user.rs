use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Achievement, PortfolioItem, Role, User, UserStatus};

/// Sign-up payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterUserRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    #[validate(email(message = "Email is not valid"))]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,

    /// ATHLETE (default) or ORGANIZER
    pub role: Option<Role>,

    #[validate(length(max = 255))]
    pub region: Option<String>,

    #[validate(length(max = 255))]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(equal = 6, message = "Code must have 6 digits"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Public view of a user, never carries credentials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub region: Option<String>,
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub position: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            region: user.region,
            organization: user.organization,
            phone: user.phone,
            image: user.image,
            bio: user.bio,
            position: user.position,
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub registrations_count: i64,
    pub teams_count: i64,
    pub achievements_count: i64,
}

/// Self-service profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(max = 255))]
    pub region: Option<String>,

    #[validate(length(max = 255))]
    pub organization: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    #[validate(url, length(max = 500))]
    pub image: Option<String>,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,

    #[validate(length(max = 255))]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdminCreateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    pub role: Role,

    #[validate(length(max = 255))]
    pub region: Option<String>,

    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminCreateUserResponse {
    pub user: UserResponse,
    /// Shown once so the administrator can hand it over
    pub temporary_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub role: Option<Role>,

    #[validate(length(max = 255))]
    pub region: Option<String>,

    pub status: Option<UserStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    /// Matches name or email
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePortfolioItemRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1, max = 5000))]
    pub description: String,

    pub date: NaiveDate,

    #[validate(url)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PortfolioItemResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PortfolioItem> for PortfolioItemResponse {
    fn from(item: PortfolioItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            date: item.date,
            link: item.link,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAchievementRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(range(min = 1))]
    pub place: i32,

    #[validate(range(min = 0))]
    pub points: i32,

    pub date: NaiveDate,

    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AchievementResponse {
    pub id: String,
    pub title: String,
    pub place: i32,
    pub points: i32,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Achievement> for AchievementResponse {
    fn from(a: Achievement) -> Self {
        Self {
            id: a.id,
            title: a.title,
            place: a.place,
            points: a.points,
            date: a.date,
            description: a.description,
            created_at: a.created_at,
        }
    }
}
