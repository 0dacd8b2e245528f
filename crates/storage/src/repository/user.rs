use sqlx::{PgPool, Postgres, QueryBuilder};

use super::Tx;
use crate::dto::user::{AdminUpdateUserRequest, UpdateProfileRequest, UserFilter};
use crate::dto::common::PageParams;
use crate::error::{Result, StorageError};
use crate::models::{IdKind, Role, User, UserStatus, new_id};

/// Fields needed to insert a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub region: Option<String>,
    pub organization: Option<String>,
    pub email_verified: bool,
    pub verification_code: Option<String>,
}

/// Aggregate counts shown on a profile page
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ProfileCounts {
    pub registrations_count: i64,
    pub teams_count: i64,
    pub achievements_count: i64,
}

pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound("User"))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    pub async fn create(&self, new: &NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, role, status, region,
                organization, email_verified, verification_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new_id(IdKind::User))
        .bind(&new.name)
        .bind(new.email.to_lowercase())
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.status)
        .bind(&new.region)
        .bind(&new.organization)
        .bind(new.email_verified)
        .bind(&new.verification_code)
        .fetch_one(self.pool)
        .await
        .map_err(email_conflict)
    }

    /// Marks the email verified when `code` matches the stored one
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email_verified = TRUE, verification_code = NULL, updated_at = NOW()
            WHERE lower(email) = lower($1) AND verification_code = $2
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(code)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StorageError::Validation("invalid verification code".to_string()))
    }

    pub async fn update_profile(&self, id: &str, req: &UpdateProfileRequest) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                region = COALESCE($3, region),
                organization = COALESCE($4, organization),
                phone = COALESCE($5, phone),
                image = COALESCE($6, image),
                bio = COALESCE($7, bio),
                position = COALESCE($8, position),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.region)
        .bind(&req.organization)
        .bind(&req.phone)
        .bind(&req.image)
        .bind(&req.bio)
        .bind(&req.position)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("User"))
    }

    pub async fn admin_update(&self, id: &str, req: &AdminUpdateUserRequest) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE(lower($3), email),
                role = COALESCE($4, role),
                region = COALESCE($5, region),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.email)
        .bind(req.role)
        .bind(&req.region)
        .bind(req.status)
        .fetch_optional(self.pool)
        .await
        .map_err(email_conflict)?
        .ok_or(StorageError::NotFound("User"))
    }

    pub async fn list(&self, filter: &UserFilter, page: PageParams) -> Result<(Vec<User>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_user_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE TRUE");
        push_user_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let users = query.build_query_as::<User>().fetch_all(self.pool).await?;
        Ok((users, total))
    }

    pub async fn profile_counts(&self, id: &str) -> Result<ProfileCounts> {
        let counts = sqlx::query_as::<_, ProfileCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM registrations
                  WHERE user_id = $1 AND status <> 'CANCELLED') AS registrations_count,
                (SELECT COUNT(*) FROM team_members WHERE user_id = $1) AS teams_count,
                (SELECT COUNT(*) FROM achievements WHERE user_id = $1) AS achievements_count
            "#,
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }

    /// Deletes the user and everything owned by them.
    ///
    /// Registrations disappear through the cascade, so the slots they held
    /// are released first, in the same transaction. Competitions are locked
    /// before the user row, matching the order admission takes them in.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        super::competition::lock_for_participant(&mut tx, id).await?;
        lock(&mut tx, id).await?;
        super::competition::release_participant_slots(&mut tx, id).await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Locks the user row; registrations referencing it wait until the
/// transaction ends
pub async fn lock(tx: &mut Tx<'_>, id: &str) -> Result<()> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .map(|_| ())
        .ok_or(StorageError::NotFound("User"))
}

/// Fails with `NotFound` when the user does not exist
pub async fn ensure_exists(tx: &mut Tx<'_>, id: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(StorageError::NotFound("User"))
    }
}

fn push_user_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        query.push(" AND role = ").push_bind(role);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn email_conflict(e: sqlx::Error) -> StorageError {
    let err = StorageError::from(e);
    if err.is_unique_violation() {
        StorageError::Conflict("email is already in use".to_string())
    } else {
        err
    }
}
