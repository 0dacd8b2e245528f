use sqlx::PgPool;

use crate::dto::user::CreatePortfolioItemRequest;
use crate::error::{Result, StorageError};
use crate::models::{IdKind, PortfolioItem, new_id};

pub struct PortfolioRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PortfolioRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<PortfolioItem>> {
        let items = sqlx::query_as::<_, PortfolioItem>(
            "SELECT * FROM portfolio_items WHERE user_id = $1 ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    pub async fn create(
        &self,
        user_id: &str,
        req: &CreatePortfolioItemRequest,
    ) -> Result<PortfolioItem> {
        let item = sqlx::query_as::<_, PortfolioItem>(
            r#"
            INSERT INTO portfolio_items (id, user_id, title, description, date, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new_id(IdKind::PortfolioItem))
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.date)
        .bind(&req.link)
        .fetch_one(self.pool)
        .await?;

        Ok(item)
    }

    /// Deletes an item only when it belongs to `user_id`
    pub async fn delete(&self, user_id: &str, item_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM portfolio_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("Portfolio item"));
        }

        Ok(())
    }
}
