use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::category::{Category, NewCategory, SHARED_OWNER_ID};
use crate::repositories::RepositoryError;

/// Trait defining category repository operations
///
/// "Visible" always means shared (`owner_id = 0`) or owned by the given user.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: NewCategory) -> Result<Category, RepositoryError>;

    /// Find all categories visible to a user, in id order
    async fn find_visible(&self, user_id: i64) -> Result<Vec<Category>, RepositoryError>;

    /// Find a category by ID, only if it is visible to the user
    async fn find_visible_by_id(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Find a category by exact name among those visible to the user
    async fn find_visible_by_name(
        &self,
        name: &str,
        user_id: i64,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Find a shared category by exact name
    async fn find_shared_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError>;
}

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_visible(&self, user_id: i64) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, owner_id
            FROM categories
            WHERE owner_id = $1 OR owner_id = $2
            ORDER BY id ASC
            "#,
        )
        .bind(SHARED_OWNER_ID)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn find_visible_by_id(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, owner_id
            FROM categories
            WHERE id = $1
                AND (owner_id = $2 OR owner_id = $3)
            "#,
        )
        .bind(id)
        .bind(SHARED_OWNER_ID)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_visible_by_name(
        &self,
        name: &str,
        user_id: i64,
    ) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, owner_id
            FROM categories
            WHERE name = $1
                AND (owner_id = $2 OR owner_id = $3)
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(SHARED_OWNER_ID)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_shared_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, owner_id
            FROM categories
            WHERE name = $1 AND owner_id = $2
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(SHARED_OWNER_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }
}
