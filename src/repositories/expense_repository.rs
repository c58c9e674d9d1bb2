use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::expense::{Expense, NewExpense};
use crate::repositories::RepositoryError;

/// Trait defining expense repository operations
///
/// Every lookup and mutation is keyed by the owning user as well as the id, so
/// a row belonging to someone else behaves exactly like a missing one.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Create a new expense
    async fn create(&self, expense: NewExpense) -> Result<Expense, RepositoryError>;

    /// Find one of the user's expenses by ID
    async fn find_for_user(&self, id: i64, user_id: i64)
    -> Result<Option<Expense>, RepositoryError>;

    /// Find all expenses of a user, in id order
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Expense>, RepositoryError>;

    /// Replace every mutable column of an existing expense
    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Delete one of the user's expenses
    async fn delete(&self, id: i64, user_id: i64) -> Result<(), RepositoryError>;

    /// Sum the user's amounts, optionally for a single category; zero when empty
    async fn sum(&self, user_id: i64, category_id: Option<i64>)
    -> Result<Decimal, RepositoryError>;
}

/// PostgreSQL implementation of ExpenseRepository
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn create(&self, expense: NewExpense) -> Result<Expense, RepositoryError> {
        let created = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (name, user_id, category_id, amount, date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, user_id, category_id, amount, date
            "#,
        )
        .bind(&expense.name)
        .bind(expense.user_id)
        .bind(expense.category_id)
        .bind(expense.amount)
        .bind(expense.date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_for_user(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Expense>, RepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, name, user_id, category_id, amount, date
            FROM expenses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, name, user_id, category_id, amount, date
            FROM expenses
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let updated = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses
            SET name = $3,
                category_id = $4,
                amount = $5,
                date = $6
            WHERE id = $1 AND user_id = $2
            RETURNING id, name, user_id, category_id, amount, date
            "#,
        )
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(&expense.name)
        .bind(expense.category_id)
        .bind(expense.amount)
        .bind(expense.date)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM expenses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn sum(
        &self,
        user_id: i64,
        category_id: Option<i64>,
    ) -> Result<Decimal, RepositoryError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM expenses
            WHERE user_id = $1
                AND ($2::BIGINT IS NULL OR category_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
