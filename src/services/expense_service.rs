use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::models::expense::{CreateExpenseRequest, Expense, NewExpense, UpdateExpenseRequest};
use crate::repositories::{ExpenseRepository, RepositoryError};
use crate::services::category_service::{CategoryError, CategoryService};
use crate::validation::{non_blank, parse_amount, parse_date};

/// Expense service errors
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid date format, expected YYYY-MM-DD")]
    InvalidDate,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Expense not found")]
    ExpenseNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CategoryError> for ExpenseError {
    fn from(e: CategoryError) -> Self {
        match e {
            CategoryError::CategoryNotFound => ExpenseError::CategoryNotFound,
            other => ExpenseError::Internal(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ExpenseError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ExpenseError::ExpenseNotFound,
            RepositoryError::DatabaseError(msg) | RepositoryError::ConstraintViolation(msg) => {
                ExpenseError::Internal(msg)
            }
        }
    }
}

/// Trait defining expense ledger operations, always scoped to one user
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Get all of the user's expenses
    async fn list(&self, user_id: i64) -> Result<Vec<Expense>, ExpenseError>;

    /// Record a new expense against a visible category
    async fn create(
        &self,
        user_id: i64,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// Change the provided fields of one of the user's expenses
    async fn update(
        &self,
        user_id: i64,
        expense_id: i64,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    /// Delete one of the user's expenses
    async fn delete(&self, user_id: i64, expense_id: i64) -> Result<(), ExpenseError>;

    /// Total of the user's amounts, optionally restricted to one category
    async fn sum(&self, user_id: i64, category_id: Option<i64>) -> Result<Decimal, ExpenseError>;
}

/// Implementation of ExpenseService
pub struct ExpenseServiceImpl {
    expense_repository: Arc<dyn ExpenseRepository>,
    category_service: Arc<dyn CategoryService>,
}

impl ExpenseServiceImpl {
    pub fn new(
        expense_repository: Arc<dyn ExpenseRepository>,
        category_service: Arc<dyn CategoryService>,
    ) -> Self {
        Self {
            expense_repository,
            category_service,
        }
    }
}

#[async_trait]
impl ExpenseService for ExpenseServiceImpl {
    async fn list(&self, user_id: i64) -> Result<Vec<Expense>, ExpenseError> {
        Ok(self.expense_repository.find_by_user(user_id).await?)
    }

    async fn create(
        &self,
        user_id: i64,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let (Some(name), Some(category_id), Some(raw_amount)) = (
            non_blank(request.name.as_deref()),
            request.category_id,
            non_blank(request.amount.as_deref()),
        ) else {
            return Err(ExpenseError::MissingFields);
        };

        let amount = parse_amount(raw_amount).ok_or(ExpenseError::InvalidAmount)?;

        let date = match non_blank(request.date.as_deref()) {
            Some(raw) => parse_date(raw).ok_or(ExpenseError::InvalidDate)?,
            None => Utc::now().date_naive(),
        };

        self.category_service
            .resolve_for_user(category_id, user_id)
            .await?;

        let expense = self
            .expense_repository
            .create(NewExpense {
                name: name.to_string(),
                user_id,
                category_id,
                amount,
                date,
            })
            .await?;

        info!(user_id, expense_id = expense.id, %amount, "Expense recorded");
        Ok(expense)
    }

    async fn update(
        &self,
        user_id: i64,
        expense_id: i64,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let mut expense = self
            .expense_repository
            .find_for_user(expense_id, user_id)
            .await?
            .ok_or(ExpenseError::ExpenseNotFound)?;

        if let Some(name) = non_blank(request.name.as_deref()) {
            expense.name = name.to_string();
        }

        if let Some(raw) = non_blank(request.amount.as_deref()) {
            expense.amount = parse_amount(raw).ok_or(ExpenseError::InvalidAmount)?;
        }

        if let Some(raw) = non_blank(request.date.as_deref()) {
            expense.date = parse_date(raw).ok_or(ExpenseError::InvalidDate)?;
        }

        if let Some(category_id) = request.category_id {
            self.category_service
                .resolve_for_user(category_id, user_id)
                .await?;
            expense.category_id = category_id;
        }

        let updated = self.expense_repository.update(expense).await?;

        info!(user_id, expense_id, "Expense updated");
        Ok(updated)
    }

    async fn delete(&self, user_id: i64, expense_id: i64) -> Result<(), ExpenseError> {
        self.expense_repository.delete(expense_id, user_id).await?;

        info!(user_id, expense_id, "Expense deleted");
        Ok(())
    }

    async fn sum(&self, user_id: i64, category_id: Option<i64>) -> Result<Decimal, ExpenseError> {
        Ok(self.expense_repository.sum(user_id, category_id).await?)
    }
}
