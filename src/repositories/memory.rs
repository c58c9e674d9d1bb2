//! In-memory repositories.
//!
//! Drop-in replacements for the PostgreSQL repositories, used by the test
//! suites and handy for running the API without a database. They apply the
//! same ownership filters and uniqueness rules as the SQL schema.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard};

use crate::models::category::{Category, NewCategory, SHARED_OWNER_ID};
use crate::models::expense::{Expense, NewExpense};
use crate::models::user::{NewUser, User};
use crate::repositories::{
    CategoryRepository, ExpenseRepository, RepositoryError, UserRepository,
};

/// Rows plus the next id to hand out, like a BIGSERIAL column
struct Table<T> {
    rows: Vec<T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn lock<T>(table: &Mutex<Table<T>>) -> Result<MutexGuard<'_, Table<T>>, RepositoryError> {
    table
        .lock()
        .map_err(|_| RepositoryError::DatabaseError("in-memory table poisoned".to_string()))
}

/// In-memory implementation of UserRepository
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Table<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut table = lock(&self.users)?;

        if table
            .rows
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(RepositoryError::ConstraintViolation(
                "Email or username already exists".to_string(),
            ));
        }

        let created = User {
            id: table.allocate_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let table = lock(&self.users)?;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let table = lock(&self.users)?;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let table = lock(&self.users)?;
        Ok(table
            .rows
            .iter()
            .find(|u| u.email == email || u.username == username)
            .cloned())
    }
}

/// In-memory implementation of CategoryRepository
#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: Mutex<Table<Category>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn create(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let mut table = lock(&self.categories)?;
        let created = Category {
            id: table.allocate_id(),
            name: category.name,
            description: category.description,
            owner_id: category.owner_id,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn find_visible(&self, user_id: i64) -> Result<Vec<Category>, RepositoryError> {
        let table = lock(&self.categories)?;
        Ok(table
            .rows
            .iter()
            .filter(|c| c.is_visible_to(user_id))
            .cloned()
            .collect())
    }

    async fn find_visible_by_id(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Category>, RepositoryError> {
        let table = lock(&self.categories)?;
        Ok(table
            .rows
            .iter()
            .find(|c| c.id == id && c.is_visible_to(user_id))
            .cloned())
    }

    async fn find_visible_by_name(
        &self,
        name: &str,
        user_id: i64,
    ) -> Result<Option<Category>, RepositoryError> {
        let table = lock(&self.categories)?;
        Ok(table
            .rows
            .iter()
            .find(|c| c.name == name && c.is_visible_to(user_id))
            .cloned())
    }

    async fn find_shared_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let table = lock(&self.categories)?;
        Ok(table
            .rows
            .iter()
            .find(|c| c.name == name && c.owner_id == SHARED_OWNER_ID)
            .cloned())
    }
}

/// In-memory implementation of ExpenseRepository
#[derive(Default)]
pub struct InMemoryExpenseRepository {
    expenses: Mutex<Table<Expense>>,
}

impl InMemoryExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryExpenseRepository {
    async fn create(&self, expense: NewExpense) -> Result<Expense, RepositoryError> {
        let mut table = lock(&self.expenses)?;
        let created = Expense {
            id: table.allocate_id(),
            name: expense.name,
            user_id: expense.user_id,
            category_id: expense.category_id,
            amount: expense.amount,
            date: expense.date,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn find_for_user(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Expense>, RepositoryError> {
        let table = lock(&self.expenses)?;
        Ok(table
            .rows
            .iter()
            .find(|e| e.id == id && e.user_id == user_id)
            .cloned())
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Expense>, RepositoryError> {
        let table = lock(&self.expenses)?;
        Ok(table
            .rows
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let mut table = lock(&self.expenses)?;
        let existing = table
            .rows
            .iter_mut()
            .find(|e| e.id == expense.id && e.user_id == expense.user_id)
            .ok_or(RepositoryError::NotFound)?;
        *existing = expense.clone();
        Ok(expense)
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<(), RepositoryError> {
        let mut table = lock(&self.expenses)?;
        let before = table.rows.len();
        table.rows.retain(|e| !(e.id == id && e.user_id == user_id));
        if table.rows.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn sum(
        &self,
        user_id: i64,
        category_id: Option<i64>,
    ) -> Result<Decimal, RepositoryError> {
        let table = lock(&self.expenses)?;
        Ok(table
            .rows
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| category_id.is_none_or(|id| e.category_id == id))
            .map(|e| e.amount)
            .sum())
    }
}
