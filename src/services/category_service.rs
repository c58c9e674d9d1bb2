use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::models::category::{
    Category, CreateCategoryRequest, DEFAULT_CATEGORIES, NewCategory, SHARED_OWNER_ID,
};
use crate::repositories::{CategoryRepository, RepositoryError};
use crate::validation::non_blank;

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Category with this name already exists")]
    DuplicateCategory,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for CategoryError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => CategoryError::CategoryNotFound,
            RepositoryError::ConstraintViolation(_) => CategoryError::DuplicateCategory,
            RepositoryError::DatabaseError(msg) => CategoryError::Internal(msg),
        }
    }
}

/// Trait defining category service operations
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// Get all categories visible to a user (shared + the user's private ones)
    async fn list_visible(&self, user_id: i64) -> Result<Vec<Category>, CategoryError>;

    /// Create a private category owned by the user
    async fn create(
        &self,
        user_id: i64,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Look up a category the user is allowed to reference
    async fn resolve_for_user(
        &self,
        category_id: i64,
        user_id: i64,
    ) -> Result<Category, CategoryError>;

    /// Insert any missing default shared category; returns how many were added
    async fn seed_defaults(&self) -> Result<usize, CategoryError>;
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
}

impl CategoryServiceImpl {
    pub fn new(category_repository: Arc<dyn CategoryRepository>) -> Self {
        Self {
            category_repository,
        }
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn list_visible(&self, user_id: i64) -> Result<Vec<Category>, CategoryError> {
        Ok(self.category_repository.find_visible(user_id).await?)
    }

    async fn create(
        &self,
        user_id: i64,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let (Some(name), Some(description)) = (
            non_blank(Some(&request.name)),
            non_blank(Some(&request.description)),
        ) else {
            return Err(CategoryError::MissingFields);
        };

        // A private name may not shadow a shared one or another private one
        if self
            .category_repository
            .find_visible_by_name(name, user_id)
            .await?
            .is_some()
        {
            return Err(CategoryError::DuplicateCategory);
        }

        let category = self
            .category_repository
            .create(NewCategory {
                name: name.to_string(),
                description: description.to_string(),
                owner_id: user_id,
            })
            .await?;

        info!(user_id, category_id = category.id, name, "Private category created");
        Ok(category)
    }

    async fn resolve_for_user(
        &self,
        category_id: i64,
        user_id: i64,
    ) -> Result<Category, CategoryError> {
        self.category_repository
            .find_visible_by_id(category_id, user_id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)
    }

    async fn seed_defaults(&self) -> Result<usize, CategoryError> {
        let mut inserted = 0;

        for &(name, description) in DEFAULT_CATEGORIES {
            if self
                .category_repository
                .find_shared_by_name(name)
                .await?
                .is_some()
            {
                continue;
            }

            let category = self
                .category_repository
                .create(NewCategory {
                    name: name.to_string(),
                    description: description.to_string(),
                    owner_id: SHARED_OWNER_ID,
                })
                .await?;
            info!(category_id = category.id, name, "Seeded shared category");
            inserted += 1;
        }

        Ok(inserted)
    }
}
