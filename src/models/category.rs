use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Owner id marking a category as shared with every user
pub const SHARED_OWNER_ID: i64 = 0;

/// Shared categories seeded at startup, as (name, description)
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Food", "Groceries, cafes and other food spending"),
    ("Transport", "Public transport, taxis and fuel"),
    ("Entertainment", "Cinema, restaurants and other entertainment"),
    ("Health", "Medicine and healthcare services"),
];

/// Category entity representing a spending classification
///
/// `owner_id` is [`SHARED_OWNER_ID`] for the default categories every user sees,
/// otherwise the id of the single user who can see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    #[serde(rename = "category_id")]
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing, default)]
    pub owner_id: i64,
}

impl Category {
    pub fn is_shared(&self) -> bool {
        self.owner_id == SHARED_OWNER_ID
    }

    /// Whether `user_id` may see and reference this category
    pub fn is_visible_to(&self, user_id: i64) -> bool {
        self.is_shared() || self.owner_id == user_id
    }
}

/// Request payload for creating a private category
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
#[schema(example = json!({
    "name": "Books",
    "description": "Paper and e-books"
}))]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// A category row about to be inserted
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub owner_id: i64,
}
