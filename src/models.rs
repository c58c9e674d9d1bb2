pub mod auth;
pub mod category;
pub mod expense;
pub mod user;

pub use auth::{AuthToken, LoginRequest, MessageResponse};
pub use category::{Category, CreateCategoryRequest, DEFAULT_CATEGORIES, SHARED_OWNER_ID};
pub use expense::{CreateExpenseRequest, Expense, ExpenseSum, UpdateExpenseRequest};
pub use user::{RegisterRequest, User};
