use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use validator::Validate;

use crate::handlers::{ErrorResponse, JsonBody, PathParam, internal_error, validation_error};
use crate::middleware::AuthenticatedUser;
use crate::models::auth::MessageResponse;
use crate::models::expense::{CreateExpenseRequest, Expense, ExpenseSum, UpdateExpenseRequest};
use crate::services::expense_service::{ExpenseError, ExpenseService};

/// Convert ExpenseError to HTTP response
impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ExpenseError::MissingFields => (
                StatusCode::BAD_REQUEST,
                "missing_fields",
                "Name, category_id and amount are required",
            ),
            ExpenseError::InvalidAmount => (
                StatusCode::BAD_REQUEST,
                "invalid_amount",
                "Amount must be a decimal number",
            ),
            ExpenseError::InvalidDate => (
                StatusCode::BAD_REQUEST,
                "invalid_date",
                "Invalid date format, expected YYYY-MM-DD",
            ),
            ExpenseError::CategoryNotFound => (
                StatusCode::NOT_FOUND,
                "category_not_found",
                "Category not found",
            ),
            ExpenseError::ExpenseNotFound => (
                StatusCode::NOT_FOUND,
                "expense_not_found",
                "Expense not found",
            ),
            ExpenseError::Internal(ref msg) => return internal_error(msg),
        };

        ErrorResponse::into_response_with(status, error_type, message)
    }
}

/// Handler for listing expenses
#[utoipa::path(
    get,
    path = "/api/expenses",
    responses(
        (status = 200, description = "The user's expenses", body = Vec<Expense>),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "expenses"
)]
pub async fn list_expenses_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Expense>>, Response> {
    match expense_service.list(auth_user.user_id()).await {
        Ok(expenses) => Ok(Json(expenses)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for creating an expense
///
/// The category must be shared or owned by the user. `date` defaults to today.
#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = Expense),
        (status = 400, description = "Missing fields, invalid amount or date", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "expenses"
)]
pub async fn create_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    JsonBody(request): JsonBody<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), Response> {
    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    match expense_service.create(auth_user.user_id(), request).await {
        Ok(expense) => Ok((StatusCode::CREATED, Json(expense))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating an expense
///
/// Only the fields present and non-empty in the body are changed.
#[utoipa::path(
    put,
    path = "/api/expenses/{id}",
    params(
        ("id" = i64, Path, description = "Expense ID")
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = Expense),
        (status = 400, description = "Invalid name, amount or date", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "Expense or category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "expenses"
)]
pub async fn update_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    PathParam(expense_id): PathParam<i64>,
    JsonBody(request): JsonBody<UpdateExpenseRequest>,
) -> Result<Json<Expense>, Response> {
    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    match expense_service
        .update(auth_user.user_id(), expense_id, request)
        .await
    {
        Ok(expense) => Ok(Json(expense)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting an expense
#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    params(
        ("id" = i64, Path, description = "Expense ID")
    ),
    responses(
        (status = 200, description = "Expense deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "expenses"
)]
pub async fn delete_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    PathParam(expense_id): PathParam<i64>,
) -> Result<Json<MessageResponse>, Response> {
    match expense_service.delete(auth_user.user_id(), expense_id).await {
        Ok(()) => Ok(Json(MessageResponse::new("Expense deleted successfully"))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for the total of all the user's expenses
#[utoipa::path(
    get,
    path = "/api/expenses/sum",
    responses(
        (status = 200, description = "Total amount", body = ExpenseSum),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "expenses"
)]
pub async fn sum_expenses_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<ExpenseSum>, Response> {
    match expense_service.sum(auth_user.user_id(), None).await {
        Ok(sum) => Ok(Json(ExpenseSum { sum })),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for the total of the user's expenses in one category
///
/// An unknown or foreign category simply sums to zero.
#[utoipa::path(
    get,
    path = "/api/expenses/category/{category_id}",
    params(
        ("category_id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Total amount for the category", body = ExpenseSum),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "expenses"
)]
pub async fn sum_by_category_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    PathParam(category_id): PathParam<i64>,
) -> Result<Json<ExpenseSum>, Response> {
    match expense_service
        .sum(auth_user.user_id(), Some(category_id))
        .await
    {
        Ok(sum) => Ok(Json(ExpenseSum { sum })),
        Err(e) => Err(e.into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;
    use crate::repositories::{InMemoryCategoryRepository, InMemoryExpenseRepository};
    use crate::services::category_service::{CategoryService, CategoryServiceImpl};
    use crate::services::expense_service::ExpenseServiceImpl;
    use rust_decimal::Decimal;

    async fn expense_service() -> Arc<dyn ExpenseService> {
        let categories = CategoryServiceImpl::new(Arc::new(InMemoryCategoryRepository::new()));
        categories.seed_defaults().await.unwrap();
        Arc::new(ExpenseServiceImpl::new(
            Arc::new(InMemoryExpenseRepository::new()),
            Arc::new(categories),
        ))
    }

    fn as_user(id: i64) -> Extension<AuthenticatedUser> {
        Extension(AuthenticatedUser {
            user: User {
                id,
                username: format!("user{}", id),
                email: format!("user{}@x.com", id),
                password_hash: String::new(),
            },
        })
    }

    fn coffee() -> CreateExpenseRequest {
        CreateExpenseRequest {
            name: Some("Coffee".to_string()),
            category_id: Some(1),
            amount: Some("3.50".to_string()),
            date: Some("2024-01-15".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_expense_handler_success() {
        let (status, Json(expense)) =
            create_expense_handler(State(expense_service().await), as_user(1), JsonBody(coffee()))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(expense.name, "Coffee");
        assert_eq!(expense.amount.to_string(), "3.50");
    }

    #[tokio::test]
    async fn test_create_expense_handler_missing_fields() {
        let request = CreateExpenseRequest {
            amount: None,
            ..coffee()
        };

        let response =
            create_expense_handler(State(expense_service().await), as_user(1), JsonBody(request))
                .await
                .unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_expense_handler_invalid_amount() {
        let request = CreateExpenseRequest {
            amount: Some("three".to_string()),
            ..coffee()
        };

        let response =
            create_expense_handler(State(expense_service().await), as_user(1), JsonBody(request))
                .await
                .unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_name_longer_than_column_is_rejected() {
        let service = expense_service().await;
        let long_name = "x".repeat(300);

        let request = CreateExpenseRequest {
            name: Some(long_name.clone()),
            ..coffee()
        };
        let response = create_expense_handler(State(service.clone()), as_user(1), JsonBody(request))
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (_, Json(expense)) =
            create_expense_handler(State(service.clone()), as_user(1), JsonBody(coffee()))
                .await
                .unwrap();
        let response = update_expense_handler(
            State(service.clone()),
            as_user(1),
            PathParam(expense.id),
            JsonBody(UpdateExpenseRequest {
                name: Some(long_name),
                ..UpdateExpenseRequest::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let Json(expenses) = list_expenses_handler(State(service), as_user(1))
            .await
            .unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].name, "Coffee");
    }

    #[tokio::test]
    async fn test_update_and_delete_foreign_expense_not_found() {
        let service = expense_service().await;
        let (_, Json(expense)) =
            create_expense_handler(State(service.clone()), as_user(1), JsonBody(coffee()))
                .await
                .unwrap();

        let response = update_expense_handler(
            State(service.clone()),
            as_user(2),
            PathParam(expense.id),
            JsonBody(UpdateExpenseRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response =
            delete_expense_handler(State(service.clone()), as_user(2), PathParam(expense.id))
                .await
                .unwrap_err();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let Json(message) = delete_expense_handler(State(service), as_user(1), PathParam(expense.id))
            .await
            .unwrap();
        assert_eq!(message.message, "Expense deleted successfully");
    }

    #[tokio::test]
    async fn test_sum_handlers() {
        let service = expense_service().await;

        let Json(empty) = sum_expenses_handler(State(service.clone()), as_user(1))
            .await
            .unwrap();
        assert_eq!(empty.sum, Decimal::ZERO);

        create_expense_handler(State(service.clone()), as_user(1), JsonBody(coffee()))
            .await
            .unwrap();
        let request = CreateExpenseRequest {
            amount: Some("6.50".to_string()),
            ..coffee()
        };
        create_expense_handler(State(service.clone()), as_user(1), JsonBody(request))
            .await
            .unwrap();

        let Json(by_category) = sum_by_category_handler(State(service.clone()), as_user(1), PathParam(1))
            .await
            .unwrap();
        assert_eq!(by_category.sum.to_string(), "10.00");

        let Json(other_category) =
            sum_by_category_handler(State(service), as_user(1), PathParam(2))
                .await
                .unwrap();
        assert_eq!(other_category.sum, Decimal::ZERO);
    }
}
