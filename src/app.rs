use axum::{
    Router,
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CookieSettings;
use crate::handlers::{self, ErrorResponse, auth_handlers, category_handlers, expense_handlers};
use crate::middleware::{SESSION_COOKIE, auth_middleware};
use crate::models::{
    AuthToken, Category, CreateCategoryRequest, CreateExpenseRequest, Expense, ExpenseSum,
    LoginRequest, MessageResponse, RegisterRequest, UpdateExpenseRequest, User,
};
use crate::services::{AuthService, CategoryService, ExpenseService};

/// Shared state handed to every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub category_service: Arc<dyn CategoryService>,
    pub expense_service: Arc<dyn ExpenseService>,
    pub cookie: CookieSettings,
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::hello_handler,
        auth_handlers::register_handler,
        auth_handlers::login_handler,
        auth_handlers::logout_handler,
        auth_handlers::current_user_handler,
        category_handlers::list_categories_handler,
        category_handlers::create_category_handler,
        expense_handlers::list_expenses_handler,
        expense_handlers::create_expense_handler,
        expense_handlers::update_expense_handler,
        expense_handlers::delete_expense_handler,
        expense_handlers::sum_expenses_handler,
        expense_handlers::sum_by_category_handler,
    ),
    components(
        schemas(
            User, RegisterRequest, LoginRequest, AuthToken, MessageResponse,
            Category, CreateCategoryRequest,
            Expense, CreateExpenseRequest, UpdateExpenseRequest, ExpenseSum,
            ErrorResponse
        )
    ),
    modifiers(&SessionCookieAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration, login and session endpoints"),
        (name = "categories", description = "Shared and private categories"),
        (name = "expenses", description = "Expense ledger and totals")
    ),
    info(
        title = "Expense Tracker API",
        version = "0.1.0",
        description = "REST API for tracking personal expenses",
    )
)]
pub struct ApiDoc;

struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
        }
    }
}

/// Builds the full application router
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/user", get(auth_handlers::current_user_handler))
        .route(
            "/api/categories",
            get(category_handlers::list_categories_handler)
                .post(category_handlers::create_category_handler),
        )
        .route(
            "/api/expenses",
            get(expense_handlers::list_expenses_handler)
                .post(expense_handlers::create_expense_handler),
        )
        .route("/api/expenses/sum", get(expense_handlers::sum_expenses_handler))
        .route(
            "/api/expenses/category/:category_id",
            get(expense_handlers::sum_by_category_handler),
        )
        .route(
            "/api/expenses/:id",
            put(expense_handlers::update_expense_handler)
                .delete(expense_handlers::delete_expense_handler),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(handlers::hello_handler))
        .route("/api/register", post(auth_handlers::register_handler))
        .route("/api/login", post(auth_handlers::login_handler))
        .route("/api/logout", post(auth_handlers::logout_handler))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
