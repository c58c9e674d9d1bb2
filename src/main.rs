use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use expense_tracker::app::{AppState, create_router};
use expense_tracker::config::AppConfig;
use expense_tracker::database;
use expense_tracker::repositories::{
    PostgresCategoryRepository, PostgresExpenseRepository, PostgresUserRepository,
};
use expense_tracker::services::{
    AuthService, AuthServiceImpl, CategoryService, CategoryServiceImpl, ExpenseService,
    ExpenseServiceImpl, TokenService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;

    let pool = database::connect(&config.database).await?;
    database::run_migrations(&pool).await?;

    // Initialize repositories
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let category_repository = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let expense_repository = Arc::new(PostgresExpenseRepository::new(pool));

    // Initialize services
    let auth_service: Arc<dyn AuthService> = Arc::new(AuthServiceImpl::new(
        user_repository,
        TokenService::from_settings(&config.jwt),
    ));
    let category_service: Arc<dyn CategoryService> =
        Arc::new(CategoryServiceImpl::new(category_repository));
    let expense_service: Arc<dyn ExpenseService> = Arc::new(ExpenseServiceImpl::new(
        expense_repository,
        category_service.clone(),
    ));

    let seeded = category_service.seed_defaults().await?;
    info!(seeded, "Default categories ready");

    let app = create_router(AppState {
        auth_service,
        category_service,
        expense_service,
        cookie: config.cookie.clone(),
    })
    .layer(TimeoutLayer::new(Duration::from_secs(
        config.server.timeout_secs,
    )));

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "Server running");
    info!("API docs at http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
