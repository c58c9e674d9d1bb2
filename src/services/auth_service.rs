use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::user::{NewUser, RegisterRequest, User};
use crate::repositories::{RepositoryError, UserRepository};
use crate::services::token_service::{TokenError, TokenService};
use crate::validation::non_blank;

/// Authentication service errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Email or username already exists")]
    DuplicateUser,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing session token")]
    MissingToken,

    /// Bad signature, malformed or expired session token
    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait defining authentication service operations
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user
    async fn register(&self, request: RegisterRequest) -> Result<User, AuthError>;

    /// Authenticate user and return a session token
    async fn login(&self, request: LoginRequest) -> Result<AuthToken, AuthError>;

    /// Resolve a session token to the live user it names
    async fn resolve_session(&self, token: &str) -> Result<User, AuthError>;
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    tokens: TokenService,
    hash_cost: u32,
}

impl AuthServiceImpl {
    pub fn new(user_repository: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self {
            user_repository,
            tokens,
            hash_cost: DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost; only meant for test suites
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Hash a password using bcrypt
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        hash(password, self.hash_cost)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a hash
    fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        verify(password, hash)
            .map_err(|e| AuthError::Internal(format!("Password verification failed: {}", e)))
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        let (Some(username), Some(email)) = (
            non_blank(Some(&request.username)),
            non_blank(Some(&request.email)),
        ) else {
            return Err(AuthError::MissingFields);
        };
        if request.password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        info!(username, email, "Registering user");

        let existing = self
            .user_repository
            .find_by_email_or_username(email, username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if existing.is_some() {
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = self.hash_password(&request.password)?;

        let user = self
            .user_repository
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation(_) => AuthError::DuplicateUser,
                RepositoryError::DatabaseError(msg) => AuthError::Internal(msg),
                RepositoryError::NotFound => AuthError::Internal("Unexpected error".to_string()),
            })?;

        info!(user_id = user.id, "User registered successfully");
        Ok(user)
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthToken, AuthError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let Some(user) = self
            .user_repository
            .find_by_email(request.email.trim())
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        else {
            warn!(email = %request.email, "Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !Self::verify_password(&request.password, &user.password_hash)? {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id).map_err(|e| match e {
            TokenError::Signing(msg) => AuthError::Internal(msg),
            other => AuthError::Internal(other.to_string()),
        })?;

        info!(user_id = user.id, expires_at = %token.expires_at, "Session token issued");
        Ok(token)
    }

    async fn resolve_session(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.tokens.verify(token).map_err(|e| {
            warn!(reason = %e, "Rejected session token");
            AuthError::InvalidToken
        })?;

        self.user_repository
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }
}
