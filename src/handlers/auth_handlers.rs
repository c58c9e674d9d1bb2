use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::config::{CookieSettings, MAX_COOKIE_AGE_HOURS};
use crate::handlers::{ErrorResponse, JsonBody, internal_error, validation_error};
use crate::middleware::{AuthenticatedUser, SESSION_COOKIE};
use crate::models::auth::{AuthToken, LoginRequest, MessageResponse};
use crate::models::user::{RegisterRequest, User};
use crate::services::auth_service::{AuthError, AuthService};

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AuthError::MissingFields => (
                StatusCode::BAD_REQUEST,
                "missing_fields",
                "Missing required fields",
            ),
            AuthError::DuplicateUser => (
                StatusCode::CONFLICT,
                "duplicate_user",
                "Email or username already exists",
            ),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password",
            ),
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Missing session token",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid or expired session token",
            ),
            AuthError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "user_not_found",
                "User not found",
            ),
            AuthError::Internal(ref msg) => return internal_error(msg),
        };

        ErrorResponse::into_response_with(status, error_type, message)
    }
}

/// Cookie carrying a freshly issued session token
fn session_cookie(token: String, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(settings.secure)
        .path("/")
        .max_age(time::Duration::hours(
            settings.max_age_hours.clamp(0, MAX_COOKIE_AGE_HOURS),
        ))
        .build()
}

/// Handler for user registration
///
/// Creates a new user account with the provided credentials.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User successfully registered", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email or username already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), Response> {
    info!("Received a registration request");

    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    match auth_service.register(request).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for user login
///
/// Authenticates a user, sets the `jwt` session cookie and returns the token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthToken),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    State(cookie_settings): State<CookieSettings>,
    jar: CookieJar,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<AuthToken>), Response> {
    info!("Received a login request");

    if let Err(errors) = request.validate() {
        return Err(validation_error(&errors));
    }

    let token = auth_service
        .login(request)
        .await
        .map_err(IntoResponse::into_response)?;

    let jar = jar.add(session_cookie(token.token.clone(), &cookie_settings));
    Ok((jar, Json(token)))
}

/// Handler for logout
///
/// Expires the session cookie. The token itself stays valid until its expiry.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    info!("Received a logout request");

    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .build();
    cookie.make_removal();

    (jar.add(cookie), Json(MessageResponse::new("Logout successful")))
}

/// Handler returning the user behind the current session
#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    security(("session_cookie" = [])),
    tag = "auth"
)]
pub async fn current_user_handler(
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<User> {
    Json(user.user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryUserRepository;
    use crate::services::auth_service::AuthServiceImpl;
    use crate::services::token_service::TokenService;

    fn auth_service() -> Arc<dyn AuthService> {
        Arc::new(
            AuthServiceImpl::new(
                Arc::new(InMemoryUserRepository::new()),
                TokenService::new("test_secret", chrono::Duration::hours(1)),
            )
            .with_hash_cost(4),
        )
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "pw123".to_string(),
        }
    }

    fn alice_login() -> LoginRequest {
        LoginRequest {
            email: "alice@x.com".to_string(),
            password: "pw123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_handler_success() {
        let result = register_handler(State(auth_service()), JsonBody(alice())).await;

        let (status, Json(user)) = result.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");
    }

    #[tokio::test]
    async fn test_register_handler_validation_error() {
        let request = RegisterRequest {
            email: "invalid-email".to_string(),
            ..alice()
        };

        let response = register_handler(State(auth_service()), JsonBody(request))
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_handler_rejects_overlong_email() {
        let request = RegisterRequest {
            email: format!("{}@x.com", "a".repeat(300)),
            ..alice()
        };

        let response = register_handler(State(auth_service()), JsonBody(request))
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_handler_duplicate() {
        let service = auth_service();
        register_handler(State(service.clone()), JsonBody(alice()))
            .await
            .unwrap();

        let response = register_handler(State(service), JsonBody(alice()))
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_handler_sets_session_cookie() {
        let service = auth_service();
        register_handler(State(service.clone()), JsonBody(alice()))
            .await
            .unwrap();

        let (jar, Json(token)) = login_handler(
            State(service),
            State(CookieSettings::default()),
            CookieJar::new(),
            JsonBody(alice_login()),
        )
        .await
        .unwrap();

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.value(), token.token);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));
    }

    #[tokio::test]
    async fn test_login_handler_caps_cookie_age() {
        let service = auth_service();
        register_handler(State(service.clone()), JsonBody(alice()))
            .await
            .unwrap();

        let settings = CookieSettings {
            max_age_hours: i64::MAX,
            ..CookieSettings::default()
        };
        let (jar, _) = login_handler(
            State(service),
            State(settings),
            CookieJar::new(),
            JsonBody(alice_login()),
        )
        .await
        .unwrap();

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::hours(MAX_COOKIE_AGE_HOURS))
        );
    }

    #[tokio::test]
    async fn test_login_handler_invalid_credentials() {
        let service = auth_service();
        register_handler(State(service.clone()), JsonBody(alice()))
            .await
            .unwrap();

        let response = login_handler(
            State(service),
            State(CookieSettings::default()),
            CookieJar::new(),
            JsonBody(LoginRequest {
                password: "wrongpassword".to_string(),
                ..alice_login()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_handler_expires_cookie() {
        let (jar, Json(body)) = logout_handler(CookieJar::new()).await;

        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(body.message, "Logout successful");
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response = AuthError::Internal("relation \"users\" does not exist".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
