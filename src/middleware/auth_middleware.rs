use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::debug;

use crate::models::user::User;
use crate::services::auth_service::{AuthError, AuthService};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "jwt";

/// Extension type storing the resolved session user in the request
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

/// Session token from the `jwt` cookie, else from an `Authorization: Bearer` header
fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Auth middleware that resolves the session token to a live user
pub async fn auth_middleware(
    State(auth_service): State<Arc<dyn AuthService>>,
    jar: CookieJar,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = session_token(&jar, &headers).ok_or(AuthError::MissingToken)?;

    let user = auth_service.resolve_session(&token).await?;
    debug!(user_id = user.id, path = %request.uri().path(), "Session resolved");

    request.extensions_mut().insert(AuthenticatedUser { user });

    Ok(next.run(request).await)
}
