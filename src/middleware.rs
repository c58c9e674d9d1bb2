pub mod auth_middleware;

pub use auth_middleware::{AuthenticatedUser, SESSION_COOKIE, auth_middleware};
