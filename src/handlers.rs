pub mod auth_handlers;
pub mod category_handlers;
pub mod expense_handlers;

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::validation::describe_errors;

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "expense_not_found",
    "message": "Expense not found"
}))]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }

    /// Builds the full HTTP response for an error code
    pub fn into_response_with(status: StatusCode, error: &str, message: &str) -> Response {
        (status, Json(Self::new(error, message))).into_response()
    }
}

/// Generic 500 body; the detail is only logged
pub(crate) fn internal_error(detail: &str) -> Response {
    tracing::error!(detail, "Request failed with an internal error");
    ErrorResponse::into_response_with(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Internal server error",
    )
}

/// 400 response for a request body rejected by `validator`
pub(crate) fn validation_error(errors: &ValidationErrors) -> Response {
    ErrorResponse::into_response_with(
        StatusCode::BAD_REQUEST,
        "validation_error",
        &describe_errors(errors),
    )
}

/// JSON request body; a body that does not parse is answered with [`ErrorResponse`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(RequestRejection))]
pub struct JsonBody<T>(pub T);

/// Typed path parameters; a segment that does not parse is answered with [`ErrorResponse`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(RequestRejection))]
pub struct PathParam<T>(pub T);

/// Malformed body or path. Parser detail is logged, never returned.
#[derive(Debug)]
pub struct RequestRejection {
    message: &'static str,
}

impl From<JsonRejection> for RequestRejection {
    fn from(rejection: JsonRejection) -> Self {
        debug!(detail = %rejection.body_text(), "Rejected request body");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Expected a JSON body with content-type application/json"
            }
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            _ => "Request body has missing or mistyped fields",
        };
        Self { message }
    }
}

impl From<PathRejection> for RequestRejection {
    fn from(rejection: PathRejection) -> Self {
        debug!(detail = %rejection.body_text(), "Rejected path parameter");
        Self {
            message: "Invalid path parameter",
        }
    }
}

impl IntoResponse for RequestRejection {
    fn into_response(self) -> Response {
        ErrorResponse::into_response_with(StatusCode::BAD_REQUEST, "validation_error", self.message)
    }
}

/// Greeting at the root path
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = String)
    ),
    tag = "health"
)]
pub async fn hello_handler() -> &'static str {
    "Hello world!"
}
