pub mod account;
pub mod auth;
pub mod categories;
pub mod extract;
pub mod orders;
pub mod routes;
pub mod users;

pub use account::*;
pub use auth::*;
pub use categories::*;
pub use extract::*;
pub use orders::*;
pub use routes::*;
pub use users::*;

use axum::{http::StatusCode, Json};

use crate::db::models::ApiMessage;

// [library] Every handler error is a status plus the shared {message, details?} body
pub type ApiError = (StatusCode, Json<ApiMessage>);

pub fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(ApiMessage::new(message)))
}

// [business] Unexpected database failures: log the cause, return a generic 500
pub fn internal_error(context: &str, err: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", context, err);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
