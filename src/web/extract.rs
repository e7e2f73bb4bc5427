use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::ApiError;
use crate::db::models::ApiMessage;

pub const INVALID_BODY: &str = "Invalid request body.";
pub const INVALID_PATH: &str = "Invalid path parameter.";

/// `Json<T>` whose rejection is reported as an [`ApiMessage`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

/// `Path<T>` whose rejection is reported as an [`ApiMessage`].
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

// [library] Keep axum's status code, swap its plain-text body for the JSON one
pub fn json_rejection(message: &str, rejection: JsonRejection) -> ApiError {
    warn!("Rejected request body: {}", rejection);
    (
        rejection.status(),
        Json(ApiMessage::new(message).with_details(rejection.body_text())),
    )
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    warn!("Rejected path parameter: {}", rejection);
    (
        rejection.status(),
        Json(ApiMessage::new(INVALID_PATH).with_details(rejection.body_text())),
    )
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(INVALID_BODY, rejection)),
        }
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}
