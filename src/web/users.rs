use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use tracing::{info, warn};

use super::{api_error, internal_error, ApiError, ApiJson, ApiPath, AuthUser};
use crate::db::{models::*, queries, Database};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileRequest {
    // [business] Trimmed values; a blank name is ignored, a malformed email is rejected
    fn normalized(&self) -> Result<(Option<String>, Option<String>), &'static str> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from);

        let email = match self.email.as_deref().map(normalize_email) {
            Some(email) if !is_plausible_email(&email) => return Err("Invalid email address."),
            other => other,
        };

        if name.is_none() && email.is_none() {
            return Err("Nothing to update.");
        }

        Ok((name, email))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(' '),
        None => false,
    }
}

/// GET /api/users - all profiles (admin)
pub async fn list_users_handler(
    State(db): State<Database>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = queries::list_users(&db)
        .await
        .map_err(|e| internal_error("Database error listing users", e))?;

    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// GET /api/users/:id - self or admin
pub async fn get_user_handler(
    State(db): State<Database>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<u64>,
) -> Result<Json<UserProfile>, ApiError> {
    caller.ensure_can_access(user_id)?;

    let user = queries::get_user_by_id(&db, user_id)
        .await
        .map_err(|e| internal_error("Database error loading user", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "User not found."))?;

    Ok(Json(user.into()))
}

/// PUT /api/users/:id - self or admin
pub async fn update_user_handler(
    State(db): State<Database>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<u64>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    caller.ensure_can_access(user_id)?;

    let (name, email) = request
        .normalized()
        .map_err(|message| api_error(StatusCode::BAD_REQUEST, message))?;

    let user = queries::update_user_profile(&db, user_id, name.as_deref(), email.as_deref())
        .await
        .map_err(|e| {
            if queries::is_unique_violation(&e) {
                warn!("Profile update with an email already in use");
                api_error(StatusCode::CONFLICT, "Email already registered.")
            } else {
                internal_error("Database error updating user", e)
            }
        })?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "User not found."))?;

    info!(user_id, caller = caller.user_id, "Profile updated");
    Ok(Json(user.into()))
}

/// GET /api/users/:id/orders - newest first; self or admin
pub async fn list_user_orders_handler(
    State(db): State<Database>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<u64>,
) -> Result<Json<Vec<OrderDetails>>, ApiError> {
    caller.ensure_can_access(user_id)?;

    let orders = queries::list_orders_for_user(&db, user_id)
        .await
        .map_err(|e| internal_error("Database error listing orders", e))?;

    Ok(Json(orders))
}
