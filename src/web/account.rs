use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{api_error, internal_error, is_plausible_email, normalize_email, ApiError, ApiJson};
use crate::{
    config::Config,
    db::{models::*, queries, Database},
    security::{
        jwt::JwtSigner,
        password::{check_password_policy, hash_password, verify_password, verify_unknown_account},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// POST /api/auth/register - create a customer account
pub async fn register_handler(
    State(db): State<Database>,
    ApiJson(form): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let email = normalize_email(&form.email);
    info!("Registration attempt for email: {}", email);

    if !is_plausible_email(&email) {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid email address."));
    }

    check_password_policy(&form.password)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let password_hash = hash_password(&form.password)
        .map_err(|e| internal_error("Password hashing failed", e))?;

    let name = form.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let user = queries::create_user(&db, &email, name, &password_hash)
        .await
        .map_err(|e| {
            if queries::is_unique_violation(&e) {
                warn!("Registration for an email already in use");
                api_error(StatusCode::CONFLICT, "Email already registered.")
            } else {
                internal_error("Database error creating user", e)
            }
        })?;

    info!("User registered: {}", user.user_id);
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/auth/login - exchange credentials for an access token
pub async fn login_handler(
    State(db): State<Database>,
    State(config): State<Config>,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = normalize_email(&form.email);

    let user = queries::get_user_by_email(&db, &email)
        .await
        .map_err(|e| internal_error("Database error loading user", e))?;

    let Some(user) = user else {
        verify_unknown_account(&form.password);
        warn!("Login for unknown email");
        return Err(api_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    };

    let matches = verify_password(&form.password, &user.password_hash)
        .map_err(|e| internal_error("Stored password hash unreadable", e))?;
    if !matches {
        warn!("Wrong password for user {}", user.user_id);
        return Err(api_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    let signer = JwtSigner::from_config(&config);
    let token = signer
        .create_access_token(user.user_id, user.role())
        .map_err(|e| internal_error("Token signing failed", e))?;

    info!("User {} signed in", user.user_id);
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: signer.ttl_secs(),
        user: user.into(),
    }))
}
