use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::{debug, warn};

use super::{api_error, ApiError};
use crate::{config::Config, db::models::Role, security::jwt::JwtSigner};

// [business] Caller identity placed in request extensions by `require_auth`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: u64,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    // [security] Self-or-admin rule for per-user resources
    pub fn can_access(&self, user_id: u64) -> bool {
        self.is_admin() || self.user_id == user_id
    }

    pub fn ensure_can_access(&self, user_id: u64) -> Result<(), ApiError> {
        if self.can_access(user_id) {
            Ok(())
        } else {
            warn!(
                caller = self.user_id,
                target = user_id,
                "Access to another user's resource denied"
            );
            Err(api_error(StatusCode::FORBIDDEN, "Access denied."))
        }
    }
}

/// Middleware: validates the bearer token and attaches an [`AuthUser`].
pub async fn require_auth(
    State(config): State<Config>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;

    let claims = JwtSigner::from_config(&config)
        .verify_jwt(&token)
        .map_err(|e| {
            warn!("Access token rejected: {}", e);
            api_error(StatusCode::UNAUTHORIZED, "Invalid or expired token.")
        })?;

    // verify_jwt already checked that the subject parses
    let user_id = claims
        .user_id()
        .map_err(|_| api_error(StatusCode::UNAUTHORIZED, "Invalid or expired token."))?;

    debug!(user_id, role = claims.role.as_str(), "Request authenticated");
    request.extensions_mut().insert(AuthUser {
        user_id,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Middleware: layered inside `require_auth`; admits admins only.
pub async fn require_admin(
    Extension(user): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !user.is_admin() {
        warn!(user_id = user.user_id, "Admin route denied");
        return Err(api_error(StatusCode::FORBIDDEN, "Admin access required."));
    }

    Ok(next.run(request).await)
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers.get("authorization").ok_or_else(|| {
        api_error(StatusCode::UNAUTHORIZED, "Missing Authorization header.")
    })?;

    let auth_str = auth_header.to_str().map_err(|_| {
        api_error(StatusCode::UNAUTHORIZED, "Invalid Authorization header.")
    })?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(api_error(
            StatusCode::UNAUTHORIZED,
            "Authorization header must use Bearer scheme.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();

        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9..."),
        );
        let token = extract_bearer_token(&headers).unwrap();
        assert_eq!(token, "eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9...");

        headers.clear();
        let (status, _) = extract_bearer_token(&headers).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        headers.insert(
            "authorization",
            HeaderValue::from_static("Basic dXNlcjpwYXNzd29yZA=="),
        );
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn test_self_or_admin() {
        let customer = AuthUser {
            user_id: 7,
            role: Role::Customer,
        };
        let admin = AuthUser {
            user_id: 1,
            role: Role::Admin,
        };

        assert!(customer.can_access(7));
        assert!(!customer.can_access(8));
        assert!(admin.can_access(7));
        assert!(admin.can_access(8));

        let (status, body) = customer.ensure_can_access(8).unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.0.message, "Access denied.");
    }
}
