// [business] Role travels inside the token so authorization needs no database lookup
use crate::{config::Config, db::models::Role};

// [library] Error handling - anyhow provides flexible error types for applications
use anyhow::{anyhow, Result};

// [library] JOSE kit - JSON Web Signature and JWT implementation for Rust
use josekit::{
    jws::{JwsHeader, HS256}, // [security] HMAC-SHA256 with a shared server secret
    jwt::{self, JwtPayload},
};

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

// [security] Clock skew tolerated on exp / iat checks
const CLOCK_SKEW_SECS: i64 = 60;

// [business] Claims carried by storefront access tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String, // [security] Issuer - must match TOKEN_ISSUER
    pub sub: String, // [business] Subject - numeric user id as a string
    pub role: Role,  // [business] customer | admin
    pub exp: i64,    // [security] Expiration time (Unix seconds)
    pub iat: i64,    // [security] Issued at (Unix seconds)
    pub jti: String, // [security] Unique token id
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<u64> {
        self.sub
            .parse()
            .map_err(|_| anyhow!("Token subject is not a user id"))
    }
}

// [business] Signs and verifies access tokens
pub struct JwtSigner {
    issuer: String,
    secret: Secret<String>,
    ttl_secs: i64,
}

impl JwtSigner {
    pub fn new(issuer: String, secret: Secret<String>, ttl_secs: i64) -> Self {
        Self {
            issuer,
            secret,
            ttl_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.token_issuer.clone(),
            config.jwt_secret.clone(),
            config.access_token_ttl_secs,
        )
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    // [business] Create an access token for a signed-in user
    pub fn create_access_token(&self, user_id: u64, role: Role) -> Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::seconds(self.ttl_secs);

        let claims = AccessClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            role,
            exp: exp.unix_timestamp(),
            iat: now.unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        self.sign_jwt(&claims)
    }

    fn sign_jwt(&self, claims: &AccessClaims) -> Result<String> {
        let mut header = JwsHeader::new();
        header.set_token_type("JWT");

        // [library] Transfer all claims from the JSON object to the JWT payload
        let mut payload = JwtPayload::new();
        if let Value::Object(map) = serde_json::to_value(claims)? {
            for (key, value) in map {
                payload.set_claim(&key, Some(value))?;
            }
        }

        let signer = HS256.signer_from_bytes(self.secret.expose_secret().as_bytes())?;
        let token = jwt::encode_with_signer(&payload, &header, &signer)?;

        Ok(token)
    }

    // [security] Verify signature, then issuer and time-based claims
    pub fn verify_jwt(&self, token: &str) -> Result<AccessClaims> {
        let verifier = HS256.verifier_from_bytes(self.secret.expose_secret().as_bytes())?;
        let (payload, _header) = jwt::decode_with_verifier(token, &verifier)?;

        let claims: AccessClaims = serde_json::from_value(Value::Object(payload.claims_set().clone()))
            .map_err(|e| anyhow!("Malformed token claims: {}", e))?;

        self.validate_claims(&claims)?;

        Ok(claims)
    }

    fn validate_claims(&self, claims: &AccessClaims) -> Result<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();

        if claims.iss != self.issuer {
            return Err(anyhow!(
                "Invalid issuer: expected {}, got {}",
                self.issuer,
                claims.iss
            ));
        }

        if claims.exp < (now - CLOCK_SKEW_SECS) {
            return Err(anyhow!("Token has expired"));
        }

        if claims.iat > (now + CLOCK_SKEW_SECS) {
            return Err(anyhow!("Token issued in the future"));
        }

        claims.user_id()?;

        Ok(())
    }
}
