use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::domain::{is_admin_role, UserId};
use storage::StoredUser;

const ACCESS_SCOPE: &str = "read write";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub role: String,
    pub name: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn is_admin(&self) -> bool {
        is_admin_role(&self.role)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok().map(UserId)
    }
}

pub fn mint_access_token(
    cfg: &JwtConfig,
    user: &StoredUser,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::minutes(cfg.ttl_minutes);
    let claims = AccessClaims {
        sub: user.user_id.0.to_string(),
        role: user.role.clone(),
        name: user.username.clone(),
        scope: ACCESS_SCOPE.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
}

/// Checks signature and expiry; the role claim is trusted only after this.
pub fn verify_access_token(
    cfg: &JwtConfig,
    token: &str,
) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
#[path = "tests/jwt_tests.rs"]
mod tests;
