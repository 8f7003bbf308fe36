use std::future::{ready, Ready};
use std::str::FromStr;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{ApiError, Role};

const TOKEN_EXPIRY_HOURS: i64 = 24;

/// JWT claims carried by every bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id (hex ObjectId)
    pub sub: String,
    /// Role name, e.g. "restaurant" or "admin"
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Shared signing/verification state, injected as app data.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
}

impl AuthConfig {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

/// Mint a token for a user. Used by the account endpoints that live outside
/// this service, and by tests.
pub fn create_token(
    user_id: &ObjectId,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id.to_hex(),
        role: role.to_string(),
        exp: (now + chrono::Duration::hours(TOKEN_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Acting user resolved from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }

    pub fn require_restaurant(&self) -> Result<(), ApiError> {
        if self.role == Role::Restaurant {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Restaurant owner access required".to_string()))
        }
    }
}

pub fn authorize(token: &str, secret: &str) -> Result<AuthUser, ApiError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("JWT validation failed: {}", e);
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let user_id = ObjectId::parse_str(&token_data.claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid subject in token".to_string()))?;
    let role = Role::from_str(&token_data.claims.role)
        .map_err(|_| ApiError::Unauthorized("Invalid role in token".to_string()))?;

    Ok(AuthUser { user_id, role })
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = (|| {
            let config = req
                .app_data::<web::Data<AuthConfig>>()
                .ok_or_else(|| ApiError::InternalError("Auth configuration missing".to_string()))?;

            let header = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?;

            authorize(token, &config.secret)
        })();

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-please-ignore";

    #[test]
    fn test_token_round_trip() {
        let user_id = ObjectId::new();
        let token = create_token(&user_id, Role::Restaurant, SECRET).unwrap();
        let auth = authorize(&token, SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.role, Role::Restaurant);
        assert!(auth.require_restaurant().is_ok());
        assert!(auth.require_admin().is_err());
    }

    #[test]
    fn test_admin_guard() {
        let token = create_token(&ObjectId::new(), Role::Admin, SECRET).unwrap();
        let auth = authorize(&token, SECRET).unwrap();
        assert!(auth.is_admin());
        assert!(auth.require_admin().is_ok());
        assert!(auth.require_restaurant().is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token(&ObjectId::new(), Role::Customer, SECRET).unwrap();
        let err = authorize(&token, "a-different-secret-entirely").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            authorize("not.a.jwt", SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
