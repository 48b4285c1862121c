use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppError;

const DEFAULT_EXP_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(DEFAULT_EXP_HOURS))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Self::new(secret, exp_hours)
    }

    pub fn new(secret: impl Into<String>, exp_hours: i64) -> Result<Self, AppError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AppError::configuration("JWT_SECRET must not be empty"));
        }
        if exp_hours <= 0 {
            return Err(AppError::configuration("JWT_EXP_HOURS must be positive"));
        }

        Ok(Self {
            secret: Arc::new(secret.into_bytes()),
            exp_hours,
        })
    }

    pub fn encode(&self, user_id: Uuid, org_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.exp_hours);

        let claims = Claims {
            sub: user_id,
            org: org_id,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| AppError::token(err.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    /// Organization the token was issued for.
    pub org: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// The authenticated caller. Whether the user still exists is decided by
/// the authorization gate, not here.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub org_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("Authorization header missing"))?;

        let claims = state.jwt.decode(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            org_id: claims.org,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_their_subject() {
        let config = JwtConfig::new("test-secret", 1).unwrap();
        let (user, org) = (Uuid::new_v4(), Uuid::new_v4());
        let claims = config.decode(&config.encode(user, org).unwrap()).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.org, org);
    }

    #[test]
    fn foreign_signatures_are_rejected() {
        let ours = JwtConfig::new("ours", 1).unwrap();
        let theirs = JwtConfig::new("theirs", 1).unwrap();
        let token = theirs.encode(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert!(matches!(ours.decode(&token), Err(AppError::Token(_))));
    }

    #[test]
    fn bad_settings_are_configuration_errors() {
        assert!(matches!(JwtConfig::new("", 1), Err(AppError::Configuration(_))));
        assert!(matches!(JwtConfig::new("s", 0), Err(AppError::Configuration(_))));
    }
}
