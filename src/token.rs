use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::entities::accounts::Role;

/// Claims embedded in every bearer token. `sub` carries the account ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

pub fn issue(account_id: i32, role: Role, config: &AuthConfig) -> anyhow::Result<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(config.token_ttl_hours);

    let claims = Claims {
        sub: account_id,
        role,
        iat: usize::try_from(now.timestamp()).unwrap_or_default(),
        exp: usize::try_from(exp.timestamp()).unwrap_or_default(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to sign token: {e}"))
}

pub fn verify(token: &str, config: &AuthConfig) -> Result<Claims, TokenError> {
    let validation = Validation::default();

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?
    .claims;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_round_trip() {
        let config = AuthConfig::default();
        let token = issue(42, Role::Admin, &config).unwrap();
        let claims = verify(&token, &config).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let config = AuthConfig::default();
        let token = issue(1, Role::User, &config).unwrap();

        let other = AuthConfig {
            jwt_secret: "a-completely-different-secret".to_string(),
            ..AuthConfig::default()
        };
        assert!(matches!(verify(&token, &other), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let config = AuthConfig::default();
        assert!(verify("not-a-token", &config).is_err());
    }
}
