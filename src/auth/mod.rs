use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The authenticated caller a policy decides about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Claims expiring `expiry_hours` from now; lifetimes chrono cannot represent are refused
    pub fn new(principal: &Principal, expiry_hours: u64) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| JwtError::TokenGeneration(format!("token lifetime of {} hours is out of range", expiry_hours)))?;

        Ok(Self {
            sub: principal.id,
            name: principal.name.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// Issue a bearer token for a principal
pub fn issue_token(principal: &Principal, secret: &str, expiry_hours: u64) -> Result<String, JwtError> {
    generate_jwt(&Claims::new(principal, expiry_hours)?, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Principal {
        Principal { id: 7, name: "alice".into() }
    }

    #[test]
    fn token_round_trips_principal() {
        let token = issue_token(&alice(), "s3cret", 1).unwrap();
        let claims = validate_jwt(&token, "s3cret").unwrap();
        assert_eq!(Principal::from(claims), alice());
    }

    #[test]
    fn unrepresentable_lifetimes_are_refused() {
        for hours in [10_000_000_000_000, i64::MAX as u64 + 1, u64::MAX] {
            assert!(
                matches!(issue_token(&alice(), "s3cret", hours), Err(JwtError::TokenGeneration(_))),
                "{} hours",
                hours
            );
        }
    }

    #[test]
    fn long_lifetime_expires_in_the_future() {
        let claims = Claims::new(&alice(), 24 * 365 * 100).unwrap();
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&alice(), "s3cret", 1).unwrap();
        assert!(matches!(validate_jwt(&token, "other"), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(issue_token(&alice(), "", 1), Err(JwtError::InvalidSecret)));
    }
}
