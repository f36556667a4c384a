use crate::error::{AppError, AuthError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub exp: i64,     // Expiration time
    pub iat: i64,     // Issued at
}

/// Issues and validates HS256-signed identity tokens.
///
/// Stateless by design: validation checks only signature and expiry, never
/// the database.
pub struct TokenService {
    jwt_secret: String,
    token_expiry_hours: i64,
}

impl TokenService {
    pub fn new(jwt_secret: String, token_expiry_hours: i64) -> Self {
        Self {
            jwt_secret,
            token_expiry_hours,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.token_expiry_hours)).timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalError(format!("Token creation failed: {}", e)))
    }

    /// Signature mismatch, structural malformation and expiry all collapse
    /// into `InvalidToken`; the caller decides how much detail to surface.
    pub fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let sub = data.claims.sub;
        if sub.is_empty() {
            return Err(AuthError::InvalidSubject);
        }

        Uuid::parse_str(&sub).map_err(|_| AuthError::InvalidSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test_secret".to_string(), 24)
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id).unwrap();
        let validated = tokens.validate(&token).unwrap();

        assert_eq!(validated, user_id);
    }

    #[test]
    fn test_token_binds_subject() {
        let tokens = service();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        let token = tokens.issue(user_a).unwrap();
        let validated = tokens.validate(&token).unwrap();

        assert_ne!(validated, user_b);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative expiry puts `exp` well past the default leeway.
        let tokens = TokenService::new("test_secret".to_string(), -1);
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        match tokens.validate(&token) {
            Err(AuthError::InvalidToken(_)) => (),
            other => panic!("Expected invalid token, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        let other = TokenService::new("another_secret".to_string(), 24);
        match other.validate(&token) {
            Err(AuthError::InvalidToken(_)) => (),
            other => panic!("Expected invalid token, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = service();
        match tokens.validate("not.a.jwt") {
            Err(AuthError::InvalidToken(_)) => (),
            other => panic!("Expected invalid token, got {:?}", other),
        }
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let tokens = service();
        let claims = Claims {
            sub: "42".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test_secret"),
        )
        .unwrap();

        match tokens.validate(&token) {
            Err(AuthError::InvalidSubject) => (),
            other => panic!("Expected invalid subject, got {:?}", other),
        }
    }
}
