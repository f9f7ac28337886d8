use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime of an issued session token.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Malformed, expired or forged. Deliberately carries no reason.
#[derive(Debug, Error)]
#[error("invalid token")]
pub struct InvalidToken;

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            ttl,
        }
    }

    /// Signs a fresh token for the given identity, valid for the configured TTL.
    pub fn issue(
        &self,
        subject: &str,
        email: &str,
        role: &str,
    ) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {:?}", e.kind());
                InvalidToken
            })?;

        // jsonwebtoken still accepts exp == now; a token is valid only while now < exp.
        if claims.exp <= Utc::now().timestamp() {
            tracing::debug!("Token verification failed: expired");
            return Err(InvalidToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_issue_then_verify_round_trips_claims() {
        let tokens = TokenService::new(SECRET);
        let (token, issued) = tokens.issue("a1", "owner@example.com", "admin").unwrap();
        let verified = tokens.verify(&token).unwrap();
        assert_eq!(verified, issued);
        assert_eq!(verified.exp - verified.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let tokens = TokenService::new(SECRET);
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                sub: "a1".to_string(),
                email: "owner@example.com".to_string(),
                role: "admin".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_token_expiring_now_is_invalid() {
        let tokens = TokenService::new(SECRET);
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                sub: "a1".to_string(),
                email: "owner@example.com".to_string(),
                role: "admin".to_string(),
                iat: now - 10,
                exp: now,
            })
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let (token, _) = TokenService::new("other-secret")
            .issue("a1", "owner@example.com", "admin")
            .unwrap();
        assert!(TokenService::new(SECRET).verify(&token).is_err());
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let tokens = TokenService::new(SECRET);
        let (token, _) = tokens.issue("a1", "owner@example.com", "admin").unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = tokens
            .issue("a1", "owner@example.com", "super_admin")
            .unwrap()
            .0;
        // Swap in the payload of a different token but keep the old signature.
        parts[1] = forged.split('.').nth(1).unwrap().to_string();
        assert!(tokens.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(TokenService::new(SECRET).verify("invalid.jwt.token").is_err());
    }
}
