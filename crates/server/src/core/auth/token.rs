//! Bearer token signing and verification
//!
//! Tokens are HS256 JWTs whose `sub` claim is the user id. The secret is
//! loaded once at startup and held by the signer for the life of the process.

use anyhow::{anyhow, bail, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Upper bound on the configured token lifetime
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    /// Fails unless `ttl_days` is within `1..=MAX_TOKEN_TTL_DAYS`
    pub fn new(secret: &str, ttl_days: i64) -> Result<Self> {
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&ttl_days) {
            bail!("Token lifetime must be between 1 and {MAX_TOKEN_TTL_DAYS} days, got {ttl_days}");
        }
        let ttl = Duration::try_days(ttl_days)
            .ok_or_else(|| anyhow!("Token lifetime of {ttl_days} days is out of range"))?;

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Sign a token for `user_id` with the configured lifetime
    pub fn issue(&self, user_id: &str) -> Result<String> {
        self.issue_with_ttl(user_id, self.ttl)
    }

    pub(crate) fn issue_with_ttl(&self, user_id: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow!("Token expiry overflows the calendar"))?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to sign token: {e}"))
    }

    /// Check signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| anyhow!("Token validation failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify_returns_subject() {
        let signer = TokenSigner::new("test-secret", 30).unwrap();
        let token = signer.issue("user-123").unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let signer = TokenSigner::new("test-secret", 30).unwrap();
        let other = TokenSigner::new("other-secret", 30).unwrap();
        let token = other.issue("user-123").unwrap();

        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let signer = TokenSigner::new("test-secret", 30).unwrap();
        let token = signer
            .issue_with_ttl("user-123", Duration::hours(-2))
            .unwrap();

        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let signer = TokenSigner::new("test-secret", 30).unwrap();
        assert!(signer.verify("not.a.token").is_err());
        assert!(signer.verify("").is_err());
    }

    #[test]
    fn test_rejects_out_of_range_lifetimes() {
        for days in [0, -1, MAX_TOKEN_TTL_DAYS + 1, 100_000_000] {
            assert!(TokenSigner::new("test-secret", days).is_err(), "{days}");
        }
        assert!(TokenSigner::new("test-secret", MAX_TOKEN_TTL_DAYS).is_ok());
    }

    #[test]
    fn test_overflowing_expiry_is_an_error() {
        let signer = TokenSigner::new("test-secret", 30).unwrap();
        let huge = Duration::try_days(100_000_000).unwrap();

        assert!(signer.issue_with_ttl("user-123", huge).is_err());
    }
}
