//! Stateless session tokens.
//!
//! Tokens are HS256 JWTs carrying the user id in `sub`. Nothing is stored
//! server-side; a token is valid as long as its signature checks out and `exp`
//! has not passed. Whether the user still exists is checked by the auth gate.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Generate a random signing secret (hex encoded, 256 bits)
pub fn generate_secret() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Mints and verifies bearer tokens
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user_id` expiring after the configured window
    pub fn issue(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or(ErrorKind::InvalidToken)?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Resolve a token to the user id it was issued for.
    ///
    /// Malformed, tampered and expired tokens all yield `None`; the cause is
    /// logged at debug level only.
    pub fn verify(&self, token: &str) -> Option<String> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                None
            }
        }
    }
}
