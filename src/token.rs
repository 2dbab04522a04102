//! Signed, time-bounded session tokens.
//!
//! ## Format
//!
//! ```text
//! hex(payload_json) "." hex(HMAC-SHA256(secret, hex(payload_json)))
//! ```
//!
//! The payload carries `{userEmail, userId, iat, exp}` with timestamps in
//! seconds since the Unix epoch. There is no revocation list: a token stays
//! valid until `exp`, and logout only clears the client cookie.
//!
//! Without the service secret a token cannot be forged, and flipping any
//! byte of the payload or the MAC makes verification fail.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

use crate::types::Identity;

type HmacSha256 = Hmac<Sha256>;

/// Validity window of an issued token.
pub const TOKEN_TTL_HOURS: i64 = 24;

const SEPARATOR: char = '.';

/// Reasons a token fails verification.
///
/// All of these surface as `401 unauthorized` at the HTTP edge; the
/// distinction only exists for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Missing separator or non-hex encoding.
    #[error("Malformed token")]
    Malformed,
    /// MAC does not match the payload.
    #[error("Token signature mismatch")]
    BadSignature,
    /// Signature is valid but the payload is not a claims object.
    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),
    /// The token's `exp` is not after the verification time.
    #[error("Token expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identity the token was issued for.
    #[serde(flatten)]
    pub identity: Identity,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// An encoded session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token string received from a client.
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Get the token as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service with the standard 24 hour validity window.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
    }

    /// Create a token service with a custom validity window.
    pub fn with_ttl(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Validity window of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `identity`, valid from now.
    pub fn issue(&self, identity: &Identity) -> SessionToken {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> SessionToken {
        let claims = TokenClaims {
            identity: identity.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        // Serializing two strings and two integers cannot fail
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let encoded = hex::encode(payload);
        let signature = hex::encode(self.sign(encoded.as_bytes()));
        SessionToken(format!("{encoded}{SEPARATOR}{signature}"))
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &SessionToken) -> Result<Identity, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Identity, TokenError> {
        let claims = self.decode(token)?;
        if claims.exp <= now.timestamp() {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_default();
            return Err(TokenError::Expired(expired_at));
        }
        Ok(claims.identity)
    }

    /// Check the signature and decode the claims without checking expiry.
    pub fn decode(&self, token: &SessionToken) -> Result<TokenClaims, TokenError> {
        let (encoded, signature) = token
            .as_str()
            .split_once(SEPARATOR)
            .ok_or(TokenError::Malformed)?;
        // Only the lowercase encoding is accepted, so each token has one spelling
        if signature.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(TokenError::Malformed);
        }
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        // Constant-time comparison
        self.mac(encoded.as_bytes())
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = hex::decode(encoded).map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&payload).map_err(|e| TokenError::InvalidClaims(e.to_string()))
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.mac(data).finalize().into_bytes().to_vec()
    }

    fn mac(&self, data: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts any key size");
        mac.update(data);
        mac
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}
