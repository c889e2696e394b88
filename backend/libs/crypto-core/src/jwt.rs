/// Session token signing and validation
///
/// Tokens are compact JWTs signed with HS256 using a single process-wide
/// secret. The secret is handed to [`SessionKeys::from_secret`] once at
/// startup and never changes afterwards; rotating it invalidates every
/// outstanding token.
///
/// ## Security Design
///
/// - **HS256 ONLY**: the validator accepts no other algorithm
/// - **No hardcoded keys**: callers must supply the secret (empty secrets are rejected)
/// - **Stateless**: validity is proven by signature + expiry alone
///
/// ## Usage
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use crypto_core::jwt::SessionKeys;
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Subject { id: i64 }
///
/// let keys = SessionKeys::from_secret(b"0123456789abcdef0123456789abcdef").unwrap();
/// let token = keys.sign(&Subject { id: 7 }, Utc::now(), Duration::days(7)).unwrap();
/// let claims = keys.verify::<Subject>(&token).unwrap();
/// assert_eq!(claims.subject.id, 7);
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Signing algorithm for all session tokens
const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Secrets shorter than this are accepted but should be rejected by
/// production configuration.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("token expired")]
    Expired,

    #[error("token validation failed: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Registered timing claims plus the caller's subject payload, flattened
/// into the same JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims<T> {
    #[serde(flatten)]
    pub subject: T,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Signing and verification keys derived from one shared secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("algorithm", &SESSION_ALGORITHM)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SessionKeys {
    pub fn from_secret(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Sign `subject` into a token valid from `issued_at` for `ttl`.
    pub fn sign<T: Serialize>(
        &self,
        subject: &T,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims {
            subject,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };

        encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check signature and expiry, then decode the embedded subject.
    ///
    /// ## Errors
    ///
    /// - `TokenError::Expired` when `exp` is in the past
    /// - `TokenError::Invalid` for bad signatures, wrong algorithms and
    ///   malformed tokens
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<SessionClaims<T>, TokenError> {
        decode::<SessionClaims<T>>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
