/// Session issuer - stateless signed session tokens
///
/// A token embeds the user's public identity and an expiry. Validation is
/// purely local (signature + expiry); nothing is stored server-side, so a
/// password change does not invalidate tokens issued before it.
use crate::config::SessionConfig;
use crate::error::{AppError, Result};
use crate::models::{Identity, User};
use chrono::{DateTime, Duration, Utc};
use crypto_core::SessionKeys;

#[derive(Debug, Clone)]
pub struct SessionIssuer {
    keys: SessionKeys,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self> {
        let keys = SessionKeys::from_secret(secret.as_bytes())
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self { keys, ttl })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Self::new(&config.secret, Duration::days(config.ttl_days))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user`, valid for the configured TTL from now.
    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(&Identity::from(user), Utc::now())
    }

    fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String> {
        self.keys
            .sign(identity, issued_at, self.ttl)
            .map_err(|e| {
                tracing::error!(user_id = identity.id, error = %e, "session token signing failed");
                AppError::from(e)
            })
    }

    /// Resolve a raw token to the identity it carries.
    ///
    /// - no token (or an empty one): `Unauthenticated`
    /// - bad signature, expired or malformed: `Forbidden`
    pub fn authenticate(&self, raw_token: Option<&str>) -> Result<Identity> {
        let token = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let claims = self.keys.verify::<Identity>(token).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            AppError::from(e)
        })?;

        Ok(claims.subject)
    }
}
