/// Password hashing and verification using Argon2id
use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::OnceCell;

/// Hash compared against when a login names an unknown user, so both paths
/// pay the same Argon2 cost.
static DUMMY_HASH: OnceCell<String> = OnceCell::new();

/// Hash a password using Argon2id
///
/// ## Security
///
/// - Algorithm: Argon2id, default parameters (m=19456 KiB, t=2, p=1)
/// - Salt: random 16-byte salt per password
///
/// ## Returns
///
/// PHC-formatted hash string safe for database storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its PHC hash (constant-time comparison)
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Process-wide stand-in hash for unknown users
pub fn dummy_hash() -> Result<&'static str> {
    DUMMY_HASH
        .get_or_try_init(|| hash_password("nova-post-service-dummy-password"))
        .map(String::as_str)
}

/// Compute the dummy hash now so the first unknown-user login costs the same
/// as every later one. Called once at startup.
pub fn warm_dummy_hash() -> Result<()> {
    let started = std::time::Instant::now();
    dummy_hash()?;
    tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "dummy hash ready");
    Ok(())
}

/// `hash_password` on the blocking pool
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// `verify_password` on the blocking pool
pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash)).await?
}
