/// Credential service - user registration and password verification
use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::metrics::{outcome, AUTH_ATTEMPTS};
use crate::models::{NewUser, User};
use crate::security::password::{dummy_hash, hash_password_blocking, verify_password_blocking};
use chrono::NaiveDate;
use std::sync::Arc;

/// Validated registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    pub gender: String,
    pub birth_date: NaiveDate,
}

#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserStore>,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Create an account. Username and email are checked together in one
    /// lookup; the store's unique constraints catch anything that races past it.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        let result = self.register_inner(registration).await;
        AUTH_ATTEMPTS
            .with_label_values(&["register", outcome(&result)])
            .inc();
        result
    }

    async fn register_inner(&self, registration: Registration) -> Result<User> {
        let Registration {
            username,
            password,
            email,
            gender,
            birth_date,
        } = registration;

        if self
            .users
            .find_by_username_or_email(&username, &email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(password).await?;

        let user = self
            .users
            .insert_user(&NewUser {
                username,
                email,
                password_hash,
                gender,
                birth_date,
            })
            .await
            .map_err(|e| {
                if e.is_internal() {
                    tracing::error!(error = %e, "user insert failed");
                }
                e
            })?;

        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Check a username/password pair.
    ///
    /// The Argon2 comparison runs whether or not the user exists (against a
    /// dummy hash for unknown names), so timing does not reveal which
    /// usernames are registered.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User> {
        let result = self.verify_inner(username, password).await;
        AUTH_ATTEMPTS
            .with_label_values(&["login", outcome(&result)])
            .inc();
        result
    }

    async fn verify_inner(&self, username: &str, password: &str) -> Result<User> {
        let user = self.users.find_by_username(username).await?;

        let stored_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => dummy_hash()?.to_string(),
        };
        let matches = verify_password_blocking(password.to_string(), stored_hash).await?;

        match user {
            None => Err(AppError::UserNotFound),
            Some(_) if !matches => Err(AppError::InvalidCredentials),
            Some(user) => Ok(user),
        }
    }
}
