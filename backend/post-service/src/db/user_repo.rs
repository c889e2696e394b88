/// User database operations
use crate::error::Result;
use crate::models::{NewUser, User};
use sqlx::PgPool;

/// Single lookup covering both uniqueness keys used at registration
pub async fn find_by_username_or_email(
    pool: &PgPool,
    username: &str,
    email: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, gender, birth_date, created_at
        FROM users
        WHERE username = $1 OR email = $2
        LIMIT 1
        "#,
    )
    .bind(username)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, gender, birth_date, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Create a new user. UNIQUE(username) / UNIQUE(email) violations convert to
/// `AppError::Conflict` through `From<sqlx::Error>`.
pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, gender, birth_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, username, email, password_hash, gender, birth_date, created_at
        "#,
    )
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(&new_user.gender)
    .bind(new_user.birth_date)
    .fetch_one(pool)
    .await?;

    Ok(user)
}
