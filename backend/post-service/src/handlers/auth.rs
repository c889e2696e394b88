/// Account and session handlers
use crate::error::Result;
use crate::middleware::{AuthenticatedUser, SessionCookie};
use crate::models::Identity;
use crate::services::{CredentialService, Registration, SessionIssuer};
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64, message = "username must be 1-64 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 256, message = "password must be 1-256 characters"))]
    pub password: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, max = 32, message = "gender must be 1-32 characters"))]
    pub gender: String,
    pub birth_date: NaiveDate,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Self {
            username: req.username,
            password: req.password,
            email: req.email,
            gender: req.gender,
            birth_date: req.birth_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// GET /
pub async fn welcome() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new("Welcome to the API"))
}

/// POST /register
pub async fn register(
    credentials: web::Data<CredentialService>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;

    let user = credentials.register(req.into()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /login
///
/// Sets the session cookie and also returns the token in the body for
/// clients that prefer the `Authorization` header.
pub async fn login(
    credentials: web::Data<CredentialService>,
    sessions: web::Data<SessionIssuer>,
    cookie: web::Data<SessionCookie>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let user = credentials.verify(&req.username, &req.password).await?;
    let token = sessions.issue(&user)?;
    tracing::info!(user_id = user.id, "session issued");

    Ok(HttpResponse::Ok()
        .cookie(cookie.issue(token.clone()))
        .json(LoginResponse { token }))
}

/// GET /info
pub async fn info(user: AuthenticatedUser) -> web::Json<Identity> {
    web::Json(user.0)
}

/// GET /logout
///
/// Clears the cookie on the client only; an already-issued token stays
/// valid until it expires.
pub async fn logout(cookie: web::Data<SessionCookie>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cookie.removal())
        .json(MessageResponse::new("Logged out"))
}
