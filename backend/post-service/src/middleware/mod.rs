/// Request authentication for post-service
///
/// Handlers that need a signed-in user take an [`AuthenticatedUser`]
/// argument. Extraction reads the session cookie (falling back to an
/// `Authorization: Bearer` header) and validates it with the shared
/// [`SessionIssuer`]; failures short-circuit the request with 401/403.
use crate::error::{AppError, Result};
use crate::models::Identity;
use crate::services::SessionIssuer;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

pub const DEFAULT_COOKIE_NAME: &str = "token";

/// Identity resolved from the request's session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate_request(req).map(AuthenticatedUser))
    }
}

fn authenticate_request(req: &HttpRequest) -> Result<Identity> {
    let issuer = req
        .app_data::<web::Data<SessionIssuer>>()
        .ok_or_else(|| AppError::Internal("SessionIssuer missing from app data".to_string()))?;

    let cookie_name = req
        .app_data::<web::Data<SessionCookie>>()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());

    let token = req
        .cookie(&cookie_name)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(req));

    issuer.authenticate(token.as_deref())
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

// =====================================================================
// Session cookie
// =====================================================================

/// Attributes of the httpOnly cookie that carries the session token.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool, max_age_secs: i64) -> Self {
        Self {
            name: name.into(),
            secure,
            max_age_secs,
        }
    }

    /// Cookie holding a freshly issued token
    pub fn issue(&self, token: String) -> Cookie<'static> {
        Cookie::build(self.name.clone(), token)
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::seconds(self.max_age_secs))
            .finish()
    }

    /// Expired, empty cookie that makes the client drop the session
    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.name.clone(), "")
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::{Duration, NaiveDate, Utc};

    fn issuer() -> SessionIssuer {
        SessionIssuer::new("middleware-test-secret-middleware", Duration::days(7)).unwrap()
    }

    fn token(issuer: &SessionIssuer) -> String {
        let user = crate::models::User {
            id: 5,
            username: "bob".to_string(),
            email: "b@x.com".to_string(),
            password_hash: String::new(),
            gender: "male".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1988, 1, 2).unwrap(),
            created_at: Utc::now(),
        };
        issuer.issue(&user).unwrap()
    }

    #[test]
    fn test_cookie_token_accepted() {
        let issuer = issuer();
        let token = token(&issuer);
        let req = TestRequest::default()
            .app_data(web::Data::new(issuer))
            .cookie(Cookie::new("token", token))
            .to_http_request();

        let identity = authenticate_request(&req).unwrap();
        assert_eq!(identity.id, 5);
        assert_eq!(identity.username, "bob");
    }

    #[test]
    fn test_bearer_header_accepted() {
        let issuer = issuer();
        let token = token(&issuer);
        let req = TestRequest::default()
            .app_data(web::Data::new(issuer))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        assert_eq!(authenticate_request(&req).unwrap().id, 5);
    }

    #[test]
    fn test_custom_cookie_name() {
        let issuer = issuer();
        let token = token(&issuer);
        let req = TestRequest::default()
            .app_data(web::Data::new(issuer))
            .app_data(web::Data::new(SessionCookie::new("sid", false, 60)))
            .cookie(Cookie::new("sid", token))
            .to_http_request();

        assert!(authenticate_request(&req).is_ok());
    }

    #[test]
    fn test_missing_token() {
        let req = TestRequest::default()
            .app_data(web::Data::new(issuer()))
            .to_http_request();

        assert!(matches!(
            authenticate_request(&req),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn test_garbage_token() {
        let req = TestRequest::default()
            .app_data(web::Data::new(issuer()))
            .cookie(Cookie::new("token", "not-a-jwt"))
            .to_http_request();

        assert!(matches!(
            authenticate_request(&req),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_cookie_attributes() {
        let settings = SessionCookie::new("token", true, 3600);
        let cookie = settings.issue("abc".to_string());
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));

        let removal = settings.removal();
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(CookieDuration::ZERO));
    }
}
