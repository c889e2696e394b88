/// Service wiring shared by `main` and the integration tests
use crate::db::{PostStore, UserStore, ViewStore};
use crate::handlers;
use crate::middleware::SessionCookie;
use crate::services::{CredentialService, PostService, SessionIssuer, ViewRecorder};
use actix_web::web;
use std::sync::Arc;

/// Everything the request handlers pull out of app data
#[derive(Clone)]
pub struct AppServices {
    pub credentials: web::Data<CredentialService>,
    pub sessions: web::Data<SessionIssuer>,
    pub cookie: web::Data<SessionCookie>,
    pub posts: web::Data<PostService>,
}

impl AppServices {
    /// Build all services over one store implementing every persistence trait.
    pub fn new<S>(store: Arc<S>, sessions: SessionIssuer, cookie: SessionCookie) -> Self
    where
        S: UserStore + PostStore + ViewStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let posts: Arc<dyn PostStore> = store.clone();
        let views: Arc<dyn ViewStore> = store;

        Self {
            credentials: web::Data::new(CredentialService::new(users)),
            sessions: web::Data::new(sessions),
            cookie: web::Data::new(cookie),
            posts: web::Data::new(PostService::new(posts, ViewRecorder::new(views))),
        }
    }

    /// Register the services as app data and mount the API routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.credentials.clone())
            .app_data(self.sessions.clone())
            .app_data(self.cookie.clone())
            .app_data(self.posts.clone());
        handlers::configure(cfg);
    }
}
