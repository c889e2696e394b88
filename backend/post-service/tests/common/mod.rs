//! Shared fixtures for post-service integration tests
#![allow(dead_code)]

pub mod memory_store;

use chrono::Duration;
use memory_store::MemoryStore;
use post_service::middleware::SessionCookie;
use post_service::services::SessionIssuer;
use post_service::AppServices;
use std::sync::Arc;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789";

pub fn session_issuer() -> SessionIssuer {
    SessionIssuer::new(TEST_SECRET, Duration::days(7)).expect("test secret is non-empty")
}

/// Services over a fresh in-memory store; the store handle is returned for
/// assertions on rows the API does not expose.
pub fn memory_services() -> (AppServices, MemoryStore) {
    let store = MemoryStore::new();
    let issuer = session_issuer();
    let cookie = SessionCookie::new("token", false, issuer.ttl().num_seconds());
    let services = AppServices::new(Arc::new(store.clone()), issuer, cookie);
    (services, store)
}
