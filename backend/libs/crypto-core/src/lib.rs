//! Shared cryptographic primitives for Nova services.
//!
//! - `jwt`: symmetric (HS256) session token signing and verification

pub mod jwt;

pub use jwt::{SessionClaims, SessionKeys, TokenError};
