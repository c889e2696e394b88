/// Security primitives: password hashing
pub mod password;

pub use password::{hash_password, verify_password, warm_dummy_hash};
