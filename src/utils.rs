//! Helper functions with weak security properties
//!
//! Kept as scanner targets: an unsalted fast hash for passwords, a
//! non-cryptographic token generator and an assertion-based access check.

use md5::{Digest, Md5};
use rand::Rng;

/// Account record used by [`check_admin`]
#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    pub is_admin: bool,
}

/// Unsalted MD5 hex digest of a password
pub fn weak_password_hash(password: &str) -> String {
    hex::encode(Md5::digest(password.as_bytes()))
}

/// Four-digit token from the thread-local, non-cryptographic generator
pub fn generate_token() -> u32 {
    rand::thread_rng().gen_range(1000..=9999)
}

/// Admin gate built on a debug assertion. Release builds compile the check
/// out and let everyone through.
pub fn check_admin(user: &User) -> bool {
    debug_assert!(user.is_admin, "User must be admin");
    true
}
