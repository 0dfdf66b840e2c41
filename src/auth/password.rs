//! Password verification
//!
//! Stored credentials are compared by exact equality, which keeps existing
//! plaintext seed data working. A stored value of the form `sha256:<hex>` is
//! instead compared in constant time against the SHA-256 digest of the
//! supplied password.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SHA256_PREFIX: &str = "sha256:";

/// Check a supplied password against the stored credential.
pub fn verify_password(stored: &str, supplied: &str) -> bool {
    match stored.strip_prefix(SHA256_PREFIX) {
        Some(digest) => digest_matches(digest, supplied),
        None => stored == supplied,
    }
}

/// A stored digest that is not valid hex never matches
fn digest_matches(stored_hex: &str, supplied: &str) -> bool {
    let Ok(expected) = hex::decode(stored_hex) else {
        return false;
    };
    let actual = Sha256::digest(supplied.as_bytes());
    actual.as_slice().ct_eq(&expected).into()
}

/// Produce a `sha256:<hex>` credential suitable for the customers file.
pub fn hash_password(plain: &str) -> String {
    format!("{SHA256_PREFIX}{}", sha256_hex(plain))
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
