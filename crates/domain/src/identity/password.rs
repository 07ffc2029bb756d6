use sha2::{Digest, Sha256};

/// Hashes and verifies user passwords.
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password` salted with the user's security stamp.
    fn hash_password(&self, password: &str, security_stamp: &str) -> String;

    fn verify_password(&self, hash: &str, password: &str, security_stamp: &str) -> bool {
        constant_time_eq(
            self.hash_password(password, security_stamp).as_bytes(),
            hash.as_bytes(),
        )
    }
}

/// SHA-256 over `stamp:password`, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl PasswordHasher for Sha256PasswordHasher {
    fn hash_password(&self, password: &str, security_stamp: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(security_stamp.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
