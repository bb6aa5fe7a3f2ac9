//! Salted SHA-256 implementation of the password hashing port.
//!
//! Stored form is `<salt hex>$<digest hex>`, where the digest covers the salt
//! followed by the UTF-8 password bytes.

use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

const SALT_BYTES: usize = 16;

/// Salted SHA-256 password hasher.
///
/// # Examples
/// ```
/// use user_service::domain::ports::PasswordHasher;
/// use user_service::outbound::security::Sha256PasswordHasher;
///
/// let hasher = Sha256PasswordHasher::new();
/// let stored = hasher.hash("s3cret").expect("hashes");
/// assert!(hasher.verify("s3cret", &stored));
/// assert!(!hasher.verify("guess", &stored));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl Sha256PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

fn digest(salt: &[u8], plaintext: &str) -> Zeroizing<Vec<u8>> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(plaintext.as_bytes());
    Zeroizing::new(hasher.finalize().to_vec())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0_u8, |acc, (l, r)| acc | (l ^ r))
            == 0
}

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        let mut salt = [0_u8; SALT_BYTES];
        rand::thread_rng()
            .try_fill_bytes(&mut salt)
            .map_err(|err| PasswordHashError::hashing(err.to_string()))?;
        let digest = digest(&salt, plaintext);
        Ok(format!("{}${}", hex::encode(salt), hex::encode(digest.as_slice())))
    }

    fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
            return false;
        };
        constant_time_eq(digest(&salt, plaintext).as_slice(), &expected)
    }
}
