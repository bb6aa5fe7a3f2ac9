//! Driven port for one-way password transforms.

use super::define_port_error;

define_port_error! {
    /// Errors raised while hashing.
    pub enum PasswordHashError {
        /// The hasher could not produce a digest.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// One-way password transform with verification.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError>;

    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}
