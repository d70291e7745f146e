use auth::Argon2Hasher;
use auth::PasswordError;

use crate::domain::authentication::ports::PasswordHasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Argon2Hasher::hash(self, password)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        Argon2Hasher::verify(self, password, hash)
    }
}
