use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Symbols a confirmation code is drawn from.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generator for short, human-typed confirmation codes.
///
/// Holds its own random source instead of reaching for a global one, so a
/// seeded generator yields a reproducible sequence. The generator makes no
/// uniqueness promise: callers persist codes behind a unique constraint and
/// treat a collision as a creation failure.
#[derive(Debug)]
pub struct ConfirmationCodeGenerator {
    rng: Mutex<StdRng>,
}

impl ConfirmationCodeGenerator {
    /// Create a generator around an explicit random source.
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Create a generator seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Create a deterministic generator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Produce a code of exactly `length` characters, each drawn uniformly
    /// from [`CODE_ALPHABET`].
    pub fn generate(&self, length: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());

        (0..length)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

impl Default for ConfirmationCodeGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
