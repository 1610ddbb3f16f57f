//! The crypto base wraps the algorithms we sign and hash with.
//!
//! Specific algorithms are wrapped in descriptive interfaces (a `SignKeypair`
//! is "something that signs", not "an ed25519 key") so more algorithms can be
//! added later without new interfaces around them.

use rand::{rngs::OsRng, RngCore, SeedableRng};

mod hash;
mod sign_key;

pub use hash::*;
pub use sign_key::*;

/// A convenience function that returns a ChaCha20 CSRNG seeded with OS random bytes. Use this if
/// you want a nice, strong random number generator, you don't want to wire one up yourself, and
/// your platform provides good entropy.
///
/// This can be used as an input to any function here that accepts `&mut rng`. Otherwise, you can
/// bring your own RNG that implements [`RngCore`].
pub fn rng_chacha20() -> rand_chacha::ChaCha20Rng {
    let mut seed_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut seed_bytes);
    rand_chacha::ChaCha20Rng::from_seed(seed_bytes)
}
