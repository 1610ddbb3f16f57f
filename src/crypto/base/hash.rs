use rasn::{AsnType, Decode, Encode};
use serde_derive::{Deserialize, Serialize};

/// A cryptographic hash. By defining this as an enum, we allow expansion of
/// hash algorithms in the future.
#[derive(Clone, Debug, PartialEq, Eq, Hash, AsnType, Encode, Decode, Serialize, Deserialize)]
#[rasn(choice)]
pub enum Hash {
    /// Blake3 256bit hash
    #[rasn(tag(explicit(0)))]
    Blake3(#[serde(with = "crate::util::ser::human_bytes")] [u8; 32]),
}

impl Hash {
    /// Create a new blake3 hash from a message
    pub fn new_blake3(message: &[u8]) -> Self {
        Self::Blake3(*blake3::hash(message).as_bytes())
    }

    /// Derive a blake3 hash from some key material, scoped to a context
    /// string. Two different contexts never produce the same output for the
    /// same material.
    pub fn new_blake3_derived(context: &str, material: &[u8]) -> Self {
        Self::Blake3(blake3::derive_key(context, material))
    }

    /// Return the byte slice representing this hash.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Blake3(bin) => &bin[..],
        }
    }
}
