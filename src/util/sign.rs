//! Includes some utilities helpful for generating signatures.

use crate::{error::Result, util::ser};

/// A trait that allows an object to return a signable representation of itself.
pub trait Signable {
    type Item: rasn::Encode;

    /// Return the unserialized data that will be signed for this item.
    fn signable(&self) -> Result<Self::Item>;

    /// Return the exact bytes that get signed for this item.
    fn signable_bytes(&self) -> Result<Vec<u8>> {
        ser::serialize(&self.signable()?)
    }
}
