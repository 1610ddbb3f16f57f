//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while building, loading, or storing claims.
//!
//! Note that claim *verification* does not fail with these errors: a claim
//! that doesn't verify is a perfectly normal outcome, and is reported as a
//! [VerificationResult][crate::verify::VerificationResult] instead.

use crate::resolve::ResolverError;
use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug)]
pub enum Error {
    /// A key is missing from a crypto operation (usually trying to sign with
    /// a keypair that only has its public half).
    #[error("crypto key missing")]
    CryptoKeyMissing,

    /// A signature failed to verify.
    #[error("the given signature/public key/data combo does not verify")]
    CryptoSignatureVerificationFailed,

    /// An address string could not be parsed.
    #[error("invalid address: {0}")]
    AddressInvalid(String),

    /// Input to a claim builder was rejected. `field` names the offending
    /// attribute.
    #[error("invalid claim {field}: {reason}")]
    ClaimValidation {
        field: &'static str,
        reason: String,
    },

    /// A claim was handed to a document it does not belong in (bad signature
    /// or signed by someone other than the document owner).
    #[error("claim rejected: {0}")]
    DocumentInvalidClaim(String),

    /// A document could not be loaded. Documents are never partially loaded:
    /// any bad claim rejects the whole thing.
    #[error("malformed document: {0}")]
    DocumentMalformed(String),

    /// An error while engaging in DER deserialization.
    #[error("deserialization error: {0}")]
    Deserialize(String),

    /// An error while decoding base64.
    #[error("deserialization error")]
    DeserializeBase64(#[from] base64::DecodeError),

    /// An error while engaging in DER serialization.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// An error while engaging in yaml serialization.
    #[error("yaml serialization error")]
    SerializeYaml(#[from] serde_yaml::Error),

    /// An external adapter (key lookup, DNS, peer fetch) failed.
    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Nothing is stored at the given locator.
    #[error("nothing stored at {0}")]
    StorageNotFound(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // serde_yaml::Error and friends are not comparable, so compare the
        // debug output instead.
        format!("{:?}", self) == format!("{:?}", other)
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;
