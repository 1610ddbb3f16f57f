//! Interfaces to the outside world.
//!
//! Nothing in this crate talks to a chain, a filesystem, DNS, or the network
//! directly. Instead, callers hand in implementations of these traits. This
//! keeps verification a pure function of the document, the claim, and
//! whatever the adapters answer, and lets tests swap in canned answers (see
//! [memory]).
//!
//! Lookups that may block on the network ([DnsResolver], [PeerFetcher]) are
//! async. The verifier applies its own timeouts around them, so
//! implementations don't need to.

pub mod memory;

use crate::{
    crypto::base::SignKeypairPublic,
    error::Result,
    identity::{address::Address, document::MetadataDocument},
};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Why an adapter could not answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// The thing asked for definitively does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The lookup itself failed (network down, SERVFAIL, etc). Worth trying
    /// again.
    #[error("resolution failed: {0}")]
    Resolution(String),

    /// An answer came back, but it's unusable (a document that doesn't
    /// parse or whose signatures don't check out). Asking again gets the
    /// same answer.
    #[error("malformed answer: {0}")]
    Malformed(String),

    /// The lookup didn't answer in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ResolverError {
    /// Whether trying again might give a different answer.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Malformed(_) => false,
            Self::Resolution(_) | Self::Timeout(_) => true,
        }
    }
}

/// Looks up the public key an account has registered (on chain, usually).
pub trait KeyResolver: Send + Sync {
    fn public_key(&self, address: &Address) -> std::result::Result<SignKeypairPublic, ResolverError>;
}

/// Somewhere to keep serialized documents. Locators are opaque to us (a
/// path, a URL, a database key...).
pub trait Storage: Send + Sync {
    /// Read back the bytes stored at `locator`.
    fn read_bytes(&self, locator: &str) -> Result<Vec<u8>>;

    /// Store `bytes` at `locator`, replacing whatever was there.
    fn write_bytes(&self, locator: &str, bytes: &[u8]) -> Result<()>;
}

/// Reads DNS TXT records.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Return every TXT string published at `hostname`. A hostname with no
    /// TXT records is `NotFound`.
    async fn lookup_txt(&self, hostname: &str) -> std::result::Result<Vec<String>, ResolverError>;
}

/// Fetches the metadata document another account has published.
///
/// Implementations should only return documents that loaded cleanly (ie,
/// through [MetadataDocument::load_from]); the verifier re-checks the claims
/// it relies on regardless.
#[async_trait]
pub trait PeerFetcher: Send + Sync {
    async fn fetch_document(&self, address: &Address) -> std::result::Result<MetadataDocument, ResolverError>;
}
