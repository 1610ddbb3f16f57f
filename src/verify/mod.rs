//! Checking claims.
//!
//! A signature alone only proves that an account *said* something. For some
//! kinds of claim that's all there is to check (nobody can prove or disprove
//! a display name). Others need evidence from outside the document:
//!
//! - a [domain] claim needs a TXT record, published at the domain, that only
//!   the claimant would know to publish
//! - an [account linkage][linkage] claim needs the other account to have made
//!   the same claim about us
//!
//! The [ClaimVerifier] runs the signature check and then whichever external
//! check the claim's kind calls for, going through the [DnsResolver] and
//! [PeerFetcher] it was built with. Every external call is bounded by a
//! timeout and retried (a limited number of times) if it failed for a reason
//! that might go away.
//!
//! Verification only reads. The verifier keeps no state between calls, so
//! any number of verifications can run at once, and dropping one partway
//! through (cancelling it) leaves nothing behind.

pub mod domain;
pub mod linkage;

use crate::{
    error::Result,
    identity::{
        address::Address,
        claim::{Claim, ClaimKind, ClaimSpec},
        document::MetadataDocument,
    },
    resolve::{DnsResolver, PeerFetcher, ResolverError},
    util::ser,
};
use futures::future::join_all;
use getset;
use serde_derive::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Knobs for the verifier's external lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, getset::Getters)]
#[serde(default)]
#[getset(get = "pub")]
pub struct VerifierConfig {
    /// How long a single DNS lookup or document fetch may take, in
    /// milliseconds.
    lookup_timeout_ms: u64,
    /// How many extra attempts a lookup gets after a transient failure.
    retries: u32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 5000,
            retries: 1,
        }
    }
}

impl VerifierConfig {
    /// Timeouts too long to fit in milliseconds are clamped, not wrapped.
    pub fn new(lookup_timeout: Duration, retries: u32) -> Self {
        Self {
            lookup_timeout_ms: u64::try_from(lookup_timeout.as_millis()).unwrap_or(u64::MAX),
            retries,
        }
    }

    /// Load a config from YAML. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        ser::deserialize_text(yaml.as_bytes())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Why a claim's external proof didn't hold up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofFailure {
    /// None of the TXT records at the proof hostname held the expected token.
    #[error("no TXT record at {hostname} contains {expected}")]
    TokenMissing { hostname: String, expected: String },

    /// A DNS lookup or document fetch failed.
    #[error("lookup failed: {0}")]
    Lookup(ResolverError),

    /// We asked for one account's document and got someone else's.
    #[error("asked for {expected}'s document but got {found}'s")]
    PeerOwnerMismatch { expected: Address, found: Address },

    /// The linked account has no account claims at all.
    #[error("{0} has not linked to any account")]
    ReciprocalMissing(Address),

    /// The linked account has account claims, but none point back at us.
    #[error("{0} links to other accounts, but not this one")]
    ReciprocalMismatch(Address),

    /// The linked account's claim pointing back at us isn't signed by it.
    #[error("{0}'s claim linking back is not validly signed")]
    ReciprocalSignatureInvalid(Address),

    /// An account claimed to be linked to itself.
    #[error("an account cannot link to itself")]
    SelfLinkage,
}

impl ProofFailure {
    /// Whether verifying again later might succeed without anyone changing
    /// anything (the failure was a flaky lookup, not a bad proof).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Lookup(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// The outcome of verifying one claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// The claim is signed by the document owner, and any external proof it
    /// needs checks out.
    Valid,
    /// The claim is not signed by the document owner.
    InvalidSignature,
    /// The claim is signed, but its external proof failed.
    ExternalProofFailed(ProofFailure),
    /// The claim is signed, but we don't know how to check this kind.
    Unsupported(ClaimKind),
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::InvalidSignature => write!(f, "invalid signature"),
            Self::ExternalProofFailed(reason) => write!(f, "external proof failed: {}", reason),
            Self::Unsupported(kind) => write!(f, "unsupported claim kind {}", kind),
        }
    }
}

impl From<ProofFailure> for VerificationResult {
    fn from(reason: ProofFailure) -> Self {
        Self::ExternalProofFailed(reason)
    }
}

/// Verifies claims against a document, using the given adapters for the
/// outside world.
#[derive(Debug, getset::Getters)]
#[getset(get = "pub")]
pub struct ClaimVerifier<D, P> {
    dns: D,
    peers: P,
    config: VerifierConfig,
}

impl<D: DnsResolver, P: PeerFetcher> ClaimVerifier<D, P> {
    pub fn new(dns: D, peers: P) -> Self {
        Self::with_config(dns, peers, VerifierConfig::default())
    }

    pub fn with_config(dns: D, peers: P, config: VerifierConfig) -> Self {
        Self { dns, peers, config }
    }

    /// Verify one claim as made by `document`'s owner.
    ///
    /// The signature is always checked first: a claim with a bad signature is
    /// `InvalidSignature` no matter its kind, and no lookups are made for it.
    pub async fn verify(&self, document: &MetadataDocument, claim: &Claim) -> VerificationResult {
        let owner = document.owner();
        let result = if !claim.verify_signature(owner) {
            VerificationResult::InvalidSignature
        } else {
            match claim.spec() {
                ClaimSpec::Name(_) => VerificationResult::Valid,
                ClaimSpec::Domain(name) => domain::verify(self, owner, claim.timestamp(), name).await,
                ClaimSpec::AccountLinkage(target) => linkage::verify(self, owner, target).await,
                ClaimSpec::Unknown { .. } => VerificationResult::Unsupported(claim.kind()),
            }
        };
        debug!(%owner, kind = %claim.kind(), %result, "verified claim");
        result
    }

    /// Verify every claim in a document. Claims are checked concurrently; the
    /// results come back in the same order as the document's claims.
    pub async fn verify_document(&self, document: &MetadataDocument) -> Vec<VerificationResult> {
        join_all(document.claims().iter().map(|claim| self.verify(document, claim))).await
    }

    /// Run an external lookup under the configured timeout, retrying
    /// transient failures.
    pub(crate) async fn lookup<T, F, Fut>(&self, what: &str, mut op: F) -> std::result::Result<T, ResolverError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ResolverError>>,
    {
        let timeout = self.config.lookup_timeout();
        let mut attempt = 0;
        loop {
            let res = match tokio::time::timeout(timeout, op()).await {
                Ok(res) => res,
                Err(_) => Err(ResolverError::Timeout(timeout)),
            };
            match res {
                Err(err) if err.is_transient() && attempt < self.config.retries => {
                    attempt += 1;
                    warn!(what, attempt, %err, "lookup failed, retrying");
                }
                res => return res,
            }
        }
    }
}
