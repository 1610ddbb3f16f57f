//! A metadata document is the full, ordered set of claims an account has made
//! about itself.
//!
//! Documents are append-only. Every claim in a document must be signed by
//! the document's owner, which is checked when a claim is added and again
//! (for every claim) whenever a document is loaded. A document that fails
//! any of these checks is rejected outright: we never hand back a document
//! with the bad claims quietly filtered out.

use crate::{
    error::{Error, Result},
    identity::{
        address::Address,
        claim::{Claim, ClaimKind, ClaimRecord},
    },
    resolve::{KeyResolver, Storage},
    util::ser,
};
use getset;
use rasn::{AsnType, Decode, Encode};
use serde_derive::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The document format version this library writes.
pub const DOCUMENT_VERSION: u32 = 1;

/// The persisted (DER) layout of a document.
#[derive(Debug, AsnType, Encode, Decode)]
struct DocumentRecord {
    #[rasn(tag(explicit(0)))]
    version: u32,
    #[rasn(tag(explicit(1)))]
    owner: Address,
    #[rasn(tag(explicit(2)))]
    claims: Vec<ClaimRecord>,
}

/// The text (YAML) layout of a document. Only used for reading: loading goes
/// through the same checks as the binary form.
#[derive(Debug, Deserialize)]
struct TextDocument {
    version: u32,
    owner: Address,
    claims: Vec<Claim>,
}

/// An account's signed claims, in the order they were made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, getset::Getters)]
#[getset(get = "pub")]
pub struct MetadataDocument {
    /// The account these claims are about. Every claim is signed by it.
    owner: Address,
    /// The format version this document was written with.
    version: u32,
    /// The claims, oldest first.
    claims: Vec<Claim>,
}

impl MetadataDocument {
    /// Create a document with no claims in it.
    pub fn create_empty(owner: Address) -> Self {
        Self {
            owner,
            version: DOCUMENT_VERSION,
            claims: Vec::new(),
        }
    }

    /// Assemble a document from parts read off the wire, checking the version
    /// and every claim's signature.
    fn validated(version: u32, owner: Address, claims: Vec<Claim>) -> Result<Self> {
        if version == 0 || version > DOCUMENT_VERSION {
            Err(Error::DocumentMalformed(format!(
                "unsupported document version {} (expected 1..={})",
                version, DOCUMENT_VERSION
            )))?;
        }
        for (idx, claim) in claims.iter().enumerate() {
            if !claim.verify_signature(&owner) {
                warn!(%owner, idx, kind = %claim.kind(), "rejecting document: claim signature does not verify");
                Err(Error::DocumentMalformed(format!(
                    "claim {} ({}) is not validly signed by {}",
                    idx,
                    claim.kind(),
                    owner
                )))?;
            }
        }
        debug!(%owner, version, claims = claims.len(), "loaded document");
        Ok(Self { owner, version, claims })
    }

    /// Load a document from its binary form.
    ///
    /// Fails with [Error::DocumentMalformed] if the bytes don't parse, the
    /// version isn't one we understand, or any claim is not signed by the
    /// owner.
    pub fn load_from(bytes: &[u8]) -> Result<Self> {
        let malformed = |e: Error| Error::DocumentMalformed(e.to_string());
        let record: DocumentRecord = ser::deserialize(bytes).map_err(malformed)?;
        let claims = record
            .claims
            .into_iter()
            .map(Claim::from_record)
            .collect::<Result<Vec<_>>>()
            .map_err(malformed)?;
        Self::validated(record.version, record.owner, claims)
    }

    /// Like [load_from][Self::load_from], but also requires every claim to be
    /// signed with the key the owner has registered (for instance, on chain).
    pub fn load_with_keys(bytes: &[u8], keys: &dyn KeyResolver) -> Result<Self> {
        let doc = Self::load_from(bytes)?;
        let registered = keys.public_key(doc.owner())?;
        if let Some(idx) = doc.claims().iter().position(|c| c.signature().key() != &registered) {
            warn!(owner = %doc.owner(), idx, "rejecting document: claim signed with an unregistered key");
            Err(Error::DocumentMalformed(format!(
                "claim {} is not signed with {}'s registered key",
                idx,
                doc.owner()
            )))?;
        }
        Ok(doc)
    }

    /// Load a document from its text (YAML) form.
    pub fn load_text(text: &str) -> Result<Self> {
        let malformed = |e: Error| Error::DocumentMalformed(e.to_string());
        let doc: TextDocument = ser::deserialize_text(text.as_bytes()).map_err(malformed)?;
        let claims = doc
            .claims
            .into_iter()
            .map(Claim::canonicalize)
            .collect::<Result<Vec<_>>>()
            .map_err(malformed)?;
        Self::validated(doc.version, doc.owner, claims)
    }

    /// Append a claim.
    ///
    /// The claim must be signed by this document's owner, otherwise this
    /// fails with [Error::DocumentInvalidClaim] and the document is left
    /// exactly as it was.
    pub fn add_claim(&mut self, claim: Claim) -> Result<()> {
        if !claim.verify_signature(&self.owner) {
            Err(Error::DocumentInvalidClaim(format!(
                "{} claim signed by {} cannot be added to {}'s document",
                claim.kind(),
                claim.signature().signer(),
                self.owner
            )))?;
        }
        debug!(owner = %self.owner, kind = %claim.kind(), "adding claim");
        self.claims.push(claim);
        Ok(())
    }

    /// The binary form of this document. The same document always produces
    /// the same bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let record = DocumentRecord {
            version: self.version,
            owner: self.owner,
            claims: self.claims.iter().map(|c| c.to_record()).collect::<Result<Vec<_>>>()?,
        };
        ser::serialize(&record)
    }

    /// A human-readable (YAML) form of this document.
    pub fn serialize_text(&self) -> Result<String> {
        ser::serialize_text(self)
    }

    /// The first claim of the given kind, in the order claims were added.
    ///
    /// Documents can hold any number of claims of one kind. Use
    /// [claims_of][Self::claims_of] to see all of them.
    pub fn find_claim(&self, kind: ClaimKind) -> Option<&Claim> {
        self.claims_of(kind).next()
    }

    /// Every claim of the given kind, in the order they were added.
    pub fn claims_of(&self, kind: ClaimKind) -> impl Iterator<Item = &Claim> + '_ {
        self.claims.iter().filter(move |c| c.kind() == kind)
    }

    /// Write this document's binary form to storage.
    pub fn save(&self, storage: &dyn Storage, locator: &str) -> Result<()> {
        storage.write_bytes(locator, &self.serialize()?)
    }

    /// Read and load a document from storage.
    pub fn open(storage: &dyn Storage, locator: &str) -> Result<Self> {
        let bytes = storage.read_bytes(locator)?;
        Self::load_from(&bytes)
    }

    #[cfg(test)]
    pub(crate) fn claims_mut(&mut self) -> &mut Vec<Claim> {
        &mut self.claims
    }
}
