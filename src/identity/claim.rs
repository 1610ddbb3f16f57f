//! A claim is something an account asserts about itself: "my name is alice",
//! "I control example.com", "I am also 0x1234...".
//!
//! Claims are built with a [ClaimBuilder], which validates the input and
//! produces a [ClaimDraft]. Signing the draft with the account's keypair
//! produces a [Claim], which can then be appended to the account's
//! [MetadataDocument][crate::identity::document::MetadataDocument].
//!
//! A claim's signature covers the DER encoding of its kind tag, its kind
//! payload, and its timestamp. Claims never change after signing.

use crate::{
    crypto::{base::SignKeypair, sign::Signature},
    error::{Error, Result},
    identity::address::Address,
    util::{
        ser::{self, BinaryVec},
        sign::Signable,
        Timestamp,
    },
};
use getset;
use rasn::{AsnType, Decode, Encode};
use serde_derive::{Deserialize, Serialize};

/// The longest name (in bytes) a name claim will accept.
pub const MAX_NAME_LEN: usize = 256;

const TAG_NAME: u32 = 0;
const TAG_DOMAIN: u32 = 1;
const TAG_ACCOUNT: u32 = 2;

/// The kinds of claims. Each kind has its own payload and its own way of
/// being verified.
///
/// Kinds this library doesn't know about are carried as `Unknown` so that
/// documents written by newer software still load and round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    /// A self-asserted display name.
    Name,
    /// Control of a DNS domain.
    Domain,
    /// A link to another account, which must link back.
    AccountLinkage,
    /// A kind we don't understand, by its wire tag.
    Unknown(u32),
}

impl ClaimKind {
    /// The tag this kind is identified by on the wire.
    pub fn tag(&self) -> u32 {
        match self {
            Self::Name => TAG_NAME,
            Self::Domain => TAG_DOMAIN,
            Self::AccountLinkage => TAG_ACCOUNT,
            Self::Unknown(tag) => *tag,
        }
    }

    pub fn from_tag(tag: u32) -> Self {
        match tag {
            TAG_NAME => Self::Name,
            TAG_DOMAIN => Self::Domain,
            TAG_ACCOUNT => Self::AccountLinkage,
            _ => Self::Unknown(tag),
        }
    }
}

impl std::fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Domain => write!(f, "domain"),
            Self::AccountLinkage => write!(f, "account"),
            Self::Unknown(tag) => write!(f, "unknown({})", tag),
        }
    }
}

/// The data being claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimSpec {
    /// A claim that this is my name.
    Name(String),
    /// A claim that I control this domain.
    ///
    /// Proven by publishing a TXT record (see [crate::verify::domain]).
    Domain(String),
    /// A claim that this other account is also me.
    ///
    /// Proven by the other account publishing a matching claim pointing back
    /// at us. Neither side is valid alone.
    AccountLinkage(Address),
    /// A claim of a kind we can't interpret. The payload is kept exactly as
    /// it arrived.
    Unknown { tag: u32, payload: BinaryVec },
}

impl ClaimSpec {
    pub fn kind(&self) -> ClaimKind {
        match self {
            Self::Name(_) => ClaimKind::Name,
            Self::Domain(_) => ClaimKind::Domain,
            Self::AccountLinkage(_) => ClaimKind::AccountLinkage,
            Self::Unknown { tag, .. } => ClaimKind::Unknown(*tag),
        }
    }

    /// The DER-encoded kind payload.
    fn payload(&self) -> Result<BinaryVec> {
        let bytes = match self {
            Self::Name(name) => ser::serialize(name)?,
            Self::Domain(domain) => ser::serialize(domain)?,
            Self::AccountLinkage(address) => ser::serialize(address)?,
            Self::Unknown { payload, .. } => return Ok(payload.clone()),
        };
        Ok(BinaryVec::from(bytes))
    }

    /// Rebuild a spec from its wire tag and payload.
    ///
    /// Known payloads have to be in canonical form: if decoding and
    /// re-encoding doesn't give back the exact same bytes, the signature over
    /// them can't be trusted to mean what the decoded value says.
    fn from_parts(tag: u32, payload: &BinaryVec) -> Result<Self> {
        let spec = match ClaimKind::from_tag(tag) {
            ClaimKind::Name => Self::Name(ser::deserialize(payload)?),
            ClaimKind::Domain => Self::Domain(ser::deserialize(payload)?),
            ClaimKind::AccountLinkage => Self::AccountLinkage(ser::deserialize(payload)?),
            ClaimKind::Unknown(tag) => {
                return Ok(Self::Unknown {
                    tag,
                    payload: payload.clone(),
                })
            }
        };
        if &spec.payload()? != payload {
            Err(Error::Deserialize(format!("non-canonical {} claim payload", spec.kind())))?;
        }
        Ok(spec)
    }
}

/// What actually gets signed for a claim.
#[derive(Debug, AsnType, Encode, Decode)]
pub struct ClaimSigningPayload {
    #[rasn(tag(explicit(0)))]
    kind: u32,
    #[rasn(tag(explicit(1)))]
    payload: BinaryVec,
    #[rasn(tag(explicit(2)))]
    timestamp: i64,
}

fn signing_payload(spec: &ClaimSpec, timestamp: &Timestamp) -> Result<ClaimSigningPayload> {
    Ok(ClaimSigningPayload {
        kind: spec.kind().tag(),
        payload: spec.payload()?,
        timestamp: timestamp.unix(),
    })
}

/// How a claim is laid out inside a persisted document.
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub(crate) struct ClaimRecord {
    #[rasn(tag(explicit(0)))]
    kind: u32,
    #[rasn(tag(explicit(1)))]
    payload: BinaryVec,
    #[rasn(tag(explicit(2)))]
    timestamp: i64,
    #[rasn(tag(explicit(3)))]
    signature: Signature,
}

/// Builds validated, unsigned claims for one account.
#[derive(Debug, Clone, getset::Getters)]
#[getset(get = "pub")]
pub struct ClaimBuilder {
    /// The account making the claims.
    owner: Address,
    /// A pinned timestamp. If `None`, drafts are stamped with the current
    /// time.
    timestamp: Option<Timestamp>,
}

impl ClaimBuilder {
    pub fn new(owner: Address) -> Self {
        Self { owner, timestamp: None }
    }

    /// Stamp every draft from this builder with the given time.
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    fn draft(&self, spec: ClaimSpec) -> ClaimDraft {
        ClaimDraft {
            owner: self.owner,
            spec,
            timestamp: self.timestamp.unwrap_or_else(Timestamp::now),
        }
    }

    /// Claim a display name.
    pub fn name(&self, name: &str) -> Result<ClaimDraft> {
        validate_name(name)?;
        Ok(self.draft(ClaimSpec::Name(name.to_string())))
    }

    /// Claim control of a domain.
    pub fn domain(&self, domain: &str) -> Result<ClaimDraft> {
        validate_domain(domain)?;
        Ok(self.draft(ClaimSpec::Domain(domain.to_string())))
    }

    /// Claim that `target` is another account of ours.
    pub fn account(&self, target: &Address) -> Result<ClaimDraft> {
        if target == &self.owner {
            Err(Error::ClaimValidation {
                field: "address",
                reason: String::from("an account cannot link to itself"),
            })?;
        }
        Ok(self.draft(ClaimSpec::AccountLinkage(*target)))
    }

    /// Make a claim of a kind this library doesn't define, with an
    /// already-encoded payload.
    pub fn extension(&self, tag: u32, payload: Vec<u8>) -> Result<ClaimDraft> {
        if let ClaimKind::Unknown(_) = ClaimKind::from_tag(tag) {
            Ok(self.draft(ClaimSpec::Unknown {
                tag,
                payload: BinaryVec::from(payload),
            }))
        } else {
            Err(Error::ClaimValidation {
                field: "kind",
                reason: format!("tag {} is already taken by {} claims", tag, ClaimKind::from_tag(tag)),
            })
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let fail = |reason: String| Error::ClaimValidation { field: "name", reason };
    if name.trim().is_empty() {
        Err(fail(String::from("name is empty")))?;
    }
    if name.len() > MAX_NAME_LEN {
        Err(fail(format!("name is {} bytes, the limit is {}", name.len(), MAX_NAME_LEN)))?;
    }
    Ok(())
}

fn validate_domain(domain: &str) -> Result<()> {
    let fail = |reason: String| Error::ClaimValidation { field: "domain", reason };
    match url::Host::parse(domain) {
        Ok(url::Host::Domain(_)) => {}
        Ok(_) => Err(fail(format!("{:?} is an IP address, not a hostname", domain)))?,
        Err(e) => Err(fail(format!("{:?} is not a hostname: {}", domain, e)))?,
    }
    if domain.len() > 253 {
        Err(fail(format!("{:?} is longer than 253 bytes", domain)))?;
    }
    let labels = domain.split('.').collect::<Vec<_>>();
    if labels.len() < 2 {
        Err(fail(format!("{:?} needs at least two labels", domain)))?;
    }
    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            Err(fail(format!("{:?} has a label that is empty or longer than 63 bytes", domain)))?;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            Err(fail(format!("{:?} has invalid characters (use the punycode form)", domain)))?;
        }
        if label.starts_with('-') || label.ends_with('-') {
            Err(fail(format!("{:?} has a label starting or ending with '-'", domain)))?;
        }
    }
    if labels.last().map(|tld| tld.chars().all(|c| c.is_ascii_digit())).unwrap_or(true) {
        Err(fail(format!("{:?} has a numeric top-level label", domain)))?;
    }
    Ok(())
}

/// A validated claim waiting to be signed.
#[derive(Debug, Clone, getset::Getters)]
#[getset(get = "pub")]
pub struct ClaimDraft {
    /// Who is making the claim (and who has to sign it).
    owner: Address,
    /// What's being claimed.
    spec: ClaimSpec,
    /// When the claim was made.
    timestamp: Timestamp,
}

impl ClaimDraft {
    /// Sign this draft. The keypair must belong to the draft's owner.
    pub fn sign(self, keypair: &SignKeypair) -> Result<Claim> {
        if keypair.address() != self.owner {
            Err(Error::ClaimValidation {
                field: "signer",
                reason: format!("claims for {} cannot be signed by {}", self.owner, keypair.address()),
            })?;
        }
        let signature = crate::crypto::sign::sign(keypair, &self.signable_bytes()?)?;
        Ok(Claim {
            spec: self.spec,
            timestamp: self.timestamp,
            signature,
        })
    }
}

impl Signable for ClaimDraft {
    type Item = ClaimSigningPayload;
    fn signable(&self) -> Result<Self::Item> {
        signing_payload(&self.spec, &self.timestamp)
    }
}

/// A signed claim.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters,
)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Claim {
    /// The data we're claiming.
    spec: ClaimSpec,
    /// When the claim was made.
    timestamp: Timestamp,
    /// The claimant's signature over the spec and timestamp.
    signature: Signature,
}

impl Claim {
    pub fn kind(&self) -> ClaimKind {
        self.spec().kind()
    }

    /// The claimed name, if this is a name claim.
    pub fn name(&self) -> Option<&str> {
        match self.spec() {
            ClaimSpec::Name(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// The claimed domain, if this is a domain claim.
    pub fn domain(&self) -> Option<&str> {
        match self.spec() {
            ClaimSpec::Domain(domain) => Some(domain.as_str()),
            _ => None,
        }
    }

    /// The linked account, if this is an account claim.
    pub fn account(&self) -> Option<&Address> {
        match self.spec() {
            ClaimSpec::AccountLinkage(address) => Some(address),
            _ => None,
        }
    }

    /// Whether this claim was signed by `owner`. Never errors: anything that
    /// can't be checked is simply not valid.
    pub fn verify_signature(&self, owner: &Address) -> bool {
        match self.signable_bytes() {
            Ok(bytes) => crate::crypto::sign::verify(owner, &bytes, self.signature()),
            Err(_) => false,
        }
    }

    /// Rebuild this claim's spec from its wire tag and payload, the same way
    /// a binary load does. Claims read from text can carry a known kind
    /// dressed up as `Unknown`; this turns them back into the real thing (or
    /// fails if the payload doesn't decode as that kind).
    pub(crate) fn canonicalize(self) -> Result<Self> {
        let spec = ClaimSpec::from_parts(self.kind().tag(), &self.spec.payload()?)?;
        Ok(Self { spec, ..self })
    }

    pub(crate) fn to_record(&self) -> Result<ClaimRecord> {
        Ok(ClaimRecord {
            kind: self.kind().tag(),
            payload: self.spec().payload()?,
            timestamp: self.timestamp().unix(),
            signature: self.signature().clone(),
        })
    }

    pub(crate) fn from_record(record: ClaimRecord) -> Result<Self> {
        Ok(Self {
            spec: ClaimSpec::from_parts(record.kind, &record.payload)?,
            timestamp: Timestamp::from_unix(record.timestamp)?,
            signature: record.signature,
        })
    }
}

impl Signable for Claim {
    type Item = ClaimSigningPayload;
    fn signable(&self) -> Result<Self::Item> {
        signing_payload(&self.spec, &self.timestamp)
    }
}
