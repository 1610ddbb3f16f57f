//! Signed, verifiable claims about blockchain accounts.
//!
//! An account publishes a [metadata document][identity::document] listing
//! things it asserts about itself: a display name, control of a DNS domain,
//! other accounts that belong to the same owner. Each of these
//! [claims][identity::claim] is signed by the account, so anyone holding the
//! document can tell the account really said it.
//!
//! Some claims can be checked further. A domain claim is backed by a TXT
//! record the account publishes at the domain, and a link to another account
//! only counts if that account links back. The [verify] module runs these
//! checks, reaching the outside world only through the adapter traits in
//! [resolve], so callers choose how DNS lookups, document fetches, and
//! storage actually happen.
//!
//! The basic flow looks like:
//!
//! 1. Build a claim with a [ClaimBuilder][identity::claim::ClaimBuilder] for
//! the account.
//! 1. Sign the resulting draft with the account's
//! [keypair][crypto::base::SignKeypair].
//! 1. Append the signed claim to the account's
//! [MetadataDocument][identity::document::MetadataDocument] and publish its
//! serialized form.
//! 1. Elsewhere, load the published bytes and hand the document to a
//! [ClaimVerifier][verify::ClaimVerifier].

pub mod error;
pub(crate) mod util;
pub mod crypto;
pub mod identity;
pub mod resolve;
pub mod verify;

pub use util::Timestamp;
