//! Account linkage claims are proven by the other account.
//!
//! If `A` claims to also be `B`, then `B`'s own published document has to
//! hold an account claim pointing back at `A`, signed by `B`. Either side
//! alone proves nothing, so nobody can link themselves to an account that
//! doesn't agree to it.

use crate::{
    identity::{address::Address, claim::ClaimKind},
    resolve::{DnsResolver, PeerFetcher},
    verify::{ClaimVerifier, ProofFailure, VerificationResult},
};
use tracing::trace;

pub(crate) async fn verify<D, P>(verifier: &ClaimVerifier<D, P>, owner: &Address, target: &Address) -> VerificationResult
where
    D: DnsResolver,
    P: PeerFetcher,
{
    if owner == target {
        return ProofFailure::SelfLinkage.into();
    }
    let peer = match verifier.lookup("peer document", || verifier.peers().fetch_document(target)).await {
        Ok(doc) => doc,
        Err(err) => return ProofFailure::Lookup(err).into(),
    };
    if peer.owner() != target {
        return ProofFailure::PeerOwnerMismatch {
            expected: *target,
            found: *peer.owner(),
        }
        .into();
    }

    // the peer may link to any number of accounts; any one of them pointing
    // back at us (and signed) will do
    let links = peer.claims_of(ClaimKind::AccountLinkage).collect::<Vec<_>>();
    if links.is_empty() {
        return ProofFailure::ReciprocalMissing(*target).into();
    }
    let reciprocal = links.iter().filter(|claim| claim.account() == Some(owner)).collect::<Vec<_>>();
    trace!(%owner, %target, links = links.len(), reciprocal = reciprocal.len(), "checking reciprocal claims");
    if reciprocal.is_empty() {
        return ProofFailure::ReciprocalMismatch(*target).into();
    }
    if reciprocal.iter().any(|claim| claim.verify_signature(target)) {
        VerificationResult::Valid
    } else {
        ProofFailure::ReciprocalSignatureInvalid(*target).into()
    }
}
