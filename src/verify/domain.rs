//! Domain claims are proven with DNS.
//!
//! To back up a claim on `example.com`, the claimant publishes a TXT record
//! at `_account-claims.example.com` holding a token derived from their
//! address and the claim's timestamp (see [proof_token]). Anyone can compute
//! the token from the claim, but only someone who controls the domain's DNS
//! can publish it there.
//!
//! Tying the token to the timestamp means a new domain claim needs a new
//! record, so a record left behind by a previous owner of the domain doesn't
//! vouch for claims made after it changed hands.

use crate::{
    crypto::base::Hash,
    identity::{
        address::Address,
        claim::{Claim, ClaimSpec},
    },
    resolve::{DnsResolver, PeerFetcher},
    util::{ser, Timestamp},
    verify::{ClaimVerifier, ProofFailure, VerificationResult},
};
use tracing::trace;

/// The label proof records are published under.
pub const PROOF_LABEL: &str = "_account-claims";

/// What every proof token starts with.
pub const TOKEN_PREFIX: &str = "account-claims-verification=";

const TOKEN_CONTEXT: &str = "account-claims domain-proof v1";

/// Where the proof for a claim on `domain` lives.
pub fn proof_hostname(domain: &str) -> String {
    format!("{}.{}", PROOF_LABEL, domain.to_ascii_lowercase())
}

/// The TXT value that proves `owner` made a domain claim at `timestamp`.
pub fn proof_token(owner: &Address, timestamp: &Timestamp) -> String {
    let mut material = Vec::with_capacity(Address::LEN + 8);
    material.extend_from_slice(owner.as_bytes());
    material.extend_from_slice(&timestamp.unix().to_be_bytes());
    let hash = Hash::new_blake3_derived(TOKEN_CONTEXT, &material);
    format!("{}{}", TOKEN_PREFIX, ser::base64_encode(hash.as_bytes()))
}

/// The `(hostname, value)` TXT record `owner` needs to publish to prove a
/// domain claim. `None` if the claim isn't a domain claim.
pub fn txt_record(owner: &Address, claim: &Claim) -> Option<(String, String)> {
    match claim.spec() {
        ClaimSpec::Domain(domain) => Some((proof_hostname(domain), proof_token(owner, claim.timestamp()))),
        _ => None,
    }
}

pub(crate) async fn verify<D, P>(
    verifier: &ClaimVerifier<D, P>,
    owner: &Address,
    timestamp: &Timestamp,
    domain: &str,
) -> VerificationResult
where
    D: DnsResolver,
    P: PeerFetcher,
{
    let hostname = proof_hostname(domain);
    let expected = proof_token(owner, timestamp);
    let records = match verifier.lookup("dns", || verifier.dns().lookup_txt(&hostname)).await {
        Ok(records) => records,
        Err(err) => return ProofFailure::Lookup(err).into(),
    };
    trace!(%hostname, records = records.len(), "got TXT records");
    if records.iter().any(|record| record.trim() == expected) {
        VerificationResult::Valid
    } else {
        ProofFailure::TokenMissing { hostname, expected }.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        identity::claim::ClaimKind,
        resolve::{
            memory::{MemoryDns, MemoryPeers},
            ResolverError,
        },
        util::test,
        verify::{tests::verifier, VerifierConfig},
    };
    use std::time::Duration;

    #[test]
    fn token_depends_on_owner_and_time() {
        let keys = test::keypairs(2);
        let ts2 = Timestamp::from_unix(test::ts().unix() + 1).unwrap();
        let token = proof_token(&keys[0].address(), &test::ts());
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token, proof_token(&keys[0].address(), &test::ts()));
        assert_ne!(token, proof_token(&keys[1].address(), &test::ts()));
        assert_ne!(token, proof_token(&keys[0].address(), &ts2));
        // 32 bytes of base64, unpadded
        assert_eq!(token.len(), TOKEN_PREFIX.len() + 43);
    }

    #[test]
    fn record_for_claim() {
        let keys = test::keypairs(2);
        let claim = test::domain_claim(&keys[0], "Example.com");
        let (hostname, value) = txt_record(&keys[0].address(), &claim).unwrap();
        assert_eq!(hostname, "_account-claims.example.com");
        assert_eq!(value, proof_token(&keys[0].address(), &test::ts()));
        assert!(txt_record(&keys[0].address(), &test::name_claim(&keys[0], "alice")).is_none());
    }

    #[tokio::test]
    async fn domain_proof() {
        let keys = test::keypairs(2);
        let doc = test::document_with(&keys[0], vec![test::domain_claim(&keys[0], "example.com")]);
        let claim = doc.find_claim(ClaimKind::Domain).unwrap();
        let verifier = verifier();

        // nothing published yet
        let res = verifier.verify(&doc, claim).await;
        assert!(matches!(res, VerificationResult::ExternalProofFailed(ProofFailure::Lookup(ResolverError::NotFound(_)))));

        // somebody else's proof doesn't count
        let other = test::document_with(&keys[1], vec![test::domain_claim(&keys[1], "example.com")]);
        let (hostname, other_value) = txt_record(other.owner(), &other.claims()[0]).unwrap();
        verifier.dns().add_txt(&hostname, &other_value).unwrap();
        verifier.dns().add_txt(&hostname, "v=spf1 -all").unwrap();
        match verifier.verify(&doc, claim).await {
            VerificationResult::ExternalProofFailed(ProofFailure::TokenMissing { hostname: h, expected }) => {
                assert_eq!(h, hostname);
                assert_eq!(expected, proof_token(doc.owner(), claim.timestamp()));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // ours does, with or without stray whitespace
        let (_, value) = txt_record(doc.owner(), claim).unwrap();
        verifier.dns().add_txt(&hostname, &format!(" {} ", value)).unwrap();
        assert_eq!(verifier.verify(&doc, claim).await, VerificationResult::Valid);
    }

    #[tokio::test]
    async fn domain_proof_is_per_claim() {
        let keys = test::keypairs(1);
        let old = test::domain_claim(&keys[0], "example.com");
        let new = test::builder(&keys[0])
            .at(Timestamp::from_unix(test::ts().unix() + 3600).unwrap())
            .domain("example.com")
            .unwrap()
            .sign(&keys[0])
            .unwrap();
        let doc = test::document_with(&keys[0], vec![old.clone(), new.clone()]);
        let verifier = verifier();
        let (hostname, value) = txt_record(doc.owner(), &old).unwrap();
        verifier.dns().add_txt(&hostname, &value).unwrap();
        assert_eq!(verifier.verify(&doc, &old).await, VerificationResult::Valid);
        assert!(matches!(
            verifier.verify(&doc, &new).await,
            VerificationResult::ExternalProofFailed(ProofFailure::TokenMissing { .. })
        ));
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let keys = test::keypairs(1);
        let doc = test::document_with(&keys[0], vec![test::domain_claim(&keys[0], "example.com")]);
        let claim = &doc.claims()[0];
        let (hostname, value) = txt_record(doc.owner(), claim).unwrap();
        let servfail = ResolverError::Resolution(String::from("SERVFAIL"));

        // one retry (the default) covers one failure
        let verifier = verifier();
        verifier.dns().add_txt(&hostname, &value).unwrap();
        verifier.dns().fail_next(&hostname, servfail.clone(), 1).unwrap();
        assert_eq!(verifier.verify(&doc, claim).await, VerificationResult::Valid);
        assert_eq!(verifier.dns().lookups(), 2);

        // but not two
        verifier.dns().fail_next(&hostname, servfail.clone(), 2).unwrap();
        let res = verifier.verify(&doc, claim).await;
        assert_eq!(res, VerificationResult::ExternalProofFailed(ProofFailure::Lookup(servfail.clone())));
        assert!(matches!(&res, VerificationResult::ExternalProofFailed(reason) if reason.is_transient()));
        assert_eq!(verifier.dns().lookups(), 4);

        // a definite answer is never retried
        let verifier = ClaimVerifier::new(MemoryDns::new(), MemoryPeers::new());
        let res = verifier.verify(&doc, claim).await;
        assert!(matches!(&res, VerificationResult::ExternalProofFailed(reason) if !reason.is_transient()));
        assert_eq!(verifier.dns().lookups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_dns_times_out() {
        let keys = test::keypairs(1);
        let doc = test::document_with(&keys[0], vec![test::domain_claim(&keys[0], "example.com")]);
        let claim = &doc.claims()[0];
        let (hostname, value) = txt_record(doc.owner(), claim).unwrap();

        let config = VerifierConfig::new(Duration::from_millis(500), 2);
        let verifier =
            ClaimVerifier::with_config(MemoryDns::new().with_delay(Duration::from_secs(10)), MemoryPeers::new(), config);
        verifier.dns().add_txt(&hostname, &value).unwrap();
        let res = verifier.verify(&doc, claim).await;
        assert_eq!(
            res,
            VerificationResult::ExternalProofFailed(ProofFailure::Lookup(ResolverError::Timeout(Duration::from_millis(500))))
        );
        assert_eq!(verifier.dns().lookups(), 3);

        // give it enough time and it answers
        let config = VerifierConfig::new(Duration::from_secs(11), 0);
        let verifier =
            ClaimVerifier::with_config(MemoryDns::new().with_delay(Duration::from_secs(10)), MemoryPeers::new(), config);
        verifier.dns().add_txt(&hostname, &value).unwrap();
        assert_eq!(verifier.verify(&doc, claim).await, VerificationResult::Valid);
    }
}
