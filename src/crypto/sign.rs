//! The sign system creates and checks detached signatures on behalf of an
//! account.
//!
//! A [Signature] carries the public key that made it. Since an account's
//! [Address] is derived from its public key, a signature can be checked
//! against an address without asking anyone for the account's key: the key
//! inside the signature must hash to the address, and the signature must
//! verify under that key.
//!
//! Verification here never errors and never panics. Garbage in is simply a
//! signature that doesn't verify.

use crate::{
    crypto::base::{SignKeypair, SignKeypairPublic, SignKeypairSignature},
    error::Result,
    identity::address::Address,
    resolve::KeyResolver,
};
use getset;
use rasn::{AsnType, Decode, Encode};
use serde_derive::{Deserialize, Serialize};
use tracing::trace;

/// A detached cryptographic signature.
#[derive(
    Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters,
)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Signature {
    /// The key that created this sig
    #[rasn(tag(explicit(0)))]
    key: SignKeypairPublic,
    /// The signature
    #[rasn(tag(explicit(1)))]
    sig: SignKeypairSignature,
}

impl Signature {
    /// The address of the account that made this signature.
    pub fn signer(&self) -> Address {
        self.key().address()
    }
}

/// Sign a message with a keypair, returning the detached signature.
pub fn sign(signing_key: &SignKeypair, message: &[u8]) -> Result<Signature> {
    let sig = signing_key.sign(message)?;
    Ok(Signature {
        key: signing_key.public(),
        sig,
    })
}

/// Verify a detached signature was made by `address` over `message`.
pub fn verify(address: &Address, message: &[u8], signature: &Signature) -> bool {
    if &signature.signer() != address {
        trace!(%address, signer = %signature.signer(), "signature made by a different account");
        return false;
    }
    verify_with_key(signature.key(), message, signature)
}

/// Verify a detached signature under a specific public key.
pub fn verify_with_key(public: &SignKeypairPublic, message: &[u8], signature: &Signature) -> bool {
    signature.key() == public && public.verify(signature.sig(), message).is_ok()
}

/// Verify a detached signature against the key `address` has registered
/// (for instance, on chain). Any lookup failure means the signature doesn't
/// verify.
pub fn verify_registered(keys: &dyn KeyResolver, address: &Address, message: &[u8], signature: &Signature) -> bool {
    match keys.public_key(address) {
        Ok(registered) => verify(address, message, signature) && verify_with_key(&registered, message, signature),
        Err(err) => {
            trace!(%address, %err, "registered key lookup failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::memory::MemoryKeys;
    use crate::util::test;
    use proptest::prelude::*;

    const MESSAGE: &[u8] =
        b"Plaque is a figment of the liberal media and dental industry to scare you into buying useless appliances and pastes.";
    const MESSAGE_TAMPERED: &[u8] =
        b"Plaque is NOT a figment of the liberal media and dental industry to scare you into buying useless appliances and pastes.";

    #[test]
    fn sign_verify_detached() {
        let keys = test::keypairs(2);
        let signature = sign(&keys[0], MESSAGE).unwrap();
        assert_eq!(signature.signer(), keys[0].address());
        assert!(verify(&keys[0].address(), MESSAGE, &signature));

        // modify the message and it fails
        assert!(!verify(&keys[0].address(), MESSAGE_TAMPERED, &signature));

        // claim it came from someone else and it fails
        assert!(!verify(&keys[1].address(), MESSAGE, &signature));
    }

    #[test]
    fn verify_swapped_key_fails() {
        let keys = test::keypairs(2);
        let mut signature = sign(&keys[0], MESSAGE).unwrap();
        // point the signature at another key: the address check catches it
        signature.set_key(keys[1].public());
        assert!(!verify(&keys[0].address(), MESSAGE, &signature));
        // and even pretending to be that other account doesn't help
        assert!(!verify(&keys[1].address(), MESSAGE, &signature));
    }

    #[test]
    fn verify_garbage_is_false() {
        let keys = test::keypairs(1);
        let mut signature = sign(&keys[0], MESSAGE).unwrap();
        signature.set_sig(SignKeypairSignature::Ed25519([7u8; 64]));
        assert!(!verify(&keys[0].address(), MESSAGE, &signature));
        assert!(!verify(&keys[0].address(), b"", &signature));
    }

    #[test]
    fn sign_without_secret_fails() {
        let keys = test::keypairs(1);
        let res = sign(&keys[0].strip_private(), MESSAGE);
        assert_eq!(res.err(), Some(crate::error::Error::CryptoKeyMissing));
    }

    #[test]
    fn verify_against_registered_key() {
        let keys = test::keypairs(3);
        let registry = MemoryKeys::new();
        registry.register(&keys[0].public()).unwrap();
        let signature = sign(&keys[0], MESSAGE).unwrap();
        assert!(verify_registered(&registry, &keys[0].address(), MESSAGE, &signature));
        assert!(!verify_registered(&registry, &keys[0].address(), MESSAGE_TAMPERED, &signature));

        // unregistered accounts never verify
        let signature2 = sign(&keys[1], MESSAGE).unwrap();
        assert!(verify(&keys[1].address(), MESSAGE, &signature2));
        assert!(!verify_registered(&registry, &keys[1].address(), MESSAGE, &signature2));

        // account registered under a key that differs from the one that signed
        registry.register_as(&keys[2].address(), &keys[1].public()).unwrap();
        let signature3 = sign(&keys[2], MESSAGE).unwrap();
        assert!(!verify_registered(&registry, &keys[2].address(), MESSAGE, &signature3));
    }

    fn sig_bytes(bytes: &[u8]) -> SignKeypairSignature {
        let mut sig = [0u8; 64];
        sig.copy_from_slice(bytes);
        SignKeypairSignature::Ed25519(sig)
    }

    proptest! {
        #[test]
        fn any_message_signs_and_verifies(
            seed in any::<[u8; 32]>(),
            message in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let keypair = SignKeypair::new_ed25519_from_bytes(seed);
            let signature = sign(&keypair, &message).unwrap();
            prop_assert!(verify(&keypair.address(), &message, &signature));
        }

        #[test]
        fn other_accounts_never_verify(
            seed in any::<[u8; 32]>(),
            other_seed in any::<[u8; 32]>(),
            message in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            prop_assume!(seed != other_seed);
            let keypair = SignKeypair::new_ed25519_from_bytes(seed);
            let other = SignKeypair::new_ed25519_from_bytes(other_seed);
            let signature = sign(&keypair, &message).unwrap();
            prop_assert!(!verify(&other.address(), &message, &signature));
        }

        #[test]
        fn arbitrary_signatures_are_false_not_panics(
            key in any::<[u8; 32]>(),
            sig in proptest::collection::vec(any::<u8>(), 64),
            message in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            // make the address check pass so the bytes reach the curve math
            let public = SignKeypairPublic::Ed25519(key);
            let signature = Signature { key: public.clone(), sig: sig_bytes(&sig) };
            prop_assert!(!verify(&public.address(), &message, &signature));
            prop_assert!(!verify_with_key(&public, &message, &signature));
        }

        #[test]
        fn real_key_arbitrary_signature_is_false(
            seed in any::<[u8; 32]>(),
            sig in proptest::collection::vec(any::<u8>(), 64),
            message in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let keypair = SignKeypair::new_ed25519_from_bytes(seed);
            let signature = Signature { key: keypair.public(), sig: sig_bytes(&sig) };
            prop_assert!(!verify(&keypair.address(), &message, &signature));
        }
    }
}
