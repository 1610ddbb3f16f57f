use crate::{
    crypto::base::Hash,
    error::{Error, Result},
    identity::address::Address,
};
use rand::{CryptoRng, RngCore};
use rasn::{AsnType, Decode, Encode};
use serde_derive::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A signature derived from a signing keypair.
#[derive(Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode, Serialize, Deserialize)]
#[rasn(choice)]
pub enum SignKeypairSignature {
    #[rasn(tag(explicit(0)))]
    Ed25519(#[serde(with = "crate::util::ser::human_bytes")] [u8; 64]),
}

impl AsRef<[u8]> for SignKeypairSignature {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Ed25519(sig) => &sig[..],
        }
    }
}

/// The secret half of a keypair. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretSeed([u8; 32]);

impl std::fmt::Debug for SecretSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretSeed(<hidden>)")
    }
}

/// An asymmetric signing keypair.
///
/// This may or may not hold the secret key. One without it can verify but
/// not sign.
#[derive(Debug, Clone)]
pub enum SignKeypair {
    /// Ed25519 signing keypair
    Ed25519 {
        public: [u8; 32],
        secret: Option<SecretSeed>,
    },
}

impl SignKeypair {
    fn new_ed25519_from_secret(secret: ed25519_consensus::SigningKey) -> Self {
        let public = secret.verification_key();
        Self::Ed25519 {
            public: public.to_bytes(),
            secret: Some(SecretSeed(secret.to_bytes())),
        }
    }

    /// Create a new ed25519 keypair
    pub fn new_ed25519<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut randbuf = [0u8; 32];
        rng.fill_bytes(&mut randbuf);
        let keypair = Self::new_ed25519_from_bytes(randbuf);
        randbuf.zeroize();
        keypair
    }

    /// Create a new ed25519 keypair from a cryptographic seed
    pub fn new_ed25519_from_bytes(secret_bytes: [u8; 32]) -> Self {
        let secret = ed25519_consensus::SigningKey::from(secret_bytes);
        Self::new_ed25519_from_secret(secret)
    }

    /// Sign a value, returning a detached signature.
    pub fn sign(&self, data: &[u8]) -> Result<SignKeypairSignature> {
        match self {
            Self::Ed25519 { secret: ref sec_maybe, .. } => {
                let sec = sec_maybe.as_ref().ok_or(Error::CryptoKeyMissing)?;
                let seckey = ed25519_consensus::SigningKey::from(sec.0);
                let sig_obj = seckey.sign(data);
                Ok(SignKeypairSignature::Ed25519(sig_obj.to_bytes()))
            }
        }
    }

    /// Verify a value with a detached signature.
    pub fn verify(&self, signature: &SignKeypairSignature, data: &[u8]) -> Result<()> {
        self.public().verify(signature, data)
    }

    /// Grab the public half of this keypair.
    pub fn public(&self) -> SignKeypairPublic {
        match self {
            Self::Ed25519 { public, .. } => SignKeypairPublic::Ed25519(*public),
        }
    }

    /// The account address this keypair signs for.
    pub fn address(&self) -> Address {
        self.public().address()
    }

    /// Return a copy of this keypair without its secret.
    pub fn strip_private(&self) -> Self {
        match self {
            Self::Ed25519 { public, .. } => Self::Ed25519 {
                public: *public,
                secret: None,
            },
        }
    }

    pub fn has_private(&self) -> bool {
        match self {
            Self::Ed25519 { secret, .. } => secret.is_some(),
        }
    }
}

impl PartialEq for SignKeypair {
    fn eq(&self, other: &Self) -> bool {
        self.public() == other.public()
    }
}

/// An asymmetric signing public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, AsnType, Encode, Decode, Serialize, Deserialize)]
#[rasn(choice)]
pub enum SignKeypairPublic {
    /// Ed25519 signing public key
    #[rasn(tag(explicit(0)))]
    Ed25519(#[serde(with = "crate::util::ser::human_bytes")] [u8; 32]),
}

impl SignKeypairPublic {
    /// Verify a value with a detached signature given the public key of the
    /// signer.
    pub fn verify(&self, signature: &SignKeypairSignature, data: &[u8]) -> Result<()> {
        match (self, signature) {
            (Self::Ed25519(pubkey_bytes), SignKeypairSignature::Ed25519(sig_bytes)) => {
                let pubkey = ed25519_consensus::VerificationKey::try_from(*pubkey_bytes)
                    .map_err(|_| Error::CryptoSignatureVerificationFailed)?;
                let sig = ed25519_consensus::Signature::from(*sig_bytes);
                pubkey.verify(&sig, data).map_err(|_| Error::CryptoSignatureVerificationFailed)
            }
        }
    }

    /// Derive the account address for this key: the trailing 20 bytes of the
    /// key's blake3 hash.
    pub fn address(&self) -> Address {
        let bytes = match self {
            Self::Ed25519(pubkey) => pubkey,
        };
        let hash = Hash::new_blake3(&bytes[..]);
        let mut addr = [0u8; Address::LEN];
        addr.copy_from_slice(&hash.as_bytes()[32 - Address::LEN..]);
        Address::from(addr)
    }
}

impl From<SignKeypair> for SignKeypairPublic {
    fn from(kp: SignKeypair) -> Self {
        kp.public()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const MSG_REAL: &str = "the old man leaned back in his chair, his face weathered by the ceaseless march of time, pondering his...";
    const MSG_FAKE: &str = "the old man leaned back in his chair, his face weathered by the ceaseless march of NATUREFRESH MILK, pondering his...";

    #[test]
    fn signkeypair_ed25519_sign_verify() {
        let mut rng = crate::util::test::rng();
        let our_keypair = SignKeypair::new_ed25519(&mut rng);
        let sig = our_keypair.sign(MSG_REAL.as_bytes()).unwrap();
        assert_eq!(our_keypair.verify(&sig, MSG_REAL.as_bytes()), Ok(()));
        assert_eq!(our_keypair.verify(&sig, MSG_FAKE.as_bytes()), Err(Error::CryptoSignatureVerificationFailed));
    }

    #[test]
    fn signkeypair_ed25519_seed_is_deterministic() {
        let seed = [
            233, 229, 76, 13, 231, 38, 253, 27, 53, 2, 235, 174, 151, 186, 192, 33, 16, 2, 57, 32, 170, 23, 13, 47, 44, 234, 231, 35, 38,
            107, 93, 198,
        ];
        let keypair1 = SignKeypair::new_ed25519_from_bytes(seed);
        let keypair2 = SignKeypair::new_ed25519_from_bytes(seed);
        assert_eq!(keypair1, keypair2);
        assert_eq!(keypair1.address(), keypair2.address());
        let sig1 = keypair1.sign(MSG_REAL.as_bytes()).unwrap();
        let sig2 = keypair2.sign(MSG_REAL.as_bytes()).unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn signkeypair_ed25519_strip_has_private() {
        let mut rng = crate::util::test::rng();
        let keypair = SignKeypair::new_ed25519(&mut rng);
        assert!(keypair.has_private());
        let keypair_pub = keypair.strip_private();
        assert!(!keypair_pub.has_private());
        assert_eq!(keypair, keypair_pub);
        assert_eq!(keypair_pub.sign(b"hi").err(), Some(Error::CryptoKeyMissing));

        let sig = keypair.sign(b"hi").unwrap();
        assert_eq!(keypair_pub.verify(&sig, b"hi"), Ok(()));
    }

    #[test]
    fn signkeypair_ed25519_eq() {
        let mut rng = crate::util::test::rng();
        let keypair1 = SignKeypair::new_ed25519(&mut rng);
        let keypair2 = keypair1.clone();
        assert_eq!(keypair1, keypair2);
        let keypair3 = SignKeypair::new_ed25519(&mut rng);
        assert!(keypair1 != keypair3);
        assert!(keypair1.address() != keypair3.address());
    }

    #[test]
    fn signkeypair_public_garbage_does_not_verify() {
        let mut rng = crate::util::test::rng();
        let keypair = SignKeypair::new_ed25519(&mut rng);
        let sig = keypair.sign(b"hi").unwrap();
        let mut bad = [0u8; 32];
        bad[0] = 2;
        let pubkey = SignKeypairPublic::Ed25519(bad);
        assert_eq!(pubkey.verify(&sig, b"hi"), Err(Error::CryptoSignatureVerificationFailed));
        let zero_sig = SignKeypairSignature::Ed25519([0u8; 64]);
        assert_eq!(keypair.verify(&zero_sig, b"hi"), Err(Error::CryptoSignatureVerificationFailed));
    }
}
