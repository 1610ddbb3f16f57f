//! Account addresses.

use crate::error::{Error, Result};
use rasn::{AsnType, Decode, Encode};
use std::str::FromStr;

/// The public identifier for an account: 20 bytes, derived from the
/// account's public key (see [SignKeypairPublic::address][crate::crypto::base::SignKeypairPublic::address]).
///
/// Written as `0x` followed by 40 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsnType, Encode, Decode)]
#[rasn(delegate)]
pub struct Address([u8; 20]);

impl Address {
    /// How many bytes are in an address.
    pub const LEN: usize = 20;

    /// Build an address from a byte slice, which must be exactly
    /// [Address::LEN] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; Self::LEN] = bytes
            .try_into()
            .map_err(|_| Error::AddressInvalid(format!("expected {} bytes, got {}", Self::LEN, bytes.len())))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl FromStr for Address {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let hexstr = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| Error::AddressInvalid(format!("missing 0x prefix: {:?}", s)))?;
        let bytes = hex::decode(hexstr).map_err(|e| Error::AddressInvalid(format!("{}: {:?}", e, s)))?;
        Self::from_slice(&bytes)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}
