//! Helpful serialization tools.
//!
//! There are two formats in play. The canonical one is ASN.1 DER (via
//! `rasn`), which is what gets signed and what gets persisted: DER has exactly
//! one encoding per value, so the same document always produces the same
//! bytes. The other is YAML, for humans, where binary data is written out as
//! base64 so it can be read and pasted around.

use crate::error::{Error, Result};
use base64::Engine;
use rasn::{AsnType, Decode, Encode};
use serde::{de::DeserializeOwned, Serialize};
use std::ops::Deref;

pub(crate) fn serialize<T: Encode>(obj: &T) -> Result<Vec<u8>> {
    rasn::der::encode(obj).map_err(|e| Error::Serialize(e.to_string()))
}

pub(crate) fn deserialize<T: Decode>(bytes: &[u8]) -> Result<T> {
    rasn::der::decode(bytes).map_err(|e| Error::Deserialize(e.to_string()))
}

pub(crate) fn serialize_text<T: Serialize>(obj: &T) -> Result<String> {
    Ok(serde_yaml::to_string(obj)?)
}

pub(crate) fn deserialize_text<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_yaml::from_slice(bytes)?)
}

/// Convert bytes to base64
pub fn base64_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes.as_ref())
}

/// Convert base64 to bytes
pub fn base64_decode<T: AsRef<[u8]>>(bytes: T) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bytes.as_ref())?)
}

/// A wrapper around a byte vector, encoded as an OCTET STRING in DER and as
/// base64 in text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, AsnType, Encode, Decode)]
#[rasn(delegate)]
pub struct BinaryVec(rasn::types::OctetString);

impl BinaryVec {
    /// Copy the bytes out into a plain vec.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl From<Vec<u8>> for BinaryVec {
    fn from(vec: Vec<u8>) -> Self {
        Self(rasn::types::OctetString::from(vec))
    }
}

impl From<&[u8]> for BinaryVec {
    fn from(slice: &[u8]) -> Self {
        Self::from(slice.to_vec())
    }
}

impl Deref for BinaryVec {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0[..]
    }
}

impl AsRef<[u8]> for BinaryVec {
    fn as_ref(&self) -> &[u8] {
        self.deref()
    }
}

impl serde::Serialize for BinaryVec {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&base64_encode(self.deref()))
    }
}

impl<'de> serde::Deserialize<'de> for BinaryVec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        let vec = base64_decode(s).map_err(serde::de::Error::custom)?;
        Ok(Self::from(vec))
    }
}

/// Serde glue for fixed-size byte arrays (keys, signatures), written as
/// base64 strings.
pub(crate) mod human_bytes {
    use super::{base64_decode, base64_encode};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64_encode(&bytes[..]))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String>::deserialize(deserializer)?;
        let vec = base64_decode(s).map_err(de::Error::custom)?;
        vec.try_into()
            .map_err(|v: Vec<u8>| de::Error::custom(format!("bad slice length: expected {}, got {}", N, v.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_derive::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, AsnType, Encode, Decode)]
    struct Thing {
        #[rasn(tag(explicit(0)))]
        num: u32,
        #[rasn(tag(explicit(1)))]
        data: BinaryVec,
        #[rasn(tag(explicit(2)))]
        label: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Keyish {
        #[serde(with = "human_bytes")]
        key: [u8; 4],
        blob: BinaryVec,
    }

    #[test]
    fn base64_url_safe_no_pad() {
        let bytes = vec![251, 255, 191, 0, 1];
        let enc = base64_encode(&bytes);
        assert_eq!(enc, "-_-_AAE");
        assert_eq!(base64_decode(&enc).unwrap(), bytes);
        assert!(base64_decode("not base64!").is_err());
    }

    #[test]
    fn der_is_stable() {
        let thing = Thing {
            num: 42,
            data: BinaryVec::from(vec![1, 2, 3]),
            label: String::from("get a job"),
        };
        let ser1 = serialize(&thing).unwrap();
        let ser2 = serialize(&thing).unwrap();
        assert_eq!(ser1, ser2);
        let thing2: Thing = deserialize(&ser1).unwrap();
        assert_eq!(thing, thing2);
        let res: Result<Thing> = deserialize(&ser1[0..ser1.len() - 2]);
        assert!(matches!(res, Err(Error::Deserialize(_))));
    }

    #[test]
    fn text_bytes_are_base64() {
        let keyish = Keyish {
            key: [1, 2, 3, 4],
            blob: BinaryVec::from(&b"hi"[..]),
        };
        let text = serialize_text(&keyish).unwrap();
        assert!(text.contains("key: AQIDBA"));
        assert!(text.contains("blob: aGk"));
        let keyish2: Keyish = deserialize_text(text.as_bytes()).unwrap();
        assert_eq!(keyish, keyish2);

        let res: Result<Keyish> = deserialize_text(b"key: AQID\nblob: aGk\n");
        assert!(matches!(res, Err(Error::SerializeYaml(_))));
    }
}
