//! Identity - ed25519 public key of a voter or admin
//!
//! Identities travel as W3C `did:key` strings (Ed25519 multicodec prefix
//! `0xed01`, base58btc with a `z` multibase prefix). A bare 64-char hex key
//! is accepted on input as well.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IdentityError;

/// Ed25519 multicodec prefix for did:key
const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

const DID_KEY_PREFIX: &str = "did:key:z";

/// Unique caller identity (ed25519 public key bytes)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity([u8; 32]);

impl Identity {
    /// Wrap raw public key bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, rejecting anything that is not 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidLength(bytes.len()))?;
        Ok(Self(key))
    }

    /// Identity controlled by the given signing key
    pub fn from_signing_key(signing_key: &SigningKey) -> Self {
        Self(signing_key.verifying_key().to_bytes())
    }

    /// Raw public key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Decode the ed25519 verifying key; `None` if the bytes are not a valid point
    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0).ok()
    }

    /// Encode as a did:key string
    pub fn to_did(&self) -> String {
        let mut prefixed = Vec::with_capacity(34);
        prefixed.extend_from_slice(&ED25519_MULTICODEC);
        prefixed.extend_from_slice(&self.0);

        format!("{}{}", DID_KEY_PREFIX, bs58::encode(&prefixed).into_string())
    }

    /// Parse a did:key string or a 64-char hex public key
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let s = s.trim();
        if let Some(encoded) = s.strip_prefix(DID_KEY_PREFIX) {
            return Self::decode_did_key(encoded);
        }
        if s.starts_with("did:") {
            return Err(IdentityError::InvalidFormat(
                "only did:key identities are supported".into(),
            ));
        }

        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_str)
            .map_err(|_| IdentityError::InvalidFormat(format!("not a did:key or hex key: {s}")))?;
        Self::from_slice(&bytes)
    }

    fn decode_did_key(encoded: &str) -> Result<Self, IdentityError> {
        let decoded = bs58::decode(encoded)
            .into_vec()
            .map_err(|_| IdentityError::InvalidEncoding)?;

        if decoded.len() < 2 || decoded[..2] != ED25519_MULTICODEC {
            return Err(IdentityError::InvalidMulticodec);
        }

        Self::from_slice(&decoded[2..])
    }

    /// Short form for log lines
    pub fn short(&self) -> String {
        let did = self.to_did();
        format!("{}…", &did[..20.min(did.len())])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_did())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.short())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_did())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
