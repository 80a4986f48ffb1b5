//! Typed signatures and the verification seam
//!
//! A [`Signature`] always has a well-formed 64-byte encoding; malformed
//! input is rejected when the value is built. Whether it verifies is the
//! [`SignatureVerifier`]'s call, which never errors: anything it cannot
//! verify is `false`.

use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};

use super::action::ActionPayload;
use crate::error::CryptoError;
use crate::types::identity::Identity;

/// A signature claimed to be produced by `signer`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SignatureWire", into = "SignatureWire")]
pub struct Signature {
    /// Claimed signer
    pub signer: Identity,
    bytes: [u8; 64],
}

impl Signature {
    /// Create from raw components
    pub fn new(signer: Identity, bytes: [u8; 64]) -> Self {
        Self { signer, bytes }
    }

    /// Create from an untrusted byte slice
    pub fn from_slice(signer: Identity, bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::MalformedSignature(bytes.len()))?;
        Ok(Self { signer, bytes })
    }

    /// Create from a hex string (optional `0x` prefix)
    pub fn from_hex(signer: Identity, hex_str: &str) -> Result<Self, CryptoError> {
        let trimmed = hex_str.trim();
        let raw = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))?;
        Self::from_slice(signer, &raw)
    }

    /// Signature bytes
    pub fn bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    /// Signature bytes as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

/// JSON shape of a signature: `{ "signer": "did:key:…", "signature": "<hex>" }`
#[derive(Serialize, Deserialize)]
struct SignatureWire {
    signer: Identity,
    signature: String,
}

impl TryFrom<SignatureWire> for Signature {
    type Error = CryptoError;

    fn try_from(wire: SignatureWire) -> Result<Self, Self::Error> {
        Signature::from_hex(wire.signer, &wire.signature)
    }
}

impl From<Signature> for SignatureWire {
    fn from(sig: Signature) -> Self {
        Self {
            signature: sig.to_hex(),
            signer: sig.signer,
        }
    }
}

/// Decides whether a signature was produced by a signer over a message
pub trait SignatureVerifier: Send + Sync {
    /// Pure and total: malformed keys or signatures yield `false`
    fn verify(&self, signer: &Identity, message: &[u8], signature: &Signature) -> bool;
}

/// Ed25519 verifier (strict verification, rejects small-order keys)
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, signer: &Identity, message: &[u8], signature: &Signature) -> bool {
        if signature.signer != *signer {
            return false;
        }
        let Some(verifying_key) = signer.verifying_key() else {
            return false;
        };

        let sig = ed25519_dalek::Signature::from_bytes(signature.bytes());
        verifying_key.verify_strict(message, &sig).is_ok()
    }
}

/// Sign raw bytes
pub fn sign_message(signing_key: &SigningKey, message: &[u8]) -> Signature {
    let signature = signing_key.sign(message);
    Signature::new(Identity::from_signing_key(signing_key), signature.to_bytes())
}

/// Sign the canonical digest of an action in the given election domain
pub fn sign_action(signing_key: &SigningKey, action: &ActionPayload, domain: &str) -> Signature {
    sign_message(signing_key, &action.digest(domain))
}

/// Parse a hex-encoded 32-byte ed25519 secret key
pub fn signing_key_from_hex(hex_str: &str) -> Result<SigningKey, CryptoError> {
    let trimmed = hex_str.trim();
    let raw = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))?;
    let secret: [u8; 32] = raw.try_into().map_err(|_| CryptoError::InvalidSecretKey)?;
    Ok(SigningKey::from_bytes(&secret))
}
