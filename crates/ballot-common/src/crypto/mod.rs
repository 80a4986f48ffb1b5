//! Cryptographic primitives for the ballot
//!
//! This module provides:
//! - Typed ed25519 signatures behind the [`SignatureVerifier`] seam
//! - Deterministic BLAKE3 digests of signable actions

pub mod action;
pub mod signature;

// Re-export commonly used items
pub use action::{ActionDigest, ActionPayload};
pub use signature::{
    sign_action, sign_message, signing_key_from_hex, Ed25519Verifier, Signature, SignatureVerifier,
};
