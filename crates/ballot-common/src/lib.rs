//! # Ballot Common
//!
//! Shared types, errors, and cryptographic primitives for the multi-signature
//! ballot.
//!
//! ## Core Types
//!
//! - [`Identity`]: ed25519 public key used as both voter key and admin key
//! - [`Signature`]: typed `(signer, bytes)` signature over an action digest
//! - [`ActionPayload`]: the closed set of signable actions
//! - [`Phase`]: lifecycle phase (`Registration -> Voting -> Ended`)
//! - [`Candidate`]: candidate name and running vote count
//!
//! ## Crypto
//!
//! - [`crypto::signature`]: the [`SignatureVerifier`] seam and its ed25519 implementation
//! - [`crypto::action`]: deterministic BLAKE3 action digests
//!
//! ## Security
//!
//! - [`audit`]: audit trail of gated operation attempts

pub mod audit;
pub mod crypto;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use crypto::{
    action::{ActionDigest, ActionPayload},
    signature::{
        sign_action, sign_message, signing_key_from_hex, Ed25519Verifier, Signature,
        SignatureVerifier,
    },
};
pub use error::{
    AuthorizationError, BallotError, ConfigError, CryptoError, IdentityError, PhaseError,
    RegistrationError, Result, VotingError,
};
pub use types::{
    candidate::Candidate,
    identity::Identity,
    phase::Phase,
};

/// Ballot version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Election domain used when none is configured
pub const DEFAULT_DOMAIN: &str = "default";
