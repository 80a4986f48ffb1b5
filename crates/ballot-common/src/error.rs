//! Error types for the ballot
//!
//! Provides a unified error type and the domain-specific taxonomy that
//! every gated operation reports.

use thiserror::Error;

use crate::types::{identity::Identity, phase::Phase};

/// Result type alias using BallotError
pub type Result<T> = std::result::Result<T, BallotError>;

/// Unified error type for ballot operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BallotError {
    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Phase error: {0}")]
    Phase(#[from] PhaseError),

    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Voting error: {0}")]
    Voting(#[from] VotingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

impl BallotError {
    /// Stable snake_case name of the taxonomy kind
    pub fn kind(&self) -> &'static str {
        match self {
            BallotError::Authorization(AuthorizationError::InsufficientSignatures { .. }) => {
                "insufficient_signatures"
            }
            BallotError::Authorization(AuthorizationError::NoValidSignatures) => {
                "no_valid_signatures"
            }
            BallotError::Authorization(AuthorizationError::InvalidVoterSignature) => {
                "invalid_voter_signature"
            }
            BallotError::Phase(PhaseError::IllegalPhaseTransition { .. }) => {
                "illegal_phase_transition"
            }
            BallotError::Phase(PhaseError::PhaseNotOpen { .. }) => "phase_not_open",
            BallotError::Phase(PhaseError::UnknownPhase(_) | PhaseError::UnrecognizedPhase(_)) => {
                "unknown_phase"
            }
            BallotError::Registration(RegistrationError::AlreadyRegistered(_)) => {
                "already_registered"
            }
            BallotError::Registration(RegistrationError::NotRegistered(_)) => "not_registered",
            BallotError::Voting(VotingError::AlreadyVoted(_)) => "already_voted",
            BallotError::Voting(VotingError::CandidateIndexOutOfRange { .. }) => {
                "candidate_index_out_of_range"
            }
            BallotError::Config(_) => "invalid_config",
            BallotError::Identity(_) => "invalid_identity",
            BallotError::Crypto(_) => "invalid_signature_encoding",
        }
    }
}

/// Admin quorum failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("Insufficient signatures: {valid} of {required} required admin signatures")]
    InsufficientSignatures { valid: usize, required: usize },

    #[error("No valid admin signatures supplied")]
    NoValidSignatures,

    #[error("Voter signature does not verify")]
    InvalidVoterSignature,
}

/// Lifecycle violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("Illegal phase transition: {from} -> {to}")]
    IllegalPhaseTransition { from: Phase, to: Phase },

    #[error("{operation} is not open during the {current} phase")]
    PhaseNotOpen {
        operation: &'static str,
        current: Phase,
    },

    #[error("Unknown phase value: {0}")]
    UnknownPhase(u8),

    #[error("Unrecognized phase name: {0:?}")]
    UnrecognizedPhase(String),
}

/// Voter registration failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Voter already registered: {0}")]
    AlreadyRegistered(Identity),

    #[error("Voter not registered: {0}")]
    NotRegistered(Identity),
}

/// Vote casting failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VotingError {
    #[error("Voter has already voted: {0}")]
    AlreadyVoted(Identity),

    #[error("Candidate index {index} out of range (candidate count {count})")]
    CandidateIndexOutOfRange { index: u64, count: usize },
}

/// Construction-time parameter errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("At least one candidate is required")]
    NoCandidates,

    #[error("At least one admin is required")]
    NoAdmins,

    #[error("Duplicate admin identity: {0}")]
    DuplicateAdmin(Identity),

    #[error("Required signatures must be between 1 and {admins}, got {required}")]
    InvalidThreshold { required: usize, admins: usize },

    #[error("Candidate name must not be empty (index {0})")]
    EmptyCandidateName(usize),
}

/// Identity parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Invalid identity format: {0}")]
    InvalidFormat(String),

    #[error("Invalid base58 encoding")]
    InvalidEncoding,

    #[error("Invalid multicodec prefix")]
    InvalidMulticodec,

    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Signature encoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Malformed signature: expected 64 bytes, got {0}")]
    MalformedSignature(usize),

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid secret key")]
    InvalidSecretKey,
}

impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidHex(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthorizationError::InsufficientSignatures {
            valid: 1,
            required: 2,
        };
        assert!(err.to_string().contains("1 of 2"));
    }

    #[test]
    fn test_error_kind() {
        let err: BallotError = PhaseError::PhaseNotOpen {
            operation: "vote",
            current: Phase::Registration,
        }
        .into();
        assert_eq!(err.kind(), "phase_not_open");
        assert!(err.to_string().contains("registration"));

        let err: BallotError = VotingError::CandidateIndexOutOfRange { index: 7, count: 3 }.into();
        assert_eq!(err.kind(), "candidate_index_out_of_range");
    }
}
