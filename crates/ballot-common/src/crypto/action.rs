//! Signable actions and their canonical digests
//!
//! Every gated operation is signed over a 32-byte BLAKE3 digest of the
//! action name and its arguments, bound to an election domain. The encoding
//! is length-prefixed so no two distinct `(domain, action)` pairs share
//! a preimage.

use serde::{Deserialize, Serialize};

use crate::types::{identity::Identity, phase::Phase};

/// Context tag mixed into every digest
const DIGEST_CONTEXT: &[u8] = b"ballot-core action v1";

/// 32-byte action digest
pub type ActionDigest = [u8; 32];

/// The closed set of actions that carry signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionPayload {
    /// Admin quorum registers a voter
    RegisterVoter { voter: Identity },
    /// Admin quorum moves the lifecycle
    ChangePhase { phase: Phase },
    /// A voter casts a ballot for a candidate
    CastVote { candidate_index: u64 },
}

impl ActionPayload {
    /// Action name as it appears in the digest
    pub fn name(&self) -> &'static str {
        match self {
            ActionPayload::RegisterVoter { .. } => "registerVoter",
            ActionPayload::ChangePhase { .. } => "changePhase",
            ActionPayload::CastVote { .. } => "vote",
        }
    }

    /// Canonical argument bytes
    fn argument_bytes(&self) -> Vec<u8> {
        match self {
            ActionPayload::RegisterVoter { voter } => voter.as_bytes().to_vec(),
            ActionPayload::ChangePhase { phase } => vec![phase.as_u8()],
            ActionPayload::CastVote { candidate_index } => candidate_index.to_be_bytes().to_vec(),
        }
    }

    /// Digest signers sign. Identical for the same action and domain no
    /// matter who computes it.
    pub fn digest(&self, domain: &str) -> ActionDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DIGEST_CONTEXT);
        update_prefixed(&mut hasher, domain.as_bytes());
        update_prefixed(&mut hasher, self.name().as_bytes());
        update_prefixed(&mut hasher, &self.argument_bytes());
        *hasher.finalize().as_bytes()
    }
}

fn update_prefixed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

impl std::fmt::Display for ActionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionPayload::RegisterVoter { voter } => write!(f, "registerVoter({})", voter.short()),
            ActionPayload::ChangePhase { phase } => write!(f, "changePhase({phase})"),
            ActionPayload::CastVote { candidate_index } => write!(f, "vote({candidate_index})"),
        }
    }
}
