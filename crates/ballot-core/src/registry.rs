//! Voter Registry
//!
//! Records exist only for registered identities, so `has_voted` can never
//! be true for an unregistered voter.

use std::collections::HashMap;

use ballot_common::{BallotError, Identity, Phase, RegistrationError, VotingError};
use serde::Serialize;

use crate::phase::PhaseMachine;

/// Per-voter state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoterRecord {
    pub is_registered: bool,
    pub has_voted: bool,
}

/// Registered voters and their voting status
#[derive(Debug, Default, Clone)]
pub struct VoterRegistry {
    records: HashMap<Identity, VoterRecord>,
    voted: usize,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a voter; only open during `Registration`
    pub fn register(&mut self, identity: Identity, phase: &PhaseMachine) -> Result<(), BallotError> {
        phase.require(Phase::Registration, "registerVoter")?;
        if self.is_registered(&identity) {
            return Err(RegistrationError::AlreadyRegistered(identity).into());
        }

        self.records.insert(
            identity,
            VoterRecord {
                is_registered: true,
                has_voted: false,
            },
        );
        Ok(())
    }

    /// Flip `has_voted`; only open during `Voting`
    pub fn mark_voted(&mut self, identity: &Identity, phase: &PhaseMachine) -> Result<(), BallotError> {
        phase.require(Phase::Voting, "vote")?;

        let record = self
            .records
            .get_mut(identity)
            .ok_or(RegistrationError::NotRegistered(*identity))?;
        if record.has_voted {
            return Err(VotingError::AlreadyVoted(*identity).into());
        }

        record.has_voted = true;
        self.voted += 1;
        Ok(())
    }

    /// Undo a `mark_voted` whose ballot could not be counted
    pub(crate) fn unmark_voted(&mut self, identity: &Identity) {
        if let Some(record) = self.records.get_mut(identity) {
            if record.has_voted {
                record.has_voted = false;
                self.voted -= 1;
            }
        }
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.records
            .get(identity)
            .map(|r| r.is_registered)
            .unwrap_or(false)
    }

    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.records
            .get(identity)
            .map(|r| r.has_voted)
            .unwrap_or(false)
    }

    /// Record for any identity; unknown identities read as all-false
    pub fn record(&self, identity: &Identity) -> VoterRecord {
        self.records.get(identity).copied().unwrap_or_default()
    }

    pub fn registered_count(&self) -> usize {
        self.records.len()
    }

    pub fn voted_count(&self) -> usize {
        self.voted
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &VoterRecord)> {
        self.records.iter()
    }
}
