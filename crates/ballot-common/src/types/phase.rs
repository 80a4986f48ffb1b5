//! Ballot lifecycle phase
//!
//! The lifecycle is a fixed linear order: `Registration -> Voting -> Ended`.
//! `Ended` is terminal.

use serde::{Deserialize, Serialize};

use crate::error::PhaseError;

/// Lifecycle phase
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Phase {
    /// Admins register voters
    #[default]
    Registration = 0,
    /// Registered voters cast their vote
    Voting = 1,
    /// Tallies are final
    Ended = 2,
}

impl Phase {
    /// Every phase in lifecycle order
    pub const ALL: [Phase; 3] = [Phase::Registration, Phase::Voting, Phase::Ended];

    /// Immediate successor, `None` for the terminal phase
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Registration => Some(Phase::Voting),
            Phase::Voting => Some(Phase::Ended),
            Phase::Ended => None,
        }
    }

    /// Wire value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl TryFrom<u8> for Phase {
    type Error = PhaseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Phase::Registration),
            1 => Ok(Phase::Voting),
            2 => Ok(Phase::Ended),
            other => Err(PhaseError::UnknownPhase(other)),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = PhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registration" => Ok(Phase::Registration),
            "voting" => Ok(Phase::Voting),
            "ended" => Ok(Phase::Ended),
            other => match other.parse::<u8>() {
                Ok(value) => Phase::try_from(value),
                Err(_) => Err(PhaseError::UnrecognizedPhase(s.trim().to_string())),
            },
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Registration => write!(f, "registration"),
            Phase::Voting => write!(f, "voting"),
            Phase::Ended => write!(f, "ended"),
        }
    }
}
