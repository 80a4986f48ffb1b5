//! Candidate - name and accumulated vote count

use serde::{Deserialize, Serialize};

/// A candidate on the ballot, identified by its position in the ordered list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Display name (immutable after initialization)
    pub name: String,

    /// Number of votes received
    pub vote_count: u64,
}

impl Candidate {
    /// Create a candidate with zero votes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vote_count: 0,
        }
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} votes", self.name, self.vote_count)
    }
}
