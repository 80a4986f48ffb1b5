//! Candidate Tally

use ballot_common::{Candidate, ConfigError, VotingError};

/// Ordered candidates and their vote counts
#[derive(Debug, Clone)]
pub struct CandidateTally {
    candidates: Vec<Candidate>,
}

impl CandidateTally {
    /// Build from the fixed ordered list of names
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates: Vec<Candidate> = names.into_iter().map(Candidate::new).collect();
        if candidates.is_empty() {
            return Err(ConfigError::NoCandidates);
        }
        if let Some(index) = candidates.iter().position(|c| c.name.trim().is_empty()) {
            return Err(ConfigError::EmptyCandidateName(index));
        }
        Ok(Self { candidates })
    }

    fn position(&self, index: u64) -> Result<usize, VotingError> {
        usize::try_from(index)
            .ok()
            .filter(|i| *i < self.candidates.len())
            .ok_or(VotingError::CandidateIndexOutOfRange {
                index,
                count: self.candidates.len(),
            })
    }

    pub fn increment_vote(&mut self, index: u64) -> Result<(), VotingError> {
        let position = self.position(index)?;
        self.candidates[position].vote_count += 1;
        Ok(())
    }

    /// First candidate (lowest index) among those with the most votes
    pub fn winner(&self) -> &Candidate {
        let mut best = &self.candidates[0];
        for candidate in &self.candidates[1..] {
            if candidate.vote_count > best.vote_count {
                best = candidate;
            }
        }
        best
    }

    pub fn get_candidate(&self, index: u64) -> Result<&Candidate, VotingError> {
        let position = self.position(index)?;
        Ok(&self.candidates[position])
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn results(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally() -> CandidateTally {
        CandidateTally::new(["Alice", "Bob", "Charlie"]).unwrap()
    }

    #[test]
    fn test_winner_with_no_votes_is_first() {
        assert_eq!(tally().winner().name, "Alice");
    }

    #[test]
    fn test_winner_after_one_vote() {
        let mut tally = tally();
        tally.increment_vote(2).unwrap();
        assert_eq!(tally.winner().name, "Charlie");
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        let mut tally = tally();
        tally.increment_vote(2).unwrap();
        tally.increment_vote(1).unwrap();
        assert_eq!(tally.winner().name, "Bob");
    }

    #[test]
    fn test_out_of_range() {
        let mut tally = tally();
        assert_eq!(
            tally.increment_vote(3),
            Err(VotingError::CandidateIndexOutOfRange { index: 3, count: 3 })
        );
        assert!(tally.get_candidate(u64::MAX).is_err());
        assert_eq!(tally.total_votes(), 0);
    }

    #[test]
    fn test_invalid_candidates() {
        assert!(matches!(
            CandidateTally::new(Vec::<String>::new()),
            Err(ConfigError::NoCandidates)
        ));
        assert!(matches!(
            CandidateTally::new(["Alice", " "]),
            Err(ConfigError::EmptyCandidateName(1))
        ));
    }
}
