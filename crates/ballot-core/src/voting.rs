//! Voting Core
//!
//! The façade external callers use. All ballot state sits behind one
//! `RwLock`: mutating operations hold the write lock for their whole
//! read-modify-write, queries take the read lock and therefore always see a
//! committed state. Authorization is pure over the immutable admin set and
//! runs before the lock is taken.
//!
//! Every mutating operation is all-or-nothing. On error the state is
//! exactly what it was before the call.

use std::sync::Arc;

use ballot_common::audit::{AuditCategory, AuditEvent, AuditLog, AuditOutcome};
use ballot_common::{
    ActionPayload, AuthorizationError, BallotError, Candidate, ConfigError, Ed25519Verifier,
    Identity, Phase, Result, Signature, SignatureVerifier, DEFAULT_DOMAIN,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::authorizer::{AdminQuorum, Authorization};
use crate::events::{EventBus, VotingEvent};
use crate::phase::{PhaseMachine, Transition};
use crate::registry::{VoterRecord, VoterRegistry};
use crate::tally::CandidateTally;

/// Construction-time parameters, immutable afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotParams {
    /// Election domain signatures are bound to
    pub domain: String,
    /// Ordered candidate names
    pub candidates: Vec<String>,
    /// Admin identities
    pub admins: Vec<Identity>,
    /// Distinct admin signatures needed for gated operations
    pub required_signatures: usize,
}

impl BallotParams {
    pub fn new<S: Into<String>>(
        candidates: impl IntoIterator<Item = S>,
        admins: Vec<Identity>,
        required_signatures: usize,
    ) -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            candidates: candidates.into_iter().map(Into::into).collect(),
            admins,
            required_signatures,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }
}

/// Consistent read of the whole ballot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BallotSnapshot {
    pub phase: Phase,
    pub candidates: Vec<Candidate>,
    pub winner: String,
    pub registered_voters: usize,
    pub votes_cast: usize,
}

/// A broken state invariant (never expected outside of bugs)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Vote total {votes} does not match {voted} voters marked as voted")]
    TallyMismatch { votes: u64, voted: usize },

    #[error("Voter {0} has voted without being registered")]
    VotedWithoutRegistration(Identity),
}

#[derive(Debug)]
struct BallotState {
    phase: PhaseMachine,
    registry: VoterRegistry,
    tally: CandidateTally,
}

/// Multi-signature gated voting state machine
pub struct VotingCore {
    quorum: AdminQuorum,
    verifier: Arc<dyn SignatureVerifier>,
    state: RwLock<BallotState>,
    events: EventBus,
    audit: AuditLog,
}

impl VotingCore {
    /// Create a core in the `Registration` phase
    pub fn new(params: BallotParams, verifier: Arc<dyn SignatureVerifier>) -> std::result::Result<Self, ConfigError> {
        let tally = CandidateTally::new(params.candidates)?;
        let quorum = AdminQuorum::new(
            params.admins,
            params.required_signatures,
            params.domain,
            verifier.clone(),
        )?;

        info!(
            domain = quorum.domain(),
            candidates = tally.candidate_count(),
            admins = quorum.admins().count(),
            required_signatures = quorum.required_signatures(),
            "Ballot initialized"
        );

        Ok(Self {
            quorum,
            verifier,
            state: RwLock::new(BallotState {
                phase: PhaseMachine::new(),
                registry: VoterRegistry::new(),
                tally,
            }),
            events: EventBus::default(),
            audit: AuditLog::new(),
        })
    }

    /// Create a core verifying ed25519 signatures
    pub fn with_ed25519(params: BallotParams) -> std::result::Result<Self, ConfigError> {
        Self::new(params, Arc::new(Ed25519Verifier))
    }

    /// Replace the audit log
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Receive events published after each committed mutation
    pub fn subscribe(&self) -> broadcast::Receiver<VotingEvent> {
        self.events.subscribe()
    }

    fn authorize(&self, action: &ActionPayload, signatures: &[Signature]) -> Result<Authorization> {
        self.quorum.authorize(action, signatures).map_err(|err| {
            self.audit.record(
                AuditEvent::new(AuditCategory::Authorization, action.name(), AuditOutcome::Rejected)
                    .with_detail("submitted", signatures.len().to_string())
                    .with_detail("error", BallotError::from(err.clone()).kind()),
            );
            err.into()
        })
    }

    fn record_outcome<T>(&self, event: AuditEvent, result: &Result<T>) {
        let event = match result {
            Ok(_) => event,
            Err(err) => {
                let mut event = event.with_detail("error", err.kind());
                event.outcome = AuditOutcome::Rejected;
                event
            }
        };
        self.audit.record(event);
    }

    /// Register a voter with an admin quorum over `RegisterVoter { voter }`
    #[instrument(skip(self, signatures), fields(voter = %voter.short(), signatures = signatures.len()))]
    pub fn register_voter(&self, voter: Identity, signatures: &[Signature]) -> Result<()> {
        let action = ActionPayload::RegisterVoter { voter };
        let authorization = self.authorize(&action, signatures)?;

        let result = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            state.registry.register(voter, &state.phase).map(|()| {
                self.events.publish(VotingEvent::VoterRegistered { voter });
            })
        };

        self.record_outcome(
            AuditEvent::new(AuditCategory::Registration, action.name(), AuditOutcome::Committed)
                .with_actor(voter.to_string())
                .with_detail("signers", join_signers(&authorization)),
            &result,
        );
        if result.is_ok() {
            info!(voter = %voter, "Voter registered");
        }
        result
    }

    /// Move the lifecycle with an admin quorum over `ChangePhase { phase }`
    #[instrument(skip(self, signatures), fields(signatures = signatures.len()))]
    pub fn change_phase(&self, phase: Phase, signatures: &[Signature]) -> Result<Transition> {
        let action = ActionPayload::ChangePhase { phase };
        let authorization = self.authorize(&action, signatures)?;

        let result = {
            let mut state = self.state.write();
            state.phase.transition(phase).map_err(BallotError::from).map(|transition| {
                if transition.is_advance() {
                    self.events.publish(VotingEvent::PhaseChanged { phase });
                }
                transition
            })
        };

        self.record_outcome(
            AuditEvent::new(AuditCategory::Phase, action.name(), AuditOutcome::Committed)
                .with_actor(join_signers(&authorization))
                .with_detail("target", phase.to_string()),
            &result,
        );
        if let Ok(Transition::Advanced { from, to }) = &result {
            info!(%from, %to, "Phase changed");
        }
        result
    }

    /// Cast `voter`'s single vote.
    ///
    /// The caller is responsible for having established `voter` as the
    /// caller's own identity; see [`VotingCore::vote_signed`].
    #[instrument(skip(self), fields(voter = %voter.short()))]
    pub fn vote(&self, voter: &Identity, candidate_index: u64) -> Result<()> {
        let result = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            state.registry.mark_voted(voter, &state.phase).and_then(|()| {
                if let Err(err) = state.tally.increment_vote(candidate_index) {
                    state.registry.unmark_voted(voter);
                    return Err(err.into());
                }
                self.events.publish(VotingEvent::VoteCasted {
                    voter: *voter,
                    candidate_index,
                });
                Ok(())
            })
        };

        self.record_outcome(
            AuditEvent::new(AuditCategory::Vote, "vote", AuditOutcome::Committed)
                .with_actor(voter.to_string())
                .with_detail("candidate_index", candidate_index.to_string()),
            &result,
        );
        if result.is_ok() {
            info!(voter = %voter, candidate_index, "Vote cast");
        }
        result
    }

    /// Cast a vote proven by the voter's own signature over `CastVote`
    pub fn vote_signed(&self, signature: &Signature, candidate_index: u64) -> Result<()> {
        let action = ActionPayload::CastVote { candidate_index };
        let digest = action.digest(self.quorum.domain());

        if !self.verifier.verify(&signature.signer, &digest, signature) {
            let result: Result<()> = Err(AuthorizationError::InvalidVoterSignature.into());
            self.record_outcome(
                AuditEvent::new(AuditCategory::Vote, action.name(), AuditOutcome::Committed)
                    .with_actor(signature.signer.to_string()),
                &result,
            );
            return result;
        }

        self.vote(&signature.signer, candidate_index)
    }

    pub fn get_phase(&self) -> Phase {
        self.state.read().phase.current()
    }

    pub fn get_candidates_count(&self) -> usize {
        self.state.read().tally.candidate_count()
    }

    pub fn get_candidate(&self, index: u64) -> Result<Candidate> {
        Ok(self.state.read().tally.get_candidate(index)?.clone())
    }

    /// Name of the leading candidate; meaningful once the phase is `Ended`
    pub fn get_winner(&self) -> String {
        self.state.read().tally.winner().name.clone()
    }

    pub fn get_results(&self) -> Vec<Candidate> {
        self.state.read().tally.results().to_vec()
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.state.read().registry.is_registered(identity)
    }

    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.state.read().registry.has_voted(identity)
    }

    /// Registration and voting status read under one lock
    pub fn voter_record(&self, identity: &Identity) -> VoterRecord {
        self.state.read().registry.record(identity)
    }

    pub fn snapshot(&self) -> BallotSnapshot {
        let state = self.state.read();
        BallotSnapshot {
            phase: state.phase.current(),
            candidates: state.tally.results().to_vec(),
            winner: state.tally.winner().name.clone(),
            registered_voters: state.registry.registered_count(),
            votes_cast: state.registry.voted_count(),
        }
    }

    pub fn domain(&self) -> &str {
        self.quorum.domain()
    }

    pub fn required_signatures(&self) -> usize {
        self.quorum.required_signatures()
    }

    pub fn admins(&self) -> Vec<Identity> {
        self.quorum.admins().copied().collect()
    }

    /// Check the tally/registry invariants against live state
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        let state = self.state.read();

        let votes = state.tally.total_votes();
        let voted = state.registry.iter().filter(|(_, r)| r.has_voted).count();
        if votes != voted as u64 || voted != state.registry.voted_count() {
            return Err(InvariantViolation::TallyMismatch { votes, voted });
        }

        if let Some((identity, _)) = state
            .registry
            .iter()
            .find(|(_, r)| r.has_voted && !r.is_registered)
        {
            return Err(InvariantViolation::VotedWithoutRegistration(*identity));
        }
        Ok(())
    }
}

fn join_signers(authorization: &Authorization) -> String {
    authorization
        .signers
        .iter()
        .map(Identity::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_common::audit::MemoryAuditSink;
    use ballot_common::{sign_action, PhaseError, RegistrationError, VotingError};
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    struct Fixture {
        core: VotingCore,
        admins: Vec<SigningKey>,
        audit: MemoryAuditSink,
    }

    impl Fixture {
        fn new() -> Self {
            let admins: Vec<SigningKey> = (0..3).map(|_| SigningKey::generate(&mut OsRng)).collect();
            let params = BallotParams::new(
                ["Alice", "Bob"],
                admins.iter().map(Identity::from_signing_key).collect(),
                2,
            )
            .with_domain("unit");
            let audit = MemoryAuditSink::new();
            let core = VotingCore::with_ed25519(params)
                .unwrap()
                .with_audit(AuditLog::disabled().with_sink(Arc::new(audit.clone())));
            Self { core, admins, audit }
        }

        fn sign(&self, action: ActionPayload, which: &[usize]) -> Vec<Signature> {
            which
                .iter()
                .map(|i| sign_action(&self.admins[*i], &action, "unit"))
                .collect()
        }

        fn register(&self, voter: Identity) -> Result<()> {
            let sigs = self.sign(ActionPayload::RegisterVoter { voter }, &[0, 1]);
            self.core.register_voter(voter, &sigs)
        }

        fn advance(&self, phase: Phase) -> Result<Transition> {
            let sigs = self.sign(ActionPayload::ChangePhase { phase }, &[1, 2]);
            self.core.change_phase(phase, &sigs)
        }
    }

    fn voter(n: u8) -> Identity {
        Identity::from_bytes([n; 32])
    }

    #[test]
    fn test_out_of_range_vote_rolls_back() {
        let f = Fixture::new();
        f.register(voter(1)).unwrap();
        f.advance(Phase::Voting).unwrap();

        let result = f.core.vote(&voter(1), 5);
        assert_eq!(
            result,
            Err(VotingError::CandidateIndexOutOfRange { index: 5, count: 2 }.into())
        );
        assert!(!f.core.has_voted(&voter(1)));
        f.core.check_invariants().unwrap();

        // Voter can still vote for a valid candidate afterwards
        f.core.vote(&voter(1), 1).unwrap();
        assert_eq!(f.core.get_candidate(1).unwrap().vote_count, 1);
        f.core.check_invariants().unwrap();
    }

    #[test]
    fn test_failed_authorization_changes_nothing() {
        let f = Fixture::new();
        let sigs = f.sign(ActionPayload::RegisterVoter { voter: voter(1) }, &[0]);

        let result = f.core.register_voter(voter(1), &sigs);
        assert!(matches!(
            result,
            Err(BallotError::Authorization(
                AuthorizationError::InsufficientSignatures { valid: 1, required: 2 }
            ))
        ));
        assert!(!f.core.is_registered(&voter(1)));
    }

    #[test]
    fn test_signatures_for_other_voter_rejected() {
        let f = Fixture::new();
        let sigs = f.sign(ActionPayload::RegisterVoter { voter: voter(1) }, &[0, 1]);

        let result = f.core.register_voter(voter(2), &sigs);
        assert_eq!(
            result,
            Err(AuthorizationError::NoValidSignatures.into())
        );
    }

    #[test]
    fn test_register_twice() {
        let f = Fixture::new();
        f.register(voter(1)).unwrap();
        assert_eq!(
            f.register(voter(1)),
            Err(RegistrationError::AlreadyRegistered(voter(1)).into())
        );
        assert_eq!(f.core.snapshot().registered_voters, 1);
    }

    #[test]
    fn test_registration_closed_after_voting_starts() {
        let f = Fixture::new();
        f.advance(Phase::Voting).unwrap();
        assert!(matches!(
            f.register(voter(1)),
            Err(BallotError::Phase(PhaseError::PhaseNotOpen {
                operation: "registerVoter",
                current: Phase::Voting
            }))
        ));
    }

    #[test]
    fn test_idempotent_phase_change() {
        let f = Fixture::new();
        let mut rx = f.core.subscribe();

        assert_eq!(
            f.advance(Phase::Registration).unwrap(),
            Transition::Unchanged {
                phase: Phase::Registration
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_vote_signed() {
        let f = Fixture::new();
        let voter_key = SigningKey::generate(&mut OsRng);
        let voter_id = Identity::from_signing_key(&voter_key);
        f.register(voter_id).unwrap();
        f.advance(Phase::Voting).unwrap();

        // Signed for candidate 0, submitted for candidate 1
        let wrong = sign_action(&voter_key, &ActionPayload::CastVote { candidate_index: 0 }, "unit");
        assert_eq!(
            f.core.vote_signed(&wrong, 1),
            Err(AuthorizationError::InvalidVoterSignature.into())
        );
        assert!(!f.core.has_voted(&voter_id));

        f.core.vote_signed(&wrong, 0).unwrap();
        assert!(f.core.has_voted(&voter_id));
        assert_eq!(f.core.get_winner(), "Alice");
    }

    #[test]
    fn test_audit_records_every_attempt() {
        let f = Fixture::new();
        f.register(voter(1)).unwrap();
        let _ = f.register(voter(1));
        let _ = f.core.vote(&voter(1), 0);

        let events = f.audit.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].outcome, AuditOutcome::Committed);
        assert_eq!(events[1].outcome, AuditOutcome::Rejected);
        assert_eq!(
            events[1].details.get("error").map(String::as_str),
            Some("already_registered")
        );
        assert_eq!(
            events[2].details.get("error").map(String::as_str),
            Some("phase_not_open")
        );
    }

    #[test]
    fn test_snapshot() {
        let f = Fixture::new();
        f.register(voter(1)).unwrap();
        f.register(voter(2)).unwrap();
        f.advance(Phase::Voting).unwrap();
        f.core.vote(&voter(2), 1).unwrap();

        let snapshot = f.core.snapshot();
        assert_eq!(snapshot.phase, Phase::Voting);
        assert_eq!(snapshot.registered_voters, 2);
        assert_eq!(snapshot.votes_cast, 1);
        assert_eq!(snapshot.winner, "Bob");

        assert_eq!(
            f.core.voter_record(&voter(2)),
            VoterRecord {
                is_registered: true,
                has_voted: true
            }
        );
        assert_eq!(f.core.voter_record(&voter(9)), VoterRecord::default());
    }
}
