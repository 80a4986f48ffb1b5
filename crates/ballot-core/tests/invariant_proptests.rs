//! Property tests over random operation sequences
//!
//! After every operation, successful or not:
//! - total votes equal the number of voters marked as voted
//! - nobody has voted without being registered
//! - the phase never moves backwards
//! - failed operations leave the snapshot unchanged

use std::collections::HashSet;
use std::sync::Arc;

use ballot_common::{Identity, Phase, Signature, SignatureVerifier};
use ballot_core::{BallotParams, VotingCore};
use proptest::prelude::*;

const CANDIDATES: [&str; 3] = ["Alice", "Bob", "Charlie"];
const MAX_OPS: usize = 60;

/// Accepts any signature; quorum membership is still enforced by the core
struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify(&self, _signer: &Identity, _message: &[u8], _signature: &Signature) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
enum Op {
    Register(u8),
    ChangePhase(u8),
    Vote(u8, u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..8).prop_map(Op::Register),
        1 => (0u8..3).prop_map(Op::ChangePhase),
        4 => ((0u8..10), (0u64..4)).prop_map(|(v, i)| Op::Vote(v, i)),
    ]
}

fn voter(n: u8) -> Identity {
    Identity::from_bytes([n + 100; 32])
}

fn admin(n: u8) -> Identity {
    Identity::from_bytes([n; 32])
}

fn quorum() -> Vec<Signature> {
    (1..=2).map(|n| Signature::new(admin(n), [0u8; 64])).collect()
}

fn core() -> VotingCore {
    VotingCore::new(
        BallotParams::new(CANDIDATES, (1..=3).map(admin).collect(), 2),
        Arc::new(AcceptAll),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_state_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..MAX_OPS)) {
        let core = core();
        let mut registered = HashSet::new();
        let mut voted = HashSet::new();
        let mut last_phase = core.get_phase();

        for op in ops {
            let before = core.snapshot();
            let result = match op {
                Op::Register(n) => core.register_voter(voter(n), &quorum()).map(|_| ()),
                Op::ChangePhase(p) => {
                    let phase = Phase::try_from(p).unwrap();
                    core.change_phase(phase, &quorum()).map(|_| ())
                }
                Op::Vote(n, index) => core.vote(&voter(n), index),
            };

            match (&op, &result) {
                (Op::Register(n), Ok(())) => {
                    prop_assert_eq!(before.phase, Phase::Registration);
                    prop_assert!(registered.insert(*n));
                }
                (Op::Vote(n, index), Ok(())) => {
                    prop_assert_eq!(before.phase, Phase::Voting);
                    prop_assert!(registered.contains(n));
                    prop_assert!((*index as usize) < CANDIDATES.len());
                    prop_assert!(voted.insert(*n));
                }
                (Op::ChangePhase(_), Ok(())) => {}
                (_, Err(_)) => prop_assert_eq!(&core.snapshot(), &before),
            }

            let phase = core.get_phase();
            prop_assert!(phase >= last_phase);
            last_phase = phase;

            prop_assert!(core.check_invariants().is_ok());
            let snapshot = core.snapshot();
            prop_assert_eq!(snapshot.registered_voters, registered.len());
            prop_assert_eq!(snapshot.votes_cast, voted.len());
        }
    }

    #[test]
    fn prop_winner_has_max_votes(votes in prop::collection::vec(0u64..3, 0..40)) {
        let core = core();
        for n in 0..votes.len() {
            core.register_voter(Identity::from_bytes([n as u8 + 10; 32]), &quorum()).unwrap();
        }
        core.change_phase(Phase::Voting, &quorum()).unwrap();
        for (n, index) in votes.iter().enumerate() {
            core.vote(&Identity::from_bytes([n as u8 + 10; 32]), *index).unwrap();
        }

        let results = core.get_results();
        let max = results.iter().map(|c| c.vote_count).max().unwrap();
        let first_max = results.iter().find(|c| c.vote_count == max).unwrap();
        prop_assert_eq!(core.get_winner(), first_max.name.clone());
    }
}
