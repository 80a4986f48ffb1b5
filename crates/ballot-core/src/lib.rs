//! # Ballot Core
//!
//! Multi-signature gated voting state machine.
//!
//! ## Components
//!
//! - **Authorizer**: admin quorum over signatures on a canonical action digest
//! - **Phase**: `Registration -> Voting -> Ended` lifecycle and operation gating
//! - **Registry**: registered voters and the single-vote invariant
//! - **Tally**: candidate vote counts and deterministic winner
//! - **Voting**: the façade that runs every public operation atomically
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         VotingCore                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────────┐      RwLock<BallotState>                  │
//! │  │  AdminQuorum  │   ┌──────────────┬──────────┬──────────┐  │
//! │  │  (verifier)   │──▶│ PhaseMachine │ Registry │  Tally   │  │
//! │  └───────────────┘   └──────────────┴──────────┴──────────┘  │
//! │                              │                               │
//! │                         EventBus (broadcast)                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod authorizer;
pub mod events;
pub mod phase;
pub mod registry;
pub mod tally;
pub mod voting;

pub use authorizer::{AdminQuorum, Authorization, CheckOutcome, SignatureCheck};
pub use events::{EventBus, VotingEvent};
pub use phase::{PhaseMachine, Transition};
pub use registry::{VoterRecord, VoterRegistry};
pub use tally::CandidateTally;
pub use voting::{BallotParams, BallotSnapshot, InvariantViolation, VotingCore};

/// Buffered events per subscriber before slow receivers start lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
