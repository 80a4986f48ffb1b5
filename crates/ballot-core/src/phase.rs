//! Phase State Machine
//!
//! Legal moves are to the immediate successor or to the current phase
//! (idempotent no-op). Everything else is an illegal transition.

use ballot_common::{Phase, PhaseError};
use serde::Serialize;

/// Outcome of a legal transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    /// The phase moved forward one step
    Advanced { from: Phase, to: Phase },
    /// Target equals the current phase; nothing changed
    Unchanged { phase: Phase },
}

impl Transition {
    pub fn is_advance(&self) -> bool {
        matches!(self, Transition::Advanced { .. })
    }
}

/// Tracks the current lifecycle phase
#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    current: Phase,
}

impl PhaseMachine {
    /// Starts in `Registration`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    /// Validate a transition without applying it
    pub fn check(&self, target: Phase) -> Result<Transition, PhaseError> {
        if target == self.current {
            return Ok(Transition::Unchanged { phase: target });
        }
        if self.current.next() == Some(target) {
            return Ok(Transition::Advanced {
                from: self.current,
                to: target,
            });
        }
        Err(PhaseError::IllegalPhaseTransition {
            from: self.current,
            to: target,
        })
    }

    /// Apply a transition
    pub fn transition(&mut self, target: Phase) -> Result<Transition, PhaseError> {
        let transition = self.check(target)?;
        self.current = target;
        Ok(transition)
    }

    /// Gate an operation on the current phase
    pub fn require(&self, expected: Phase, operation: &'static str) -> Result<(), PhaseError> {
        if self.current == expected {
            Ok(())
        } else {
            Err(PhaseError::PhaseNotOpen {
                operation,
                current: self.current,
            })
        }
    }
}
