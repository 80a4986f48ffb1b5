//! Admin Quorum Authorizer
//!
//! Decides whether a set of signatures over an action satisfies the admin
//! quorum. Signatures are processed in input order and every one of them
//! gets a [`SignatureCheck`], so a decision can be replayed from the audit
//! trail. Only distinct admin signers that verify count toward the
//! threshold.

use std::collections::BTreeSet;
use std::sync::Arc;

use ballot_common::{
    ActionDigest, ActionPayload, AuthorizationError, ConfigError, Identity, Signature,
    SignatureVerifier,
};
use serde::Serialize;
use tracing::{debug, warn};

/// Result of checking one signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Valid admin signature, counted toward quorum
    Accepted,
    /// Valid admin signature from a signer already counted
    Duplicate,
    /// Did not verify against the action digest
    InvalidSignature,
    /// Verified, but the signer is not an admin
    UnauthorizedSigner,
}

/// Per-signature audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureCheck {
    /// Position in the submitted sequence
    pub position: usize,
    /// Claimed signer
    pub signer: Identity,
    pub outcome: CheckOutcome,
}

/// A satisfied quorum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub action: ActionPayload,
    #[serde(serialize_with = "serialize_digest")]
    pub digest: ActionDigest,
    /// Distinct accepted admins, in first-seen order
    pub signers: Vec<Identity>,
    pub checks: Vec<SignatureCheck>,
}

fn serialize_digest<S: serde::Serializer>(digest: &ActionDigest, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(digest))
}

/// Fixed admin set with a required-signature threshold
pub struct AdminQuorum {
    admins: BTreeSet<Identity>,
    required_signatures: usize,
    domain: String,
    verifier: Arc<dyn SignatureVerifier>,
}

impl std::fmt::Debug for AdminQuorum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminQuorum")
            .field("admins", &self.admins)
            .field("required_signatures", &self.required_signatures)
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl AdminQuorum {
    /// Validates `1 <= required_signatures <= |admins|` and admin uniqueness
    pub fn new(
        admins: impl IntoIterator<Item = Identity>,
        required_signatures: usize,
        domain: impl Into<String>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<Self, ConfigError> {
        let mut set = BTreeSet::new();
        for admin in admins {
            if !set.insert(admin) {
                return Err(ConfigError::DuplicateAdmin(admin));
            }
        }

        if set.is_empty() {
            return Err(ConfigError::NoAdmins);
        }
        if required_signatures == 0 || required_signatures > set.len() {
            return Err(ConfigError::InvalidThreshold {
                required: required_signatures,
                admins: set.len(),
            });
        }

        Ok(Self {
            admins: set,
            required_signatures,
            domain: domain.into(),
            verifier,
        })
    }

    pub fn required_signatures(&self) -> usize {
        self.required_signatures
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admins.contains(identity)
    }

    /// Admin identities in canonical (byte) order
    pub fn admins(&self) -> impl Iterator<Item = &Identity> {
        self.admins.iter()
    }

    /// Check signatures against the action's digest in this quorum's domain
    pub fn authorize(
        &self,
        action: &ActionPayload,
        signatures: &[Signature],
    ) -> Result<Authorization, AuthorizationError> {
        let digest = action.digest(&self.domain);
        let mut signers: Vec<Identity> = Vec::with_capacity(self.required_signatures);
        let mut checks = Vec::with_capacity(signatures.len());

        for (position, signature) in signatures.iter().enumerate() {
            let signer = signature.signer;
            let outcome = if !self.verifier.verify(&signer, &digest, signature) {
                CheckOutcome::InvalidSignature
            } else if !self.is_admin(&signer) {
                CheckOutcome::UnauthorizedSigner
            } else if signers.contains(&signer) {
                CheckOutcome::Duplicate
            } else {
                signers.push(signer);
                CheckOutcome::Accepted
            };

            debug!(%action, position, signer = %signer.short(), ?outcome, "Signature checked");
            checks.push(SignatureCheck {
                position,
                signer,
                outcome,
            });
        }

        if signers.is_empty() {
            warn!(%action, submitted = signatures.len(), "No valid admin signatures");
            return Err(AuthorizationError::NoValidSignatures);
        }
        if signers.len() < self.required_signatures {
            warn!(
                %action,
                valid = signers.len(),
                required = self.required_signatures,
                "Admin quorum not met"
            );
            return Err(AuthorizationError::InsufficientSignatures {
                valid: signers.len(),
                required: self.required_signatures,
            });
        }

        debug!(%action, digest = %hex::encode(digest), signers = signers.len(), "Admin quorum met");
        Ok(Authorization {
            action: *action,
            digest,
            signers,
            checks,
        })
    }
}
