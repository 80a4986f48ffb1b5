//! Admin and voter signing tool.
//!
//! Produces the signature JSON accepted by the ballot REST API, signed over
//! the same action digest the server verifies against.

use anyhow::{Context, Result};
use ballot_common::{sign_action, signing_key_from_hex, ActionPayload, Identity, Phase, DEFAULT_DOMAIN};
use clap::{Parser, Subcommand};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "ballot-sign", version, about = "Sign ballot actions for the REST API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a new ed25519 key pair
    Keygen,
    /// Sign an action with a secret key
    Sign {
        /// Hex-encoded 32-byte secret key
        #[arg(long)]
        secret: String,
        /// Election domain the signature is bound to
        #[arg(long, default_value = DEFAULT_DOMAIN)]
        domain: String,
        /// Print the digest alongside the signature
        #[arg(long)]
        verbose: bool,
        #[command(subcommand)]
        action: ActionArg,
    },
}

#[derive(Debug, Subcommand)]
enum ActionArg {
    /// Approve registering a voter (did:key or hex identity)
    RegisterVoter { voter: Identity },
    /// Approve a phase change (registration, voting, ended)
    ChangePhase { phase: Phase },
    /// Cast a vote as the key holder
    Vote { candidate_index: u64 },
}

impl From<ActionArg> for ActionPayload {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::RegisterVoter { voter } => ActionPayload::RegisterVoter { voter },
            ActionArg::ChangePhase { phase } => ActionPayload::ChangePhase { phase },
            ActionArg::Vote { candidate_index } => ActionPayload::CastVote { candidate_index },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = match cli.command {
        Command::Keygen => {
            let signing_key = SigningKey::generate(&mut OsRng);
            let identity = Identity::from_signing_key(&signing_key);
            json!({
                "secret": hex::encode(signing_key.to_bytes()),
                "identity": identity,
                "public_key": hex::encode(identity.as_bytes()),
            })
        }
        Command::Sign {
            secret,
            domain,
            verbose,
            action,
        } => {
            let signing_key = signing_key_from_hex(&secret).context("Invalid secret key")?;
            let action = ActionPayload::from(action);
            let signature = sign_action(&signing_key, &action, &domain);

            if verbose {
                json!({
                    "action": action,
                    "domain": domain,
                    "digest": hex::encode(action.digest(&domain)),
                    "signature": signature,
                })
            } else {
                serde_json::to_value(&signature)?
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
