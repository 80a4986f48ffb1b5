//! Ballot Service Binary

use std::sync::Arc;

use anyhow::Result;
use ballot_core::VotingCore;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ballot_server::{router, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting ballot service v{}", ballot_common::VERSION);

    let config = ServerConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let params = config.election.to_params()?;
    let core = Arc::new(VotingCore::with_ed25519(params)?);

    // Mirror committed state changes into the log
    let mut events = core.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(?event, "Ballot event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal");
    };

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API listening on {}", addr);

    axum::serve(listener, router(core))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Shutting down ballot service");
    Ok(())
}
