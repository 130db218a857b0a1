//! Chat Cadence — adaptive group-messaging send-rate controller.
//!
//! Demo entry point: wires a controller to a simulated chat transport,
//! feeds it synthetic chatter, and runs the automation loop until ctrl-c.

use cadence_automation::{AutomationLoop, SimulatedChat};
use cadence_controller::pacing::UniformSource;
use cadence_controller::Controller;
use cadence_core::config::AppConfig;
use cadence_core::types::{ActorId, DestinationId};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "chat-cadence")]
#[command(about = "Adaptive group-messaging send-rate controller (simulated transport demo)")]
#[command(version)]
struct Cli {
    /// Actor id the automation sends as (overrides config)
    #[arg(long, env = "CHAT_CADENCE__ACTOR_ID")]
    actor_id: Option<i64>,

    /// Number of simulated destinations
    #[arg(long, default_value_t = 8)]
    destinations: usize,

    /// Destination ids that reject sends (exercises the ban path)
    #[arg(long, value_delimiter = ',')]
    forbid: Vec<i64>,

    /// Seed for the interval and simulation RNGs (deterministic runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum seconds between synthetic chatter messages
    #[arg(long, default_value_t = 20)]
    chatter_max_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_cadence=info,cadence_automation=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(actor_id) = cli.actor_id {
        config.actor_id = actor_id;
    }
    let actor = ActorId(config.actor_id);

    info!(
        actor = %actor,
        destinations = cli.destinations,
        forbidden = cli.forbid.len(),
        "Chat Cadence starting up"
    );

    let source = match cli.seed {
        Some(seed) => UniformSource::seeded(seed),
        None => UniformSource::new(),
    };
    let controller = Arc::new(Controller::new(
        &config.pacing,
        Arc::new(cadence_core::clock::SystemClock),
        Arc::new(source),
    ));

    let mut chat = match cli.seed {
        Some(seed) => SimulatedChat::with_seed(cli.destinations, seed),
        None => SimulatedChat::new(cli.destinations),
    };
    for id in &cli.forbid {
        chat.forbid(DestinationId(*id));
    }
    let transport = Arc::new(chat);

    let messages = vec![
        "hey, how is everyone doing?".to_string(),
        "anything interesting happening here today?".to_string(),
        "just dropping by to say hi".to_string(),
        "what did I miss?".to_string(),
    ];

    let looper = Arc::new(AutomationLoop::new(
        controller.clone(),
        transport.clone(),
        actor,
        messages,
        config.automation.clone(),
    )?);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Synthetic humans keep the activity tracker fed so the adaptive
    // intervals have something to react to.
    let chatter_controller = controller.clone();
    let chatter_transport = transport.clone();
    let chatter_max = cli.chatter_max_secs.max(1);
    let mut chatter_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        loop {
            let wait = std::time::Duration::from_secs(1 + rand::random::<u64>() % chatter_max);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = chatter_shutdown.changed() => return,
            }
            if let Some((destination, sender)) = chatter_transport.chatter() {
                chatter_controller.on_message_observed(destination, sender, Utc::now());
            }
        }
    });

    let loop_handle = {
        let looper = looper.clone();
        tokio::spawn(async move { looper.run(shutdown_rx).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("ctrl-c received, shutting down");
    let _ = shutdown_tx.send(true);
    loop_handle.await??;

    info!(sent = transport.sent_count(), "Chat Cadence stopped");
    Ok(())
}
