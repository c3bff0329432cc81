//! APLink bus demo.
//!
//! Runs two participants over the in-memory loopback transport: Bob raises
//! his hand, Alice sees it, Bob lowers it, and the call is ended. Prints the
//! bus metrics at the end.
//!
//! Config: `aplink.yaml` in the working directory if present, defaults
//! otherwise. `RUST_LOG` overrides `logging.filter`.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use aplink_bus::app_state::AppState;
use aplink_bus::audio::{AudioBackend, NullAudio};
use aplink_bus::config::{self, AplinkConfig};
use aplink_bus::session::{CallEvents, StartCall};
use aplink_bus::transport::{LoopbackHub, Room};
use aplink_core::error::Result;

const CONFIG_PATH: &str = "aplink.yaml";

fn load_config() -> Result<AplinkConfig> {
    if Path::new(CONFIG_PATH).exists() {
        config::load_from_file(CONFIG_PATH)
    } else {
        Ok(AplinkConfig::default())
    }
}

async fn run(cfg: AplinkConfig) -> Result<()> {
    let audio: Arc<dyn AudioBackend> = Arc::new(NullAudio);
    // Each participant runs its own app shell.
    let alice_app = AppState::new(cfg.clone(), Arc::clone(&audio))?;
    let bob_app = AppState::new(cfg, audio)?;

    let hub = LoopbackHub::new("RM_demo");
    let alice_room: Arc<dyn Room> = hub.join("alice", Some("Alice"));
    let bob_room: Arc<dyn Room> = hub.join("bob", Some("Bob"));

    alice_app.start_call(StartCall {
        room_name: "demo".into(),
        participant_identity: "alice".into(),
        participant_name: "Alice".into(),
        room: Arc::clone(&alice_room),
        events: CallEvents::default(),
    });

    // Log every envelope Alice receives.
    let _log = alice_app.dispatcher(&alice_room).subscribe(None::<&str>, |env, sender| {
        tracing::info!(
            kind = env.msg_type().unwrap_or("<none>"),
            from = sender.map(|p| p.identity.as_str()).unwrap_or("<unknown>"),
            "envelope"
        );
        Ok(())
    });

    let alice_hands = alice_app.raise_hand(&alice_room, "Alice");
    let bob_hands = bob_app.raise_hand(&bob_room, "Bob");

    bob_hands.raise_hand().await?;
    for hand in alice_hands.raised_hands() {
        tracing::info!(identity = %hand.participant_identity, name = %hand.participant_name, "hand up");
    }

    bob_hands.lower_hand().await?;
    tracing::info!(raised = alice_hands.raised_hands().len(), "after lower");

    alice_app.end_call();
    print!("{}", alice_app.metrics().render());
    Ok(())
}

#[tokio::main]
async fn main() {
    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config load failed: {e}");
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter));
    fmt().with_env_filter(filter).init();

    if let Err(e) = run(cfg).await {
        tracing::error!(code = e.code().as_str(), error = %e, "demo failed");
        std::process::exit(1);
    }
}
