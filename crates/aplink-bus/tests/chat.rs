#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use aplink_bus::app_state::AppState;
use aplink_bus::audio::{AudioBackend, MixerId, Tone};
use aplink_bus::config::AplinkConfig;
use aplink_bus::transport::{LoopbackHub, Room};
use aplink_core::error::Result;

#[derive(Default)]
struct ToneCounter {
    tones: Mutex<Vec<Tone>>,
}

#[async_trait]
impl AudioBackend for ToneCounter {
    fn open_mixer(&self) -> Result<MixerId> {
        Ok(MixerId(1))
    }

    fn close_mixer(&self, _mixer: MixerId) {}

    async fn play_clip(&self, _mixer: Option<MixerId>, _url: &str) -> Result<()> {
        Ok(())
    }

    fn play_tone(&self, tone: Tone) {
        self.tones.lock().unwrap().push(tone);
    }
}

fn app(cfg: &AplinkConfig) -> (AppState, Arc<ToneCounter>) {
    let tones = Arc::new(ToneCounter::default());
    let backend: Arc<dyn AudioBackend> = tones.clone();
    (AppState::new(cfg.clone(), backend).unwrap(), tones)
}

#[tokio::test]
async fn messages_reach_both_histories() {
    let cfg = AplinkConfig::default();
    let hub = LoopbackHub::new("RM_C");
    let (alice_app, _) = app(&cfg);
    let (bob_app, bob_tones) = app(&cfg);
    let alice_room: Arc<dyn Room> = hub.join("alice", Some("Alice"));
    let bob_room: Arc<dyn Room> = hub.join("bob", Some("Bob"));
    let alice = alice_app.chat(&alice_room, "Alice");
    let bob = bob_app.chat(&bob_room, "Bob");

    alice.send("  hello there  ").await.unwrap();

    let sent = alice.history();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "hello there");
    assert_eq!(sent[0].participant_identity, "alice");

    let got = bob.history();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].participant_name, "Alice");
    assert_eq!(*bob_tones.tones.lock().unwrap(), vec![Tone::ChatMessage]);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let cfg = AplinkConfig::default();
    let hub = LoopbackHub::new("RM_C");
    let (alice_app, _) = app(&cfg);
    let room: Arc<dyn Room> = hub.join("alice", None);
    let chat = alice_app.chat(&room, "Alice");

    let err = chat.send("   ").await.expect_err("empty");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
    assert!(chat.history().is_empty());
}

#[tokio::test]
async fn history_is_bounded_and_tones_throttled() {
    let mut cfg = AplinkConfig::default();
    cfg.chat.history_limit = 3;
    cfg.chat.tone_min_interval_ms = 60_000;
    let hub = LoopbackHub::new("RM_C");
    let (alice_app, _) = app(&cfg);
    let (bob_app, bob_tones) = app(&cfg);
    let alice_room: Arc<dyn Room> = hub.join("alice", Some("Alice"));
    let bob_room: Arc<dyn Room> = hub.join("bob", Some("Bob"));
    let alice = alice_app.chat(&alice_room, "Alice");
    let bob = bob_app.chat(&bob_room, "Bob");

    for i in 0..5 {
        alice.send(&format!("m{i}")).await.unwrap();
    }

    let texts: Vec<String> = bob.history().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, vec!["m2", "m3", "m4"]);
    assert_eq!(alice.history().len(), 3);
    assert_eq!(bob_tones.tones.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_send_is_not_recorded() {
    let cfg = AplinkConfig::default();
    let hub = LoopbackHub::new("RM_C");
    let (alice_app, _) = app(&cfg);
    let loopback = hub.join("alice", Some("Alice"));
    let room: Arc<dyn Room> = loopback.clone();
    let chat = alice_app.chat(&room, "Alice");

    loopback.set_fail_publishes(true);
    assert!(chat.send("hi").await.is_err());
    assert!(chat.history().is_empty());
}
