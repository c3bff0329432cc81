#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aplink_bus::audio::{AudioBackend, NullAudio};
use aplink_bus::config::AplinkConfig;
use aplink_bus::dispatch::{Dispatcher, DispatcherRegistry, Subscription, SubscriptionKey, Topics};
use aplink_bus::obs::BusMetrics;
use aplink_bus::services::{ChatChannel, FeatureCtx, RaiseHand, TranslationBroadcast};
use aplink_bus::transport::{LoopbackHub, LoopbackRoom, Participant, Room};
use aplink_core::error::AplinkError;

struct Fixture {
    metrics: Arc<BusMetrics>,
    registry: DispatcherRegistry,
    hub: LoopbackHub,
    room: Arc<LoopbackRoom>,
    dyn_room: Arc<dyn Room>,
}

fn fixture() -> Fixture {
    let metrics = Arc::new(BusMetrics::default());
    let registry = DispatcherRegistry::new(Arc::clone(&metrics));
    let hub = LoopbackHub::new("RM_test");
    let room = hub.join("local", Some("Local"));
    let dyn_room: Arc<dyn Room> = room.clone();
    Fixture { metrics, registry, hub, room, dyn_room }
}

impl Fixture {
    fn dispatcher(&self) -> Arc<Dispatcher> {
        self.registry.get_or_create(&self.dyn_room)
    }

    fn feed(&self, json: &str) {
        let remote = Participant::new("remote", Some("Remote".into()));
        self.room.inject(json.as_bytes(), Some(&remote));
    }
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn counting(
    d: &Arc<Dispatcher>,
    topics: impl Into<Topics>,
    hits: &Arc<AtomicUsize>,
) -> Subscription {
    let hits = Arc::clone(hits);
    d.subscribe(topics, move |_env, _sender| {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[tokio::test]
async fn one_raw_listener_per_room() {
    let f = fixture();
    let audio: Arc<dyn AudioBackend> = Arc::new(NullAudio);
    let cfg = AplinkConfig::default();

    for _ in 0..5 {
        f.dispatcher();
    }
    let ctx = || FeatureCtx::new(f.dispatcher(), Arc::clone(&audio), Arc::clone(&f.metrics));
    let _hands = RaiseHand::attach(ctx(), "Local", &cfg.raise_hand);
    let _chat = ChatChannel::attach(ctx(), "Local", &cfg.chat);
    let _translation = TranslationBroadcast::attach(ctx(), "Local", &cfg.translation).unwrap();

    assert_eq!(f.room.raw_listener_count(), 1);
    assert_eq!(f.registry.len(), 1);
    assert_eq!(f.metrics.dispatchers_active.get(&[]), 1);
    assert!(Arc::ptr_eq(&f.dispatcher(), &f.dispatcher()));
}

#[test]
fn frame_is_decoded_once_for_many_handlers() {
    let f = fixture();
    let d = f.dispatcher();
    let hits = counter();
    let _a = counting(&d, "TIMER_START", &hits);
    let _b = counting(&d, "TIMER_START", &hits);
    let _c = counting(&d, "TIMER_*", &hits);
    let _d = counting(&d, None::<&str>, &hits);

    f.feed(r#"{"type":"TIMER_START","durationSec":60}"#);

    assert_eq!(hits.load(Ordering::SeqCst), 4);
    assert_eq!(f.metrics.frames_received.total(), 1);
    assert_eq!(f.metrics.dispatch_duration.count(&[]), 1);
}

#[test]
fn failing_handler_does_not_stop_others() {
    let f = fixture();
    let d = f.dispatcher();

    let _err = d.subscribe("RAISE_HAND", |_env, _sender| Err(AplinkError::Internal("boom".into())));
    let _panic = d.subscribe("RAISE_HAND", |_env, _sender| panic!("handler bug"));
    let _prefix_panic = d.subscribe("RAISE_*", |_env, _sender| panic!("prefix bug"));

    let exact = counter();
    let prefix = counter();
    let wildcard = counter();
    let _e = counting(&d, "RAISE_HAND", &exact);
    let _p = counting(&d, "RAISE_*", &prefix);
    let _w = counting(&d, None::<&str>, &wildcard);

    f.feed(r#"{"type":"RAISE_HAND","participantIdentity":"bob","raised":true}"#);

    assert_eq!(exact.load(Ordering::SeqCst), 1);
    assert_eq!(prefix.load(Ordering::SeqCst), 1);
    assert_eq!(wildcard.load(Ordering::SeqCst), 1);
    assert_eq!(f.metrics.handler_failures.get(&[("route", "RAISE_HAND")]), 2);
    assert_eq!(f.metrics.handler_failures.get(&[("route", "RAISE_*")]), 1);
}

#[test]
fn prefix_key_matches_leading_substring_only() {
    let f = fixture();
    let d = f.dispatcher();
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _s = d.subscribe("TIMER_*", move |env, _sender| {
        sink.lock().unwrap().push(env.msg_type().unwrap().to_string());
        Ok(())
    });

    for t in ["TIMER_START", "TIMER_STOP", "TIMER_ANYTHING", "TIMERX", "TIMER", "XTIMER_START"] {
        f.feed(&format!(r#"{{"type":"{t}"}}"#));
    }

    assert_eq!(*seen.lock().unwrap(), vec!["TIMER_START", "TIMER_STOP", "TIMER_ANYTHING"]);
}

#[test]
fn explicit_exact_key_keeps_literal_star() {
    let f = fixture();
    let d = f.dispatcher();
    let hits = counter();
    let _s = counting(&d, SubscriptionKey::exact("STAR*"), &hits);

    f.feed(r#"{"type":"STAR_FALL"}"#);
    f.feed(r#"{"type":"STAR*"}"#);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn wildcard_sees_every_decoded_envelope() {
    let f = fixture();
    let d = f.dispatcher();
    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _w = d.subscribe(None::<&str>, move |env, _sender| {
        sink.lock().unwrap().push(env.msg_type().map(str::to_string));
        Ok(())
    });

    f.feed(r#"{"type":"RAISE_HAND","participantIdentity":"a","raised":true}"#);
    f.feed(r#"{"type":"NEVER_REGISTERED"}"#);
    f.feed(r#"{"note":"no type at all"}"#);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some("RAISE_HAND".to_string()), Some("NEVER_REGISTERED".to_string()), None]
    );
}

#[test]
fn multi_key_subscription_runs_once_per_matching_route() {
    let f = fixture();
    let d = f.dispatcher();
    let hits = counter();
    let _s = counting(&d, ["A", "B", "A"], &hits);
    assert_eq!(d.route_count(), 2);
    assert_eq!(d.handler_count(), 1);

    f.feed(r#"{"type":"A"}"#);
    f.feed(r#"{"type":"B"}"#);
    f.feed(r#"{"type":"C"}"#);

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn unsubscribe_stops_delivery() {
    let f = fixture();
    let d = f.dispatcher();
    let explicit = counter();
    let dropped = counter();
    let detached = counter();

    let s1 = counting(&d, "PING", &explicit);
    let s2 = counting(&d, "PING", &dropped);
    counting(&d, "PING", &detached).detach();

    f.feed(r#"{"type":"PING"}"#);
    s1.unsubscribe();
    drop(s2);
    f.feed(r#"{"type":"PING"}"#);

    assert_eq!(explicit.load(Ordering::SeqCst), 1);
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
    assert_eq!(detached.load(Ordering::SeqCst), 2);
    assert_eq!(d.handler_count(), 1);
}

#[test]
fn handler_may_unsubscribe_itself_mid_dispatch() {
    let f = fixture();
    let d = f.dispatcher();
    let hits = counter();
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let handler_slot = Arc::clone(&slot);
    let handler_hits = Arc::clone(&hits);
    let sub = d.subscribe("ONCE", move |_env, _sender| {
        handler_hits.fetch_add(1, Ordering::SeqCst);
        handler_slot.lock().unwrap().take();
        Ok(())
    });
    *slot.lock().unwrap() = Some(sub);

    f.feed(r#"{"type":"ONCE"}"#);
    f.feed(r#"{"type":"ONCE"}"#);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(d.route_count(), 0);
}

#[test]
fn malformed_frames_reach_no_handler() {
    let f = fixture();
    let d = f.dispatcher();
    let hits = counter();
    let _w = counting(&d, None::<&str>, &hits);
    let _e = counting(&d, "RAISE_HAND", &hits);

    let remote = Participant::new("remote", None);
    f.room.inject(&[0xff, 0xfe, 0x00, 0x81], Some(&remote));
    f.room.inject(b"{\"type\":\"RAISE_HAND\"", None);
    f.room.inject(b"[1,2,3]", None);
    f.room.inject(b"42", None);
    f.room.inject(b"", None);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(f.metrics.frames_received.total(), 5);
    assert_eq!(f.metrics.frames_dropped.get(&[("reason", "not_utf8")]), 1);
    assert_eq!(f.metrics.frames_dropped.get(&[("reason", "not_json")]), 2);
    assert_eq!(f.metrics.frames_dropped.get(&[("reason", "not_object")]), 2);
}

#[test]
fn release_detaches_and_clears_handlers() {
    let f = fixture();
    let d = f.dispatcher();
    let hits = counter();
    let _s = counting(&d, "PING", &hits);

    assert!(f.registry.release(f.hub.sid()));
    assert!(!f.registry.release(f.hub.sid()));
    assert!(d.is_released());
    assert_eq!(f.room.raw_listener_count(), 0);
    assert_eq!(f.metrics.dispatchers_active.get(&[]), 0);

    d.on_frame(br#"{"type":"PING"}"#, None);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let late = d.subscribe("PING", |_env, _sender| Ok(()));
    assert!(!late.is_active());

    let fresh = f.dispatcher();
    assert!(!Arc::ptr_eq(&fresh, &d));
    assert_eq!(f.room.raw_listener_count(), 1);
}

#[test]
fn replaced_room_gets_a_fresh_dispatcher() {
    let f = fixture();
    let first = f.dispatcher();

    let rejoined: Arc<dyn Room> = f.hub.join("local", Some("Local"));
    let second = f.registry.get_or_create(&rejoined);

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(first.is_released());
    assert!(second.is_bound_to(&rejoined));
    assert_eq!(f.registry.len(), 1);
    assert_eq!(f.room.raw_listener_count(), 0);
}

#[test]
fn bare_star_key_subscribes_as_wildcard() {
    let f = fixture();
    let d = f.dispatcher();
    let hits = counter();
    let _s = counting(&d, "*", &hits);

    f.feed(r#"{"type":"RAISE_HAND","participantIdentity":"a","raised":true}"#);
    f.feed(r#"{"note":"untyped"}"#);

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(d.route_count(), 1);
}
