//! In-memory room transport.
//!
//! A `LoopbackHub` plays the part of the media server for one room: every
//! participant joins through it and gets a `LoopbackRoom`. Publishing delivers
//! the bytes synchronously, in call order, to every other member's raw-data
//! listeners. Used by the integration tests and the demo binary.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use aplink_core::error::{AplinkError, Result};

use super::room::{
    DataCallback, ListenerId, Participant, ParticipantCallback, PublishOptions, Room,
};

struct HubInner {
    sid: String,
    members: DashMap<String, Weak<LoopbackRoom>>,
}

/// One room on the in-memory "server".
#[derive(Clone)]
pub struct LoopbackHub {
    inner: Arc<HubInner>,
}

impl LoopbackHub {
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                sid: sid.into(),
                members: DashMap::new(),
            }),
        }
    }

    pub fn sid(&self) -> &str {
        &self.inner.sid
    }

    /// Join as `identity`. Joining twice with one identity replaces the old member.
    pub fn join(&self, identity: &str, name: Option<&str>) -> Arc<LoopbackRoom> {
        let room = Arc::new(LoopbackRoom {
            hub: Arc::clone(&self.inner),
            local: Participant::new(identity, name.map(str::to_string)),
            data_listeners: Mutex::new(Vec::new()),
            disconnect_listeners: Mutex::new(Vec::new()),
            seq: AtomicU64::new(1),
            fail_publishes: AtomicBool::new(false),
            published: Mutex::new(Vec::new()),
        });
        self.inner
            .members
            .insert(identity.to_string(), Arc::downgrade(&room));
        tracing::debug!(room = %self.inner.sid, identity, "loopback member joined");
        room
    }

    /// Drop a member and tell everyone else it disconnected.
    pub fn disconnect(&self, identity: &str) {
        let Some((_, gone)) = self.inner.members.remove(identity) else {
            return;
        };
        let participant = match gone.upgrade() {
            Some(r) => r.local.clone(),
            None => Participant::new(identity, None),
        };
        tracing::debug!(room = %self.inner.sid, identity, "loopback member disconnected");
        for member in self.inner.live_members() {
            member.notify_disconnected(&participant);
        }
    }

    pub fn member_count(&self) -> usize {
        self.inner.live_members().len()
    }
}

impl HubInner {
    fn live_members(&self) -> Vec<Arc<LoopbackRoom>> {
        self.members.iter().filter_map(|e| e.value().upgrade()).collect()
    }
}

/// One participant's view of a loopback room.
pub struct LoopbackRoom {
    hub: Arc<HubInner>,
    local: Participant,
    data_listeners: Mutex<Vec<(ListenerId, DataCallback)>>,
    disconnect_listeners: Mutex<Vec<(ListenerId, ParticipantCallback)>>,
    seq: AtomicU64,
    fail_publishes: AtomicBool,
    published: Mutex<Vec<PublishOptions>>,
}

impl LoopbackRoom {
    /// Deliver a frame to this member's listeners as if it came off the wire.
    pub fn inject(&self, data: &[u8], sender: Option<&Participant>) {
        let listeners: Vec<DataCallback> = match self.data_listeners.lock() {
            Ok(g) => g.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            Err(_) => return,
        };
        for cb in listeners {
            cb(data, sender);
        }
    }

    /// Number of live raw-data subscriptions on this member.
    pub fn raw_listener_count(&self) -> usize {
        self.data_listeners.lock().map(|g| g.len()).unwrap_or(0)
    }

    /// Make every following publish fail (or succeed again).
    pub fn set_fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::Relaxed);
    }

    /// Options of every successful publish, in order.
    pub fn published(&self) -> Vec<PublishOptions> {
        self.published.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.seq.fetch_add(1, Ordering::Relaxed))
    }

    fn notify_disconnected(&self, participant: &Participant) {
        let listeners: Vec<ParticipantCallback> = match self.disconnect_listeners.lock() {
            Ok(g) => g.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            Err(_) => return,
        };
        for cb in listeners {
            cb(participant);
        }
    }
}

#[async_trait]
impl Room for LoopbackRoom {
    fn sid(&self) -> &str {
        &self.hub.sid
    }

    fn local_participant(&self) -> Participant {
        self.local.clone()
    }

    fn on_raw_data_received(&self, cb: DataCallback) -> ListenerId {
        let id = self.next_id();
        if let Ok(mut g) = self.data_listeners.lock() {
            g.push((id, cb));
        }
        id
    }

    fn off_raw_data_received(&self, id: ListenerId) {
        if let Ok(mut g) = self.data_listeners.lock() {
            g.retain(|(lid, _)| *lid != id);
        }
    }

    fn on_participant_disconnected(&self, cb: ParticipantCallback) -> ListenerId {
        let id = self.next_id();
        if let Ok(mut g) = self.disconnect_listeners.lock() {
            g.push((id, cb));
        }
        id
    }

    fn off_participant_disconnected(&self, id: ListenerId) {
        if let Ok(mut g) = self.disconnect_listeners.lock() {
            g.retain(|(lid, _)| *lid != id);
        }
    }

    async fn publish_raw_data(&self, data: Bytes, opts: PublishOptions) -> Result<()> {
        if self.fail_publishes.load(Ordering::Relaxed) {
            return Err(AplinkError::Publish("loopback publish disabled".into()));
        }
        if let Ok(mut g) = self.published.lock() {
            g.push(opts);
        }
        for member in self.hub.live_members() {
            if member.local.identity == self.local.identity {
                continue;
            }
            member.inject(&data, Some(&self.local));
        }
        Ok(())
    }
}
