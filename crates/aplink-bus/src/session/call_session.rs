use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use aplink_core::error::AplinkError;

use crate::services::now_millis;
use crate::transport::{Participant, Room};

/// Opaque UI value parked in the session (header buttons, connection badge).
pub type UiNode = Arc<dyn Any + Send + Sync>;

/// Call lifecycle callbacks. Replaced wholesale by `start_call`/`set_events`.
#[derive(Clone, Default)]
pub struct CallEvents {
    pub on_connected: Option<Arc<dyn Fn() + Send + Sync>>,
    pub on_disconnected: Option<Arc<dyn Fn(Option<&str>) + Send + Sync>>,
    pub on_participant_joined: Option<Arc<dyn Fn(&Participant) + Send + Sync>>,
    pub on_participant_left: Option<Arc<dyn Fn(&Participant) + Send + Sync>>,
    pub on_error: Option<Arc<dyn Fn(&AplinkError) + Send + Sync>>,
}

impl fmt::Debug for CallEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallEvents")
            .field("on_connected", &self.on_connected.is_some())
            .field("on_disconnected", &self.on_disconnected.is_some())
            .field("on_participant_joined", &self.on_participant_joined.is_some())
            .field("on_participant_left", &self.on_participant_left.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Input to `start_call`.
pub struct StartCall {
    pub room_name: String,
    pub participant_identity: String,
    pub participant_name: String,
    pub room: Arc<dyn Room>,
    pub events: CallEvents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Idle,
    Active,
    Minimized,
}

/// Read-only view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSnapshot {
    pub phase: CallPhase,
    pub room_name: Option<String>,
    pub participant_identity: Option<String>,
    pub participant_name: Option<String>,
    pub has_room: bool,
    pub has_header_buttons: bool,
    pub has_connection_indicator: bool,
    pub started_at: Option<u64>,
}

#[derive(Default)]
struct CallSession {
    active: bool,
    minimized: bool,
    room_name: Option<String>,
    participant_identity: Option<String>,
    participant_name: Option<String>,
    room: Option<Arc<dyn Room>>,
    header_buttons: Option<UiNode>,
    connection_indicator: Option<UiNode>,
    events: CallEvents,
    started_at: Option<u64>,
}

impl CallSession {
    fn phase(&self) -> CallPhase {
        match (self.active, self.minimized) {
            (false, _) => CallPhase::Idle,
            (true, false) => CallPhase::Active,
            (true, true) => CallPhase::Minimized,
        }
    }
}

/// The app shell's single call slot.
///
/// Exactly one session is live. `start_call` replaces everything, `end_call`
/// resets everything, `minimize`/`maximize` only flip the minimized flag.
#[derive(Default)]
pub struct CallSessionStore {
    inner: RwLock<CallSession>,
}

impl CallSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves plain data behind; keep using it.
    fn read(&self) -> RwLockReadGuard<'_, CallSession> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CallSession> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the session. Returns the room of the session it replaced.
    pub fn start_call(&self, start: StartCall) -> Option<Arc<dyn Room>> {
        let mut s = self.write();
        let previous = s.room.take();
        tracing::info!(
            room = %start.room_name,
            identity = %start.participant_identity,
            replaced = previous.is_some(),
            "call started"
        );
        *s = CallSession {
            active: true,
            minimized: false,
            room_name: Some(start.room_name),
            participant_identity: Some(start.participant_identity),
            participant_name: Some(start.participant_name),
            room: Some(start.room),
            header_buttons: None,
            connection_indicator: None,
            events: start.events,
            started_at: Some(now_millis()),
        };
        previous
    }

    /// Returns false when there is no active call or it is already minimized.
    pub fn minimize(&self) -> bool {
        let mut s = self.write();
        if !s.active || s.minimized {
            tracing::debug!(phase = ?s.phase(), "minimize ignored");
            return false;
        }
        s.minimized = true;
        true
    }

    pub fn maximize(&self) -> bool {
        let mut s = self.write();
        if !s.active || !s.minimized {
            tracing::debug!(phase = ?s.phase(), "maximize ignored");
            return false;
        }
        s.minimized = false;
        true
    }

    /// Reset to defaults. Returns the room the session held, if any.
    pub fn end_call(&self) -> Option<Arc<dyn Room>> {
        let mut s = self.write();
        let room = s.room.take();
        if s.active {
            tracing::info!(room = s.room_name.as_deref().unwrap_or(""), "call ended");
        }
        *s = CallSession::default();
        room
    }

    pub fn phase(&self) -> CallPhase {
        self.read().phase()
    }

    pub fn is_active(&self) -> bool {
        self.read().active
    }

    pub fn is_minimized(&self) -> bool {
        self.read().minimized
    }

    pub fn room(&self) -> Option<Arc<dyn Room>> {
        self.read().room.clone()
    }

    pub fn snapshot(&self) -> CallSnapshot {
        let s = self.read();
        CallSnapshot {
            phase: s.phase(),
            room_name: s.room_name.clone(),
            participant_identity: s.participant_identity.clone(),
            participant_name: s.participant_name.clone(),
            has_room: s.room.is_some(),
            has_header_buttons: s.header_buttons.is_some(),
            has_connection_indicator: s.connection_indicator.is_some(),
            started_at: s.started_at,
        }
    }

    pub fn set_header_buttons(&self, node: Option<UiNode>) {
        self.write().header_buttons = node;
    }

    pub fn header_buttons(&self) -> Option<UiNode> {
        self.read().header_buttons.clone()
    }

    pub fn set_connection_indicator(&self, node: Option<UiNode>) {
        self.write().connection_indicator = node;
    }

    pub fn connection_indicator(&self) -> Option<UiNode> {
        self.read().connection_indicator.clone()
    }

    pub fn set_events(&self, events: CallEvents) {
        self.write().events = events;
    }

    // Callbacks are cloned out first so they run without the lock held.

    pub fn emit_connected(&self) {
        let cb = self.read().events.on_connected.clone();
        if let Some(cb) = cb {
            cb();
        }
    }

    pub fn emit_disconnected(&self, reason: Option<&str>) {
        let cb = self.read().events.on_disconnected.clone();
        if let Some(cb) = cb {
            cb(reason);
        }
    }

    pub fn emit_participant_joined(&self, participant: &Participant) {
        let cb = self.read().events.on_participant_joined.clone();
        if let Some(cb) = cb {
            cb(participant);
        }
    }

    pub fn emit_participant_left(&self, participant: &Participant) {
        let cb = self.read().events.on_participant_left.clone();
        if let Some(cb) = cb {
            cb(participant);
        }
    }

    pub fn emit_error(&self, error: &AplinkError) {
        tracing::warn!(code = error.code().as_str(), error = %error, "call error");
        let cb = self.read().events.on_error.clone();
        if let Some(cb) = cb {
            cb(error);
        }
    }
}
