//! Room contract consumed by the bus.
//!
//! The real-time platform (WebRTC room, SFU client, ...) lives outside this
//! crate. The bus only needs raw data in, raw data out, and a notification
//! when a participant leaves.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use aplink_core::error::Result;

/// A participant as seen through the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Participant {
    pub identity: String,
    pub name: Option<String>,
}

impl Participant {
    pub fn new(identity: impl Into<String>, name: Option<String>) -> Self {
        Self {
            identity: identity.into(),
            name,
        }
    }

    /// Display name, falling back to the identity.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.identity)
    }
}

/// Handle returned by listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Delivery mode for an outbound data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    pub reliable: bool,
}

impl PublishOptions {
    pub const RELIABLE: PublishOptions = PublishOptions { reliable: true };
    pub const LOSSY: PublishOptions = PublishOptions { reliable: false };
}

/// Raw data callback: `(bytes, sender)`. Sender is absent for server-originated data.
pub type DataCallback = Arc<dyn Fn(&[u8], Option<&Participant>) + Send + Sync>;

/// Participant lifecycle callback.
pub type ParticipantCallback = Arc<dyn Fn(&Participant) + Send + Sync>;

/// The external room/transport.
#[async_trait]
pub trait Room: Send + Sync {
    /// Stable room identifier; dispatchers are keyed by it.
    fn sid(&self) -> &str;

    /// The participant this process joined as.
    fn local_participant(&self) -> Participant;

    fn on_raw_data_received(&self, cb: DataCallback) -> ListenerId;
    fn off_raw_data_received(&self, id: ListenerId);

    fn on_participant_disconnected(&self, cb: ParticipantCallback) -> ListenerId;
    fn off_participant_disconnected(&self, id: ListenerId);

    async fn publish_raw_data(&self, data: Bytes, opts: PublishOptions) -> Result<()>;
}
