//! In-call feature adapters built on the dispatcher.
//!
//! Each adapter subscribes to its own message kinds, keeps its own local
//! state, and publishes through the room it was attached to.

pub mod chat;
pub mod raise_hand;
pub mod translation;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use aplink_core::error::{AplinkError, Result};
use aplink_core::protocol::{codec, TypedMessage};

use crate::audio::AudioBackend;
use crate::dispatch::Dispatcher;
use crate::obs::BusMetrics;
use crate::transport::{PublishOptions, Room};

pub use chat::ChatChannel;
pub use raise_hand::{RaiseHand, RaisedHand};
pub use translation::{ReceivedTranslation, TranslationBroadcast};

/// Tools handed to every adapter (borrowed from the app shell, not owned).
#[derive(Clone)]
pub struct FeatureCtx {
    dispatcher: Arc<Dispatcher>,
    audio: Arc<dyn AudioBackend>,
    metrics: Arc<BusMetrics>,
}

impl FeatureCtx {
    pub fn new(dispatcher: Arc<Dispatcher>, audio: Arc<dyn AudioBackend>, metrics: Arc<BusMetrics>) -> Self {
        Self { dispatcher, audio, metrics }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> { &self.dispatcher }
    pub fn audio(&self) -> &Arc<dyn AudioBackend> { &self.audio }
    pub fn metrics(&self) -> &BusMetrics { &self.metrics }

    /// The room, unless it was dropped or its dispatcher released.
    pub fn room(&self) -> Option<Arc<dyn Room>> {
        if self.dispatcher.is_released() {
            return None;
        }
        self.dispatcher.room()
    }

    /// Encode and publish a typed message, recording the outcome.
    pub async fn publish<M: TypedMessage>(&self, msg: &M, opts: PublishOptions) -> Result<()> {
        let Some(room) = self.room() else {
            tracing::warn!(room = %self.dispatcher.room_id(), kind = M::KIND, "no room, publish skipped");
            self.metrics.record_publish(M::KIND, false);
            return Err(AplinkError::NoTransport);
        };
        let bytes = codec::encode_message(msg)?;
        let res = room.publish_raw_data(bytes, opts).await;
        self.metrics.record_publish(M::KIND, res.is_ok());
        if let Err(e) = &res {
            tracing::warn!(room = %room.sid(), kind = M::KIND, error = %e, "publish failed");
        }
        res
    }
}

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
