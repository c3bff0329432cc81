use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine as _;

use aplink_core::error::{AplinkError, Result};
use aplink_core::protocol::{MessageKind, TranslationAudioMessage};

use crate::audio::playback::SharedMixer;
use crate::audio::PlaybackQueue;
use crate::config::TranslationSection;
use crate::dispatch::{Subscription, SubscriptionKey};
use crate::services::{now_millis, FeatureCtx};
use crate::transport::{Participant, PublishOptions};

/// Received translations kept for display.
const RECEIVED_LIMIT: usize = 50;

/// A translation another participant broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedTranslation {
    pub sender_identity: Option<String>,
    pub sender_name: String,
    pub text: String,
    pub original_text: String,
    pub source_lang: String,
    pub timestamp: u64,
}

/// Translation broadcast adapter.
///
/// Sends translated speech to the room while broadcasting is on, plays
/// translated clips one at a time, and optionally queues translations
/// received from others.
pub struct TranslationBroadcast {
    ctx: FeatureCtx,
    local_name: String,
    broadcasting: AtomicBool,
    mixer: SharedMixer,
    queue: Arc<PlaybackQueue>,
    received: Arc<Mutex<VecDeque<ReceivedTranslation>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl TranslationBroadcast {
    /// Must be called inside a tokio runtime (the playback worker is spawned here).
    pub fn attach(ctx: FeatureCtx, local_name: impl Into<String>, cfg: &TranslationSection) -> Result<Self> {
        let mixer: SharedMixer = Arc::new(Mutex::new(None));
        let queue = Arc::new(PlaybackQueue::spawn(Arc::clone(ctx.audio()), Arc::clone(&mixer))?);
        let received = Arc::new(Mutex::new(VecDeque::new()));

        let handler_queue = Arc::clone(&queue);
        let handler_received = Arc::clone(&received);
        let autoplay = cfg.autoplay_remote;
        let mime = cfg.audio_mime.clone();
        let subscription = ctx.dispatcher().subscribe(
            SubscriptionKey::exact(MessageKind::TRANSLATION_AUDIO),
            move |env, sender: Option<&Participant>| {
                let msg: TranslationAudioMessage = env.payload()?;
                tracing::debug!(
                    sender = msg.sender_name.as_str(),
                    lang = msg.source_lang.as_str(),
                    "translation received"
                );
                if autoplay && !msg.audio_base64.is_empty() {
                    handler_queue.enqueue(format!("data:{mime};base64,{}", msg.audio_base64));
                }
                let entry = ReceivedTranslation {
                    sender_identity: sender.map(|p| p.identity.clone()),
                    sender_name: msg.sender_name,
                    text: msg.text,
                    original_text: msg.original_text,
                    source_lang: msg.source_lang,
                    timestamp: msg.timestamp,
                };
                let mut list = handler_received
                    .lock()
                    .map_err(|_| AplinkError::Internal("received list poisoned".into()))?;
                if list.len() >= RECEIVED_LIMIT {
                    list.pop_front();
                }
                list.push_back(entry);
                Ok(())
            },
        );

        Ok(Self {
            ctx,
            local_name: local_name.into(),
            broadcasting: AtomicBool::new(false),
            mixer,
            queue,
            received,
            subscription: Mutex::new(Some(subscription)),
        })
    }

    /// Open the mixer on first use and start accepting sends. Idempotent.
    pub fn start_broadcast(&self) {
        if let Ok(mut mixer) = self.mixer.lock() {
            if mixer.is_none() {
                match self.ctx.audio().open_mixer() {
                    Ok(id) => *mixer = Some(id),
                    Err(e) => tracing::warn!(error = %e, "mixer unavailable, using plain playback"),
                }
            }
        }
        if !self.broadcasting.swap(true, Ordering::AcqRel) {
            tracing::info!(room = %self.ctx.dispatcher().room_id(), "translation broadcast started");
        }
    }

    /// Stop accepting sends. The mixer stays open.
    pub fn stop_broadcast(&self) {
        if self.broadcasting.swap(false, Ordering::AcqRel) {
            tracing::info!(room = %self.ctx.dispatcher().room_id(), "translation broadcast stopped");
        }
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcasting.load(Ordering::Acquire)
    }

    pub fn has_mixer(&self) -> bool {
        self.mixer.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Publish one translated clip to the room. A no-op (with a warning) when
    /// not broadcasting or when the room is gone.
    pub async fn send_to_participants(
        &self,
        audio: &[u8],
        text: &str,
        original_text: &str,
        source_lang: &str,
    ) -> Result<()> {
        if !self.is_broadcasting() {
            tracing::warn!("translation send ignored: not broadcasting");
            return Ok(());
        }
        if self.ctx.room().is_none() {
            tracing::warn!(room = %self.ctx.dispatcher().room_id(), "translation send ignored: no room");
            return Ok(());
        }

        let msg = TranslationAudioMessage {
            audio_base64: base64::engine::general_purpose::STANDARD.encode(audio),
            text: text.to_string(),
            original_text: original_text.to_string(),
            source_lang: source_lang.to_string(),
            sender_name: self.local_name.clone(),
            timestamp: now_millis(),
        };
        self.ctx.publish(&msg, PublishOptions::RELIABLE).await
    }

    /// Queue a clip; clips play strictly one after another.
    pub fn play_translated_audio(&self, url: impl Into<String>) -> bool {
        let queued = self.queue.enqueue(url);
        if !queued {
            tracing::warn!("translation playback queue is closed");
        }
        queued
    }

    /// Clips queued or playing.
    pub fn pending_playback(&self) -> usize {
        self.queue.pending()
    }

    /// Translations received from others, oldest first.
    pub fn received(&self) -> Vec<ReceivedTranslation> {
        self.received
            .lock()
            .map(|g| g.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Unsubscribe, stop playback, and release the mixer. Idempotent.
    pub fn close(&self) {
        self.broadcasting.store(false, Ordering::Release);
        if let Some(sub) = self.subscription.lock().ok().and_then(|mut g| g.take()) {
            sub.unsubscribe();
        }
        self.queue.close();
        if let Some(id) = self.mixer.lock().ok().and_then(|mut g| g.take()) {
            self.ctx.audio().close_mixer(id);
        }
    }
}

impl Drop for TranslationBroadcast {
    fn drop(&mut self) {
        self.close();
    }
}
