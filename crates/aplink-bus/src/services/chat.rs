use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aplink_core::error::{AplinkError, Result};
use aplink_core::protocol::{ChatMessage, MessageKind};

use crate::audio::Tone;
use crate::config::ChatSection;
use crate::dispatch::{Subscription, SubscriptionKey};
use crate::policy::throttle::MinIntervalThrottle;
use crate::services::{now_millis, FeatureCtx};
use crate::transport::PublishOptions;

type History = Arc<Mutex<VecDeque<ChatMessage>>>;

fn push_bounded(history: &History, limit: usize, msg: ChatMessage) -> Result<()> {
    let mut h = history
        .lock()
        .map_err(|_| AplinkError::Internal("chat history poisoned".into()))?;
    while h.len() >= limit {
        h.pop_front();
    }
    h.push_back(msg);
    Ok(())
}

/// In-call text chat with a bounded local history.
pub struct ChatChannel {
    ctx: FeatureCtx,
    local_identity: String,
    local_name: String,
    limit: usize,
    history: History,
    _subscription: Subscription,
}

impl ChatChannel {
    pub fn attach(ctx: FeatureCtx, participant_name: impl Into<String>, cfg: &ChatSection) -> Self {
        let local_identity = ctx
            .room()
            .map(|r| r.local_participant().identity)
            .unwrap_or_default();
        let limit = cfg.history_limit.max(1);
        let history: History = Arc::new(Mutex::new(VecDeque::new()));

        let handler_history = Arc::clone(&history);
        let audio = Arc::clone(ctx.audio());
        let tone = MinIntervalThrottle::from_millis(cfg.tone_min_interval_ms);
        let subscription = ctx.dispatcher().subscribe(
            SubscriptionKey::exact(MessageKind::CHAT_MESSAGE),
            move |env, _sender| {
                let msg: ChatMessage = env.payload()?;
                push_bounded(&handler_history, limit, msg)?;
                if tone.try_acquire() {
                    audio.play_tone(Tone::ChatMessage);
                }
                Ok(())
            },
        );

        Self {
            ctx,
            local_identity,
            local_name: participant_name.into(),
            limit,
            history,
            _subscription: subscription,
        }
    }

    /// Publish a message and append it to the local history.
    pub async fn send(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AplinkError::BadRequest("chat message is empty".into()));
        }
        let msg = ChatMessage {
            participant_identity: self.local_identity.clone(),
            participant_name: self.local_name.clone(),
            text: text.to_string(),
            timestamp: now_millis(),
        };
        self.ctx.publish(&msg, PublishOptions::RELIABLE).await?;
        push_bounded(&self.history, self.limit, msg)
    }

    /// Messages, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history
            .lock()
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }
}
