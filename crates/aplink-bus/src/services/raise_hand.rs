use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use aplink_core::error::Result;
use aplink_core::protocol::{MessageKind, RaiseHandMessage};

use crate::audio::{AudioBackend, Tone};
use crate::config::RaiseHandSection;
use crate::dispatch::{SubscriptionKey, Subscription};
use crate::policy::throttle::MinIntervalThrottle;
use crate::services::{now_millis, FeatureCtx};
use crate::transport::{ListenerId, Participant, PublishOptions};

/// One raised hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaisedHand {
    pub participant_identity: String,
    pub participant_name: String,
    /// Local receive time, milliseconds since the Unix epoch.
    pub raised_at: u64,
}

struct HandState {
    local_identity: String,
    local_name: String,
    local_raised: AtomicBool,
    hands: DashMap<String, RaisedHand>,
    tone: MinIntervalThrottle,
    audio: Arc<dyn AudioBackend>,
}

impl HandState {
    fn play_tone(&self) {
        if self.tone.try_acquire() {
            self.audio.play_tone(Tone::HandRaised);
        }
    }

    fn apply_remote(&self, msg: RaiseHandMessage) {
        let is_local = msg.participant_identity == self.local_identity;
        if is_local {
            // Someone else (a host, another device) changed our hand.
            self.local_raised.store(msg.raised, Ordering::Release);
        }
        if msg.raised {
            self.hands.insert(
                msg.participant_identity.clone(),
                RaisedHand {
                    participant_identity: msg.participant_identity.clone(),
                    participant_name: msg.participant_name,
                    raised_at: now_millis(),
                },
            );
            tracing::debug!(identity = %msg.participant_identity, "hand raised");
            if !is_local {
                self.play_tone();
            }
        } else {
            self.hands.remove(&msg.participant_identity);
            tracing::debug!(identity = %msg.participant_identity, "hand lowered");
        }
    }
}

/// Raise-hand adapter: who has a hand up, and the local participant's hand.
///
/// A participant is either absent from `raised_hands` (lowered) or present
/// (raised). Remote `RAISE_HAND` envelopes and participant disconnects drive
/// the map; `raise_hand` / `lower_hand` drive the local entry and broadcast it.
pub struct RaiseHand {
    ctx: FeatureCtx,
    state: Arc<HandState>,
    _subscription: Subscription,
    disconnect_listener: Option<ListenerId>,
}

impl RaiseHand {
    pub fn attach(ctx: FeatureCtx, participant_name: impl Into<String>, cfg: &RaiseHandSection) -> Self {
        let local_identity = ctx
            .room()
            .map(|r| r.local_participant().identity)
            .unwrap_or_default();

        let state = Arc::new(HandState {
            local_identity,
            local_name: participant_name.into(),
            local_raised: AtomicBool::new(false),
            hands: DashMap::new(),
            tone: MinIntervalThrottle::from_millis(cfg.tone_min_interval_ms),
            audio: Arc::clone(ctx.audio()),
        });

        let handler_state = Arc::clone(&state);
        let subscription = ctx.dispatcher().subscribe(
            SubscriptionKey::exact(MessageKind::RAISE_HAND),
            move |env, _sender| {
                let msg: RaiseHandMessage = env.payload()?;
                handler_state.apply_remote(msg);
                Ok(())
            },
        );

        let disconnect_listener = match ctx.room() {
            Some(room) => {
                let gone_state = Arc::clone(&state);
                Some(room.on_participant_disconnected(Arc::new(move |p: &Participant| {
                    if gone_state.hands.remove(&p.identity).is_some() {
                        tracing::debug!(identity = %p.identity, "raised hand cleared on disconnect");
                    }
                })))
            }
            None => {
                tracing::warn!(room = %ctx.dispatcher().room_id(), "raise hand attached without a room");
                None
            }
        };

        Self {
            ctx,
            state,
            _subscription: subscription,
            disconnect_listener,
        }
    }

    pub async fn raise_hand(&self) -> Result<()> {
        self.state.local_raised.store(true, Ordering::Release);
        self.state.hands.insert(
            self.state.local_identity.clone(),
            RaisedHand {
                participant_identity: self.state.local_identity.clone(),
                participant_name: self.state.local_name.clone(),
                raised_at: now_millis(),
            },
        );
        self.state.play_tone();
        self.broadcast(true).await
    }

    pub async fn lower_hand(&self) -> Result<()> {
        self.state.local_raised.store(false, Ordering::Release);
        self.state.hands.remove(&self.state.local_identity);
        self.broadcast(false).await
    }

    pub async fn toggle_hand(&self) -> Result<()> {
        if self.is_hand_raised() {
            self.lower_hand().await
        } else {
            self.raise_hand().await
        }
    }

    /// Local participant's hand.
    pub fn is_hand_raised(&self) -> bool {
        self.state.local_raised.load(Ordering::Acquire)
    }

    pub fn is_raised(&self, identity: &str) -> bool {
        self.state.hands.contains_key(identity)
    }

    pub fn get(&self, identity: &str) -> Option<RaisedHand> {
        self.state.hands.get(identity).map(|h| h.value().clone())
    }

    /// Raised hands, earliest first.
    pub fn raised_hands(&self) -> Vec<RaisedHand> {
        let mut hands: Vec<RaisedHand> = self.state.hands.iter().map(|h| h.value().clone()).collect();
        hands.sort_by(|a, b| {
            a.raised_at
                .cmp(&b.raised_at)
                .then_with(|| a.participant_identity.cmp(&b.participant_identity))
        });
        hands
    }

    async fn broadcast(&self, raised: bool) -> Result<()> {
        let msg = RaiseHandMessage {
            participant_identity: self.state.local_identity.clone(),
            participant_name: self.state.local_name.clone(),
            raised,
            timestamp: now_millis(),
        };
        self.ctx.publish(&msg, PublishOptions::RELIABLE).await
    }
}

impl Drop for RaiseHand {
    fn drop(&mut self) {
        if let (Some(id), Some(room)) = (self.disconnect_listener.take(), self.ctx.dispatcher().room()) {
            room.off_participant_disconnected(id);
        }
    }
}
