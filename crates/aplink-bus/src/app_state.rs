//! Shared application state for the APLink call shell.
//!
//! Owns the dispatcher registry and the single call session, and hands out
//! feature adapters bound to a room. Ending a call releases that room's
//! dispatcher so no handler outlives the call.

use std::sync::Arc;

use aplink_core::error::Result;

use crate::audio::AudioBackend;
use crate::config::AplinkConfig;
use crate::dispatch::{Dispatcher, DispatcherRegistry};
use crate::obs::BusMetrics;
use crate::services::{ChatChannel, FeatureCtx, RaiseHand, TranslationBroadcast};
use crate::session::{CallSessionStore, StartCall};
use crate::transport::Room;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AplinkConfig,
    metrics: Arc<BusMetrics>,
    registry: DispatcherRegistry,
    calls: CallSessionStore,
    audio: Arc<dyn AudioBackend>,
}

impl AppState {
    /// Build application state. The config is validated again here so a
    /// hand-built config cannot skip the checks `load_from_str` runs.
    pub fn new(cfg: AplinkConfig, audio: Arc<dyn AudioBackend>) -> Result<Self> {
        cfg.validate()?;
        let metrics = Arc::new(BusMetrics::default());
        let registry = DispatcherRegistry::new(Arc::clone(&metrics));
        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics,
                registry,
                calls: CallSessionStore::new(),
                audio,
            }),
        })
    }

    pub fn cfg(&self) -> &AplinkConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<BusMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn registry(&self) -> &DispatcherRegistry {
        &self.inner.registry
    }

    pub fn calls(&self) -> &CallSessionStore {
        &self.inner.calls
    }

    pub fn audio(&self) -> Arc<dyn AudioBackend> {
        Arc::clone(&self.inner.audio)
    }

    pub fn dispatcher(&self, room: &Arc<dyn Room>) -> Arc<Dispatcher> {
        self.inner.registry.get_or_create(room)
    }

    pub fn feature_ctx(&self, room: &Arc<dyn Room>) -> FeatureCtx {
        FeatureCtx::new(self.dispatcher(room), self.audio(), self.metrics())
    }

    pub fn raise_hand(&self, room: &Arc<dyn Room>, participant_name: &str) -> RaiseHand {
        RaiseHand::attach(self.feature_ctx(room), participant_name, &self.inner.cfg.raise_hand)
    }

    /// Must be called inside a tokio runtime.
    pub fn translation(&self, room: &Arc<dyn Room>, participant_name: &str) -> Result<TranslationBroadcast> {
        TranslationBroadcast::attach(self.feature_ctx(room), participant_name, &self.inner.cfg.translation)
    }

    pub fn chat(&self, room: &Arc<dyn Room>, participant_name: &str) -> ChatChannel {
        ChatChannel::attach(self.feature_ctx(room), participant_name, &self.inner.cfg.chat)
    }

    /// Replace the current call. The dispatcher bound to the replaced call's
    /// room instance is released; one already rebuilt for a new instance
    /// under the same sid is left alone.
    pub fn start_call(&self, start: StartCall) {
        let next = Arc::clone(&start.room);
        if let Some(prev) = self.inner.calls.start_call(start) {
            if Arc::as_ptr(&prev) as *const () != Arc::as_ptr(&next) as *const () {
                self.inner.registry.release_room(&prev);
            }
        }
    }

    /// End the call and tear down its dispatcher. Returns false if no call
    /// was active.
    pub fn end_call(&self) -> bool {
        let active = self.inner.calls.is_active();
        if let Some(room) = self.inner.calls.end_call() {
            self.inner.registry.release_room(&room);
        }
        active
    }
}
