//! Audio boundary used by feature adapters.
//!
//! Playback hardware and decoding live outside this crate. Adapters talk to an
//! `AudioBackend`: a mixer (the shared audio context translations are played
//! through), clip playback, and short notification tones.

pub mod playback;

use async_trait::async_trait;

use aplink_core::error::Result;

pub use playback::PlaybackQueue;

/// Handle to an opened mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MixerId(pub u64);

/// Short UI sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    HandRaised,
    ChatMessage,
}

#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Allocate the mixing context. May fail (no device, permission denied).
    fn open_mixer(&self) -> Result<MixerId>;

    fn close_mixer(&self, mixer: MixerId);

    /// Decode and play one clip to completion. With no mixer the backend
    /// falls back to plain element playback.
    async fn play_clip(&self, mixer: Option<MixerId>, url: &str) -> Result<()>;

    fn play_tone(&self, tone: Tone);
}

/// Backend that only logs. Used when no audio device is wired in.
#[derive(Debug, Default)]
pub struct NullAudio;

#[async_trait]
impl AudioBackend for NullAudio {
    fn open_mixer(&self) -> Result<MixerId> {
        Ok(MixerId(0))
    }

    fn close_mixer(&self, mixer: MixerId) {
        tracing::debug!(mixer = mixer.0, "null audio: mixer closed");
    }

    async fn play_clip(&self, mixer: Option<MixerId>, url: &str) -> Result<()> {
        tracing::debug!(mixer = ?mixer, url_len = url.len(), "null audio: clip");
        Ok(())
    }

    fn play_tone(&self, tone: Tone) {
        tracing::debug!(?tone, "null audio: tone");
    }
}
