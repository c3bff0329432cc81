//! Sequential clip playback.
//!
//! One worker task drains a FIFO channel and plays each clip to completion
//! before taking the next, so clips never overlap. Whatever happens to a clip
//! (played, failed to decode, failed to play, panicked) the worker moves on.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use aplink_core::error::{AplinkError, Result};

use super::{AudioBackend, MixerId};

/// Mixer shared between an adapter (which opens/closes it) and its queue.
pub type SharedMixer = Arc<Mutex<Option<MixerId>>>;

pub struct PlaybackQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    pending: Arc<AtomicUsize>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackQueue {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(backend: Arc<dyn AudioBackend>, mixer: SharedMixer) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| AplinkError::Internal(format!("playback queue needs a tokio runtime: {e}")))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        let worker = handle.spawn(async move {
            while let Some(url) = rx.recv().await {
                let current = mixer.lock().ok().and_then(|g| *g);
                let outcome = AssertUnwindSafe(backend.play_clip(current, &url))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(())) => tracing::debug!(url_len = url.len(), "clip finished"),
                    Ok(Err(e)) => tracing::warn!(error = %e, "clip playback failed, skipping"),
                    Err(_) => tracing::error!("clip playback panicked, skipping"),
                }
                // `close` may already have zeroed the counter.
                let _ = worker_pending.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
            }
            tracing::debug!("playback worker stopped");
        });

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            pending,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queue a clip. Returns false once the queue is closed.
    pub fn enqueue(&self, url: impl Into<String>) -> bool {
        let Ok(guard) = self.tx.lock() else {
            return false;
        };
        let Some(tx) = guard.as_ref() else {
            return false;
        };
        self.pending.fetch_add(1, Ordering::AcqRel);
        if tx.send(url.into()).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }

    /// Clips queued or playing.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().map(|g| g.is_none()).unwrap_or(true)
    }

    /// Stop accepting clips and stop the worker (a clip mid-play is cut off).
    /// Queued clips are discarded, so `pending` drops to zero.
    pub fn close(&self) {
        if let Ok(mut g) = self.tx.lock() {
            g.take();
        }
        if let Some(worker) = self.worker.lock().ok().and_then(|mut g| g.take()) {
            worker.abort();
        }
        self.pending.store(0, Ordering::Release);
    }
}

impl Drop for PlaybackQueue {
    fn drop(&mut self) {
        self.close();
    }
}
