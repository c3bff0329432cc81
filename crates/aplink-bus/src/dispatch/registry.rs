use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::dispatch::dispatcher::Dispatcher;
use crate::obs::BusMetrics;
use crate::transport::Room;

/// Room id -> dispatcher. At most one dispatcher (and so one raw-data
/// listener) per room; `release` is the explicit teardown.
pub struct DispatcherRegistry {
    dispatchers: DashMap<String, Arc<Dispatcher>>,
    metrics: Arc<BusMetrics>,
}

impl DispatcherRegistry {
    pub fn new(metrics: Arc<BusMetrics>) -> Self {
        Self {
            dispatchers: DashMap::new(),
            metrics,
        }
    }

    /// Existing dispatcher for this room, or a new one hooked into it.
    ///
    /// A dispatcher whose room instance is gone (or was replaced under the same
    /// id without a `release`) is torn down and rebuilt against `room`.
    pub fn get_or_create(&self, room: &Arc<dyn Room>) -> Arc<Dispatcher> {
        match self.dispatchers.entry(room.sid().to_string()) {
            Entry::Occupied(mut e) => {
                if e.get().is_bound_to(room) {
                    return Arc::clone(e.get());
                }
                tracing::warn!(room = %room.sid(), "stale dispatcher replaced");
                e.get().shutdown();
                let fresh = Dispatcher::attach(room, Arc::clone(&self.metrics));
                e.insert(Arc::clone(&fresh));
                fresh
            }
            Entry::Vacant(e) => {
                let dispatcher = Dispatcher::attach(room, Arc::clone(&self.metrics));
                self.metrics.dispatchers_active.inc(&[]);
                tracing::info!(room = %room.sid(), "dispatcher created");
                e.insert(Arc::clone(&dispatcher));
                dispatcher
            }
        }
    }

    pub fn get(&self, room_id: &str) -> Option<Arc<Dispatcher>> {
        self.dispatchers.get(room_id).map(|d| Arc::clone(d.value()))
    }

    /// Unsubscribe from the room and drop every handler. Returns false if no
    /// dispatcher was registered for `room_id`.
    pub fn release(&self, room_id: &str) -> bool {
        let Some((_, dispatcher)) = self.dispatchers.remove(room_id) else {
            return false;
        };
        self.teardown(&dispatcher);
        true
    }

    /// Like `release`, but only if the registered dispatcher is attached to
    /// this exact room instance. A reconnect that reuses the sid keeps its
    /// dispatcher.
    pub fn release_room(&self, room: &Arc<dyn Room>) -> bool {
        let removed = self
            .dispatchers
            .remove_if(room.sid(), |_, d| d.is_bound_to(room));
        let Some((_, dispatcher)) = removed else {
            tracing::debug!(room = %room.sid(), "no dispatcher bound to this room instance");
            return false;
        };
        self.teardown(&dispatcher);
        true
    }

    fn teardown(&self, dispatcher: &Dispatcher) {
        dispatcher.shutdown();
        self.metrics.dispatchers_active.dec(&[]);
    }

    pub fn len(&self) -> usize {
        self.dispatchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatchers.is_empty()
    }
}
