use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use dashmap::DashMap;

use aplink_core::error::Result;
use aplink_core::protocol::{codec, Envelope};

use crate::dispatch::route::{Route, Topics};
use crate::obs::BusMetrics;
use crate::transport::{ListenerId, Participant, Room};

/// Envelope handler. Closures with the same signature implement it.
pub trait Handler: Send + Sync {
    fn handle(&self, env: &Envelope, sender: Option<&Participant>) -> Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&Envelope, Option<&Participant>) -> Result<()> + Send + Sync,
{
    fn handle(&self, env: &Envelope, sender: Option<&Participant>) -> Result<()> {
        self(env, sender)
    }
}

struct HandlerEntry {
    id: u64,
    handler: Arc<dyn Handler>,
}

/// Per-room fan-out: owns the room's single raw-data listener and routes each
/// decoded envelope to exact, prefix, then wildcard handlers.
pub struct Dispatcher {
    room_id: String,
    room: Weak<dyn Room>,
    routes: DashMap<Route, Vec<HandlerEntry>>,
    seq: AtomicU64,
    listener: Mutex<Option<ListenerId>>,
    released: AtomicBool,
    metrics: Arc<BusMetrics>,
}

impl Dispatcher {
    /// Create a dispatcher and hook its master callback into the room.
    /// The callback holds the dispatcher weakly so the room never keeps it alive.
    pub(crate) fn attach(room: &Arc<dyn Room>, metrics: Arc<BusMetrics>) -> Arc<Self> {
        let dispatcher = Arc::new(Self {
            room_id: room.sid().to_string(),
            room: Arc::downgrade(room),
            routes: DashMap::new(),
            seq: AtomicU64::new(1),
            listener: Mutex::new(None),
            released: AtomicBool::new(false),
            metrics,
        });

        let weak = Arc::downgrade(&dispatcher);
        let id = room.on_raw_data_received(Arc::new(move |data: &[u8], sender: Option<&Participant>| {
            if let Some(d) = weak.upgrade() {
                d.on_frame(data, sender);
            }
        }));
        if let Ok(mut g) = dispatcher.listener.lock() {
            *g = Some(id);
        }

        dispatcher
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// The room, if it is still alive.
    pub fn room(&self) -> Option<Arc<dyn Room>> {
        self.room.upgrade()
    }

    /// True if this dispatcher is attached to exactly this room instance.
    pub fn is_bound_to(&self, room: &Arc<dyn Room>) -> bool {
        match self.room.upgrade() {
            Some(r) => Arc::as_ptr(&r) as *const () == Arc::as_ptr(room) as *const (),
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Register `handler` under `topics`. Dropping the returned subscription
    /// removes the handler again.
    pub fn subscribe<F>(self: &Arc<Self>, topics: impl Into<Topics>, handler: F) -> Subscription
    where
        F: Fn(&Envelope, Option<&Participant>) -> Result<()> + Send + Sync + 'static,
    {
        self.subscribe_handler(topics, Arc::new(handler))
    }

    pub fn subscribe_handler(
        self: &Arc<Self>,
        topics: impl Into<Topics>,
        handler: Arc<dyn Handler>,
    ) -> Subscription {
        let routes: Vec<Route> = match topics.into() {
            Topics::All => vec![Route::Wildcard],
            Topics::Keys(keys) => {
                let mut routes: Vec<Route> = Vec::with_capacity(keys.len());
                for key in keys {
                    let route = Route::from(key);
                    if !routes.contains(&route) {
                        routes.push(route);
                    }
                }
                routes
            }
        };

        if self.is_released() {
            tracing::warn!(room = %self.room_id, "subscribe on released dispatcher ignored");
            return Subscription::inert();
        }

        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        for route in &routes {
            self.routes.entry(route.clone()).or_insert_with(Vec::new).push(HandlerEntry {
                id,
                handler: Arc::clone(&handler),
            });
        }
        tracing::debug!(room = %self.room_id, handler = id, routes = routes.len(), "handler subscribed");

        Subscription {
            dispatcher: Arc::downgrade(self),
            routes,
            id,
            active: true,
        }
    }

    /// Number of distinct handler registrations across all routes.
    pub fn handler_count(&self) -> usize {
        let mut ids: Vec<u64> = self
            .routes
            .iter()
            .flat_map(|e| e.value().iter().map(|h| h.id).collect::<Vec<_>>())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Number of non-empty routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Master receive path: decode once, then exact -> prefix -> wildcard.
    pub fn on_frame(&self, data: &[u8], sender: Option<&Participant>) {
        let started = Instant::now();
        self.metrics.frames_received.inc(&[]);

        let env = match codec::decode(data) {
            Ok(env) => env,
            Err(failure) => {
                self.metrics.frames_dropped.inc(&[("reason", failure.as_str())]);
                tracing::trace!(room = %self.room_id, reason = failure.as_str(), len = data.len(), "frame is not an envelope");
                return;
            }
        };

        if let Some(msg_type) = env.msg_type() {
            self.run_route(&Route::Exact(msg_type.to_string()), &env, sender);
            for route in self.prefix_routes_for(msg_type) {
                self.run_route(&route, &env, sender);
            }
        }
        self.run_route(&Route::Wildcard, &env, sender);

        self.metrics.dispatch_duration.observe(&[], started.elapsed());
    }

    fn prefix_routes_for(&self, msg_type: &str) -> Vec<Route> {
        self.routes
            .iter()
            .filter_map(|e| match e.key() {
                Route::Prefix(p) if msg_type.starts_with(p.as_str()) => Some(e.key().clone()),
                _ => None,
            })
            .collect()
    }

    fn run_route(&self, route: &Route, env: &Envelope, sender: Option<&Participant>) {
        // Snapshot first: handlers may (un)subscribe while we iterate.
        let handlers: Vec<Arc<dyn Handler>> = match self.routes.get(route) {
            Some(set) => set.iter().map(|h| Arc::clone(&h.handler)).collect(),
            None => return,
        };
        for handler in handlers {
            self.invoke(route, handler.as_ref(), env, sender);
        }
    }

    fn invoke(&self, route: &Route, handler: &dyn Handler, env: &Envelope, sender: Option<&Participant>) {
        let route_label = route.to_string();
        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(env, sender))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.metrics.handler_failures.inc(&[("route", &route_label)]);
                tracing::warn!(
                    room = %self.room_id,
                    route = %route_label,
                    msg_type = env.msg_type().unwrap_or(""),
                    error = %e,
                    "handler failed"
                );
            }
            Err(_) => {
                self.metrics.handler_failures.inc(&[("route", &route_label)]);
                tracing::error!(
                    room = %self.room_id,
                    route = %route_label,
                    msg_type = env.msg_type().unwrap_or(""),
                    "handler panicked"
                );
            }
        }
    }

    fn unsubscribe(&self, routes: &[Route], id: u64) {
        for route in routes {
            if let Some(mut set) = self.routes.get_mut(route) {
                set.retain(|h| h.id != id);
                if set.is_empty() {
                    drop(set);
                    self.routes.remove_if(route, |_, v| v.is_empty());
                }
            }
        }
        tracing::debug!(room = %self.room_id, handler = id, "handler unsubscribed");
    }

    /// Drop every handler and detach from the room. Idempotent.
    pub(crate) fn shutdown(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.routes.clear();
        let listener = self.listener.lock().ok().and_then(|mut g| g.take());
        if let (Some(id), Some(room)) = (listener, self.room.upgrade()) {
            room.off_raw_data_received(id);
        }
        tracing::info!(room = %self.room_id, "dispatcher released");
    }
}

/// Registration handle. Unsubscribes on `unsubscribe()` or drop.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    dispatcher: Weak<Dispatcher>,
    routes: Vec<Route>,
    id: u64,
    active: bool,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            dispatcher: Weak::new(),
            routes: Vec::new(),
            id: 0,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remove the handler from every route it was added to.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Keep the handler registered for the dispatcher's lifetime.
    pub fn detach(mut self) {
        self.active = false;
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(d) = self.dispatcher.upgrade() {
            d.unsubscribe(&self.routes, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
