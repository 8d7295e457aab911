//! Event fan-out from backend callbacks to subscriber worker threads.
//!
//! Each subscriber owns a bounded queue and a worker thread. Backend
//! callbacks push through [`Dispatcher::publish`], which never blocks: a
//! full queue triggers the configured overflow policy and the loss is
//! counted. Because one port's events always arrive from one callback and
//! land in order in each queue, per-port FIFO holds per subscriber.
//!
//! Port liveness is checked twice, once at publish and once at delivery, so
//! no event from a closed port reaches a callback after `close()` returns.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use dashmap::DashMap;
use parking_lot::Mutex;
use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use crate::config::OverflowPolicy;
use crate::event::{MidiEvent, PortId};
use crate::input::ChannelShared;
use crate::stats::{EngineStats, SubscriberStats};

/// Attempts to place an event after evicting under `DropOldest` before the
/// incoming event itself is dropped.
const EVICT_RETRY_LIMIT: usize = 8;

/// Handle to one subscription, returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Which ports a subscriber wants events from.
#[derive(Debug, Clone, Default)]
pub enum PortFilter {
    /// Events from every open input.
    #[default]
    All,
    /// Events from these ports only.
    Ports(SmallVec<[PortId; 4]>),
}

impl PortFilter {
    /// Filter for a single port.
    pub fn port(id: PortId) -> Self {
        Self::Ports(smallvec![id])
    }

    /// Filter for a set of ports.
    pub fn ports(ids: impl IntoIterator<Item = PortId>) -> Self {
        Self::Ports(ids.into_iter().collect())
    }

    fn matches(&self, port: PortId) -> bool {
        match self {
            Self::All => true,
            Self::Ports(ids) => ids.contains(&port),
        }
    }
}

/// State shared with worker threads. Workers hold this, never the
/// dispatcher itself, so an exiting engine cannot be kept alive by its own
/// workers.
struct DispatcherCore {
    channels: DashMap<PortId, Arc<ChannelShared>>,
    malformed: AtomicU64,
    overflowed: AtomicU64,
    dropped_on_close: AtomicU64,
}

struct SubscriberShared {
    id: SubscriptionId,
    active: AtomicBool,
    delivered: AtomicU64,
    overflowed: AtomicU64,
    dropped_on_close: AtomicU64,
}

struct SubscriberSlot {
    shared: Arc<SubscriberShared>,
    filter: PortFilter,
    tx: Sender<MidiEvent>,
    /// Publisher-side receiver, used only to evict under `DropOldest`.
    evict: Receiver<MidiEvent>,
}

pub(crate) struct Dispatcher {
    core: Arc<DispatcherCore>,
    subscribers: ArcSwap<Vec<Arc<SubscriberSlot>>>,
    /// Serializes subscriber list mutation; readers go lock-free.
    mutate: Mutex<()>,
    next_subscription: AtomicU64,
    queue_capacity: usize,
    policy: OverflowPolicy,
}

impl Dispatcher {
    pub(crate) fn new(queue_capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            core: Arc::new(DispatcherCore {
                channels: DashMap::new(),
                malformed: AtomicU64::new(0),
                overflowed: AtomicU64::new(0),
                dropped_on_close: AtomicU64::new(0),
            }),
            subscribers: ArcSwap::from_pointee(Vec::new()),
            mutate: Mutex::new(()),
            next_subscription: AtomicU64::new(1),
            queue_capacity,
            policy,
        }
    }

    pub(crate) fn register_channel(&self, port: PortId, shared: Arc<ChannelShared>) {
        self.core.channels.insert(port, shared);
    }

    pub(crate) fn remove_channel(&self, port: PortId) -> bool {
        self.core.channels.remove(&port).is_some()
    }

    pub(crate) fn note_malformed(&self, count: u64) {
        self.core.malformed.fetch_add(count, Ordering::Relaxed);
    }

    /// Fans one event out to every matching subscriber queue. Called from
    /// backend callback threads; never blocks.
    pub(crate) fn publish(&self, event: MidiEvent) {
        if !self.core.channels.contains_key(&event.port) {
            return;
        }
        let port = event.port;
        let subs = self.subscribers.load();
        let matching: SmallVec<[&SubscriberSlot; 8]> = subs
            .iter()
            .map(|slot| slot.as_ref())
            .filter(|slot| {
                slot.shared.active.load(Ordering::Acquire) && slot.filter.matches(port)
            })
            .collect();
        // The last match takes the event by value, so single-subscriber
        // traffic never clones a sysex payload.
        let Some((&last, rest)) = matching.split_last() else {
            return;
        };
        for &slot in rest {
            self.offer(slot, event.clone());
        }
        self.offer(last, event);
    }

    fn offer(&self, slot: &SubscriberSlot, event: MidiEvent) {
        match slot.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(returned)) => match self.policy {
                OverflowPolicy::DropNewest => {
                    slot.shared.overflowed.fetch_add(1, Ordering::Relaxed);
                    self.core.overflowed.fetch_add(1, Ordering::Relaxed);
                    trace!(
                        subscription = slot.shared.id.0,
                        "subscriber queue full; dropped incoming event"
                    );
                }
                OverflowPolicy::DropOldest => {
                    // Bounded retry: concurrent publishers can refill the
                    // slot an eviction just freed, so a retry is not
                    // guaranteed to land. After the cap the incoming event
                    // is dropped instead, keeping publish non-blocking on
                    // the callback thread no matter what.
                    let mut event = returned;
                    let mut lost = 0u64;
                    let mut resolved = false;
                    for _ in 0..EVICT_RETRY_LIMIT {
                        if slot.evict.try_recv().is_ok() {
                            lost += 1;
                        }
                        match slot.tx.try_send(event) {
                            Ok(()) => {
                                resolved = true;
                                break;
                            }
                            Err(TrySendError::Full(returned)) => event = returned,
                            Err(TrySendError::Disconnected(_)) => {
                                resolved = true;
                                break;
                            }
                        }
                    }
                    if !resolved {
                        lost += 1;
                    }
                    if lost > 0 {
                        slot.shared.overflowed.fetch_add(lost, Ordering::Relaxed);
                        self.core.overflowed.fetch_add(lost, Ordering::Relaxed);
                        trace!(
                            subscription = slot.shared.id.0,
                            lost,
                            "subscriber queue full; evicted oldest"
                        );
                    }
                }
            },
        }
    }

    pub(crate) fn subscribe(
        &self,
        filter: PortFilter,
        callback: Box<dyn FnMut(MidiEvent) + Send + 'static>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = bounded(self.queue_capacity);
        let shared = Arc::new(SubscriberShared {
            id,
            active: AtomicBool::new(true),
            delivered: AtomicU64::new(0),
            overflowed: AtomicU64::new(0),
            dropped_on_close: AtomicU64::new(0),
        });
        let slot = Arc::new(SubscriberSlot {
            shared: shared.clone(),
            filter,
            tx,
            evict: rx.clone(),
        });

        {
            let _guard = self.mutate.lock();
            let mut subs = Vec::clone(&self.subscribers.load_full());
            subs.push(slot);
            self.subscribers.store(Arc::new(subs));
        }

        let core = self.core.clone();
        thread::Builder::new()
            .name(format!("midimux-sub-{}", id.0))
            .spawn(move || worker_loop(core, rx, shared, callback))
            .expect("failed to spawn subscriber worker thread");
        debug!(subscription = id.0, "subscriber registered");
        id
    }

    /// Removes a subscriber. Events still queued for it are discarded. The
    /// worker exits once the last publisher snapshot holding its sender is
    /// released.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = {
            let _guard = self.mutate.lock();
            let current = self.subscribers.load_full();
            let mut kept = Vec::with_capacity(current.len());
            let mut removed = None;
            for slot in current.iter() {
                if slot.shared.id == id {
                    removed = Some(slot.clone());
                } else {
                    kept.push(slot.clone());
                }
            }
            if removed.is_some() {
                self.subscribers.store(Arc::new(kept));
            }
            removed
        };
        let Some(slot) = removed else {
            return false;
        };
        slot.shared.active.store(false, Ordering::Release);
        while slot.evict.try_recv().is_ok() {}
        debug!(subscription = id.0, "subscriber removed");
        true
    }

    /// Deactivates every subscriber and drops their senders so all workers
    /// exit. Open input ports keep publishing into the void harmlessly.
    pub(crate) fn shutdown(&self) {
        let _guard = self.mutate.lock();
        let current = self.subscribers.load_full();
        for slot in current.iter() {
            slot.shared.active.store(false, Ordering::Release);
        }
        self.subscribers.store(Arc::new(Vec::new()));
        if !current.is_empty() {
            debug!(subscribers = current.len(), "dispatcher shut down");
        }
    }

    pub(crate) fn stats(&self) -> EngineStats {
        EngineStats {
            open_inputs: self.core.channels.len(),
            subscribers: self.subscribers.load().len(),
            malformed: self.core.malformed.load(Ordering::Relaxed),
            overflowed: self.core.overflowed.load(Ordering::Relaxed),
            dropped_on_close: self.core.dropped_on_close.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn subscriber_stats(&self, id: SubscriptionId) -> Option<SubscriberStats> {
        self.subscribers
            .load()
            .iter()
            .find(|slot| slot.shared.id == id)
            .map(|slot| SubscriberStats {
                delivered: slot.shared.delivered.load(Ordering::Relaxed),
                overflowed: slot.shared.overflowed.load(Ordering::Relaxed),
                dropped_on_close: slot.shared.dropped_on_close.load(Ordering::Relaxed),
            })
    }
}

fn worker_loop(
    core: Arc<DispatcherCore>,
    rx: Receiver<MidiEvent>,
    shared: Arc<SubscriberShared>,
    mut callback: Box<dyn FnMut(MidiEvent) + Send + 'static>,
) {
    while let Ok(event) = rx.recv() {
        if !shared.active.load(Ordering::Acquire) {
            continue;
        }
        // Delivery-time liveness check: the port may have closed while this
        // event sat in the queue.
        if !core.channels.contains_key(&event.port) {
            shared.dropped_on_close.fetch_add(1, Ordering::Relaxed);
            core.dropped_on_close.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        callback(event);
        shared.delivered.fetch_add(1, Ordering::Relaxed);
    }
    trace!(subscription = shared.id.0, "subscriber worker exited");
}
