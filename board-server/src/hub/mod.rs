//! Station update hub: per-station publish/subscribe registries.
//!
//! Sessions subscribe to the station they display; the edit path
//! publishes after every committed status change. Signals are
//! idempotent "recompute now" triggers, not payload carriers of
//! record, so delivery is fire-and-forget over small bounded channels
//! with drop-on-full semantics; a slow or dead subscriber can never
//! block the edit path.
//!
//! Two registries exist with identical shape: [`UpdateHub`] carries
//! unit triggers for display boards, [`VoiceHub`] carries the edited
//! stop's identifier for voice-announcement sessions.
//!
//! The hub is an owned, lifecycle-scoped object (built at server start
//! and passed by `Arc` into sessions and the edit handler), not global
//! state; tests construct a fresh hub per case. The registry mutex is
//! a plain std mutex: nothing suspends while holding it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::domain::{StationId, StopId};

/// Refresh-trigger registry used by display boards.
pub type UpdateHub = Hub<()>;

/// Stop-identified registry used by voice-announcement sessions.
pub type VoiceHub = Hub<StopId>;

/// Per-subscriber channel capacity. Signals are idempotent triggers;
/// once a few are queued, further ones add nothing.
const CHANNEL_CAPACITY: usize = 4;

/// Opaque identifier of one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(u64);

struct Entry<T> {
    handle: SubscriberHandle,
    tx: mpsc::Sender<T>,
}

/// A per-station publish/subscribe registry.
pub struct Hub<T> {
    registry: Mutex<HashMap<StationId, Vec<Entry<T>>>>,
    next_handle: AtomicU64,
}

impl<T> Default for Hub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Hub<T> {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(0),
        }
    }

    /// Remove a subscriber. Idempotent: unknown handles (already
    /// removed, never registered) are ignored.
    pub fn unsubscribe(&self, station: StationId, handle: SubscriberHandle) {
        let mut registry = self.registry.lock().expect("hub lock poisoned");
        if let Some(entries) = registry.get_mut(&station) {
            entries.retain(|e| e.handle != handle);
            if entries.is_empty() {
                registry.remove(&station);
            }
        }
    }

    /// Number of live subscribers for a station.
    pub fn subscriber_count(&self, station: StationId) -> usize {
        self.registry
            .lock()
            .expect("hub lock poisoned")
            .get(&station)
            .map_or(0, Vec::len)
    }
}

impl<T: Clone + Send + 'static> Hub<T> {
    /// Register a new subscriber channel for `station`.
    ///
    /// The returned guard owns the receiving end; dropping it
    /// unsubscribes, so cleanup runs on every session exit path
    /// (including task abort).
    pub fn subscribe(self: &Arc<Self>, station: StationId) -> Subscription<T> {
        let handle = SubscriberHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.registry
            .lock()
            .expect("hub lock poisoned")
            .entry(station)
            .or_default()
            .push(Entry { handle, tx });
        Subscription {
            hub: Arc::clone(self),
            station,
            handle,
            rx,
        }
    }

    /// Deliver `payload` to every subscriber currently registered for
    /// `station`. Never blocks: full or closed channels drop the
    /// signal (the subscriber either already has a pending trigger or
    /// is gone). Returns the number of deliveries.
    pub fn publish(&self, station: StationId, payload: T) -> usize {
        let mut registry = self.registry.lock().expect("hub lock poisoned");
        let Some(entries) = registry.get_mut(&station) else {
            return 0;
        };
        entries.retain(|e| !e.tx.is_closed());
        let mut delivered = 0;
        for entry in entries.iter() {
            if entry.tx.try_send(payload.clone()).is_ok() {
                delivered += 1;
            }
        }
        if entries.is_empty() {
            registry.remove(&station);
        }
        delivered
    }
}

/// A live hub registration, owning the signal receiver.
pub struct Subscription<T> {
    hub: Arc<Hub<T>>,
    station: StationId,
    handle: SubscriberHandle,
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn handle(&self) -> SubscriberHandle {
        self.handle
    }

    /// Wait for the next signal. `None` only if the hub dropped the
    /// sender, which does not happen while the registration is live.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.station, self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn publish_reaches_registered_subscriber() {
        let hub: Arc<UpdateHub> = Arc::new(Hub::new());
        let mut sub = hub.subscribe(StationId(1));
        assert_eq!(hub.publish(StationId(1), ()), 1);
        assert_eq!(sub.recv().await, Some(()));
    }

    #[tokio::test]
    async fn publish_is_scoped_to_the_station() {
        let hub: Arc<UpdateHub> = Arc::new(Hub::new());
        let _sub_other = hub.subscribe(StationId(2));
        assert_eq!(hub.publish(StationId(1), ()), 0);
    }

    #[tokio::test]
    async fn publish_before_subscribe_is_not_delivered() {
        let hub: Arc<UpdateHub> = Arc::new(Hub::new());
        hub.publish(StationId(1), ());
        let mut sub = hub.subscribe(StationId(1));
        let res = tokio::time::timeout(Duration::from_millis(20), sub.recv()).await;
        assert!(res.is_err(), "late subscriber must not see old signals");
    }

    #[tokio::test]
    async fn all_current_subscribers_are_woken() {
        let hub: Arc<UpdateHub> = Arc::new(Hub::new());
        let mut subs: Vec<_> = (0..5).map(|_| hub.subscribe(StationId(7))).collect();
        assert_eq!(hub.publish(StationId(7), ()), 5);
        for sub in &mut subs {
            assert_eq!(
                tokio::time::timeout(Duration::from_millis(100), sub.recv())
                    .await
                    .expect("signal before timeout"),
                Some(())
            );
        }
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let hub: Arc<UpdateHub> = Arc::new(Hub::new());
        let sub = hub.subscribe(StationId(1));
        let handle = sub.handle();
        hub.unsubscribe(StationId(1), handle);
        // Second removal of the same handle: no effect, no panic.
        hub.unsubscribe(StationId(1), handle);
        assert_eq!(hub.subscriber_count(StationId(1)), 0);
    }

    #[tokio::test]
    async fn dropping_the_subscription_unsubscribes() {
        let hub: Arc<UpdateHub> = Arc::new(Hub::new());
        let sub = hub.subscribe(StationId(3));
        assert_eq!(hub.subscriber_count(StationId(3)), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(StationId(3)), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_drops_excess_signals_without_blocking() {
        let hub: Arc<UpdateHub> = Arc::new(Hub::new());
        let mut sub = hub.subscribe(StationId(1));
        // Far more signals than the channel holds; publish never blocks.
        for _ in 0..100 {
            hub.publish(StationId(1), ());
        }
        // The queued triggers are still there and still wake us.
        assert_eq!(sub.recv().await, Some(()));
    }

    #[tokio::test]
    async fn voice_hub_carries_the_edited_stop() {
        let hub: Arc<VoiceHub> = Arc::new(Hub::new());
        let mut sub = hub.subscribe(StationId(1));
        hub.publish(StationId(1), StopId(42));
        assert_eq!(sub.recv().await, Some(StopId(42)));
    }
}
