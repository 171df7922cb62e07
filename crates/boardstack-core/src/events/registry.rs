//! Channel registry: which connections listen on which channel.
//!
//! Invariants, all maintained under one mutex:
//! - a channel present in the map has at least one subscriber;
//! - the entry for a channel is created in the same critical section as its
//!   first insertion and deleted in the same critical section as its last
//!   removal, so no caller ever observes an empty channel;
//! - each connection is registered under exactly one channel, enforced by
//!   [`SubscriberConnection::claim`];
//! - once [`ChannelRegistry::close_all`] ran, nothing new is registered.
//!
//! Connection callbacks (hooks, pushes) always run after the lock is released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tracing::debug;

use super::channel::ChannelId;
use super::connection::{ConnectionId, SubscriberConnection};

type Subscribers = HashMap<ConnectionId, Arc<SubscriberConnection>>;

#[derive(Default)]
struct Table {
    channels: HashMap<ChannelId, Subscribers>,
    /// Set by `close_all`; later additions are closed on arrival.
    closed: bool,
}

/// Counts reported by [`ChannelRegistry::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub channels: usize,
    pub subscribers: usize,
}

/// Process-wide map from channel to live subscribers.
///
/// Cheap to clone; clones share state. Construct one per server (or per test)
/// and hand it to both the subscription endpoint and the publishers.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    inner: Arc<Mutex<Table>>,
}

fn lock(inner: &Mutex<Table>) -> MutexGuard<'_, Table> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Get the subscriber set for `channel`, creating it if absent.
///
/// Only called while inserting, so the new set is never left empty.
fn ensure_channel<'a>(table: &'a mut Table, channel: &ChannelId) -> &'a mut Subscribers {
    table.channels.entry(channel.clone()).or_default()
}

/// Drop `id` from `channel`, deleting the channel if it is now empty.
fn deregister(inner: &Mutex<Table>, channel: &ChannelId, id: ConnectionId) -> bool {
    let mut table = lock(inner);
    let Some(subscribers) = table.channels.get_mut(channel) else {
        return false;
    };
    let removed = subscribers.remove(&id).is_some();
    if subscribers.is_empty() {
        table.channels.remove(channel);
        debug!(channel = %channel, "Last subscriber left, channel removed");
    }
    removed
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connection` under `channel`.
    ///
    /// The registry installs the connection's detach hook, so the connection
    /// leaves the channel as soon as its transport closes. A connection that
    /// is already closed or already registered somewhere is left alone. After
    /// [`close_all`](Self::close_all) the connection is closed instead.
    pub fn add(&self, channel: ChannelId, connection: Arc<SubscriberConnection>) {
        let id = connection.id();
        if !connection.claim() {
            debug!(channel = %channel, connection = %id, "Connection closed or already registered, not added");
            return;
        }
        let shut_down = {
            let mut table = lock(&self.inner);
            if !table.closed {
                ensure_channel(&mut table, &channel).insert(id, Arc::clone(&connection));
            }
            table.closed
        };
        if shut_down {
            debug!(channel = %channel, connection = %id, "Registry closed, rejecting subscriber");
            connection.close();
            return;
        }
        debug!(channel = %channel, connection = %id, "Subscriber registered");

        // A close racing with the insert above still lands here: on_close runs
        // the hook immediately when the connection is already terminal.
        let registry: Weak<Mutex<Table>> = Arc::downgrade(&self.inner);
        connection.on_close(move |id| {
            if let Some(inner) = registry.upgrade() {
                deregister(&inner, &channel, id);
            }
        });
    }

    /// Deregister `connection` from `channel` and close it.
    ///
    /// Unknown connections are ignored. Closing fires the detach hook, which
    /// finds nothing left to remove.
    pub fn remove(&self, channel: &ChannelId, connection: &SubscriberConnection) {
        if deregister(&self.inner, channel, connection.id()) {
            debug!(channel = %channel, connection = %connection.id(), "Subscriber removed");
        }
        connection.close();
    }

    /// Current subscribers of `channel`, copied out under the lock.
    ///
    /// Empty for unknown channels; never creates an entry.
    pub fn snapshot(&self, channel: &ChannelId) -> Vec<Arc<SubscriberConnection>> {
        lock(&self.inner)
            .channels
            .get(channel)
            .map(|subscribers| subscribers.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        lock(&self.inner).channels.contains_key(channel)
    }

    pub fn channel_count(&self) -> usize {
        lock(&self.inner).channels.len()
    }

    pub fn subscriber_count(&self, channel: &ChannelId) -> usize {
        lock(&self.inner).channels.get(channel).map_or(0, HashMap::len)
    }

    pub fn stats(&self) -> RegistryStats {
        let table = lock(&self.inner);
        RegistryStats {
            channels: table.channels.len(),
            subscribers: table.channels.values().map(HashMap::len).sum(),
        }
    }

    /// Whether [`close_all`](Self::close_all) has run.
    pub fn is_closed(&self) -> bool {
        lock(&self.inner).closed
    }

    /// Close every connection, leaving the registry empty and refusing new
    /// subscribers from then on.
    ///
    /// Used on server shutdown so long-lived streams end.
    pub fn close_all(&self) {
        let drained: Vec<Arc<SubscriberConnection>> = {
            let mut table = lock(&self.inner);
            table.closed = true;
            table
                .channels
                .drain()
                .flat_map(|(_, subscribers)| subscribers.into_values())
                .collect()
        };
        debug!(connections = drained.len(), "Closing all subscriber connections");
        for connection in drained {
            connection.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::connection::PushOutcome;
    use futures::StreamExt;

    fn board(id: &str) -> ChannelId {
        ChannelId::board(id)
    }

    #[test]
    fn test_add_creates_channel_and_remove_deletes_it() {
        let registry = ChannelRegistry::new();
        let (conn, _stream) = SubscriberConnection::open(4);

        registry.add(board("b1"), Arc::clone(&conn));
        assert!(registry.contains(&board("b1")));
        assert_eq!(registry.subscriber_count(&board("b1")), 1);

        registry.remove(&board("b1"), &conn);
        assert!(!registry.contains(&board("b1")));
        assert_eq!(registry.channel_count(), 0);
    }

    #[test]
    fn test_channel_present_iff_non_empty() {
        let registry = ChannelRegistry::new();
        let conns: Vec<_> = (0..4).map(|_| SubscriberConnection::open(4)).collect();

        for (conn, _) in &conns {
            registry.add(board("b1"), Arc::clone(conn));
        }
        for (i, (conn, _)) in conns.iter().enumerate() {
            assert!(registry.contains(&board("b1")));
            registry.remove(&board("b1"), conn);
            assert_eq!(registry.subscriber_count(&board("b1")), conns.len() - i - 1);
        }
        assert!(!registry.contains(&board("b1")));
    }

    #[test]
    fn test_dropping_stream_deregisters() {
        let registry = ChannelRegistry::new();
        let (conn, stream) = SubscriberConnection::open(4);
        registry.add(board("b1"), conn);

        drop(stream);

        assert!(!registry.contains(&board("b1")));
    }

    #[test]
    fn test_repeated_close_removes_once() {
        let registry = ChannelRegistry::new();
        let (a, _sa) = SubscriberConnection::open(4);
        let (b, _sb) = SubscriberConnection::open(4);
        registry.add(board("b1"), Arc::clone(&a));
        registry.add(board("b1"), Arc::clone(&b));

        a.close();
        a.close();
        registry.remove(&board("b1"), &a);

        assert_eq!(registry.subscriber_count(&board("b1")), 1);
        assert_eq!(registry.snapshot(&board("b1"))[0].id(), b.id());
    }

    #[test]
    fn test_connection_stays_under_its_first_channel() {
        let registry = ChannelRegistry::new();
        let (conn, stream) = SubscriberConnection::open(4);
        registry.add(board("a"), Arc::clone(&conn));
        registry.add(board("b"), Arc::clone(&conn));

        assert!(registry.contains(&board("a")));
        assert!(!registry.contains(&board("b")));

        drop(stream);

        assert!(!registry.contains(&board("a")));
        assert_eq!(
            registry.stats(),
            RegistryStats {
                channels: 0,
                subscribers: 0
            }
        );
    }

    #[test]
    fn test_add_closed_connection_is_noop() {
        let registry = ChannelRegistry::new();
        let (conn, stream) = SubscriberConnection::open(4);
        drop(stream);

        registry.add(board("b1"), conn);

        assert_eq!(registry.channel_count(), 0);
    }

    #[test]
    fn test_snapshot_of_unknown_channel_is_empty() {
        let registry = ChannelRegistry::new();
        assert!(registry.snapshot(&board("missing")).is_empty());
        assert_eq!(registry.channel_count(), 0);
    }

    #[test]
    fn test_snapshot_is_stable_across_removal() {
        let registry = ChannelRegistry::new();
        let (a, _sa) = SubscriberConnection::open(4);
        let (b, _sb) = SubscriberConnection::open(4);
        registry.add(board("b1"), Arc::clone(&a));
        registry.add(board("b1"), Arc::clone(&b));

        let snapshot = registry.snapshot(&board("b1"));
        registry.remove(&board("b1"), &a);

        assert_eq!(snapshot.len(), 2);
        let payload: Arc<str> = Arc::from("x");
        let outcomes: Vec<_> = snapshot.iter().map(|c| c.push(&payload)).collect();
        assert!(outcomes.contains(&PushOutcome::Closed));
        assert!(outcomes.contains(&PushOutcome::Queued));
    }

    #[test]
    fn test_stats_count_channels_and_subscribers() {
        let registry = ChannelRegistry::new();
        let conns: Vec<_> = (0..3).map(|_| SubscriberConnection::open(4)).collect();
        registry.add(board("b1"), Arc::clone(&conns[0].0));
        registry.add(board("b1"), Arc::clone(&conns[1].0));
        registry.add(board("b2"), Arc::clone(&conns[2].0));

        assert_eq!(
            registry.stats(),
            RegistryStats {
                channels: 2,
                subscribers: 3
            }
        );
    }

    #[tokio::test]
    async fn test_close_all_ends_streams_and_empties_registry() {
        let registry = ChannelRegistry::new();
        let (a, mut sa) = SubscriberConnection::open(4);
        let (b, mut sb) = SubscriberConnection::open(4);
        registry.add(board("b1"), a);
        registry.add(board("b2"), b);

        registry.close_all();

        assert_eq!(registry.channel_count(), 0);
        assert_eq!(sa.next().await, None);
        assert_eq!(sb.next().await, None);
    }

    #[tokio::test]
    async fn test_add_after_close_all_closes_connection() {
        let registry = ChannelRegistry::new();
        registry.close_all();
        assert!(registry.is_closed());

        let (conn, mut stream) = SubscriberConnection::open(4);
        registry.add(board("b1"), Arc::clone(&conn));

        assert!(conn.is_closed());
        assert_eq!(registry.channel_count(), 0);
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_and_close_keeps_invariant() {
        let registry = ChannelRegistry::new();
        let mut handles = Vec::new();
        for i in 0..64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let channel = board(if i % 2 == 0 { "even" } else { "odd" });
                let (conn, stream) = SubscriberConnection::open(4);
                registry.add(channel, conn);
                tokio::task::yield_now().await;
                drop(stream);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.channel_count(), 0);
    }
}
