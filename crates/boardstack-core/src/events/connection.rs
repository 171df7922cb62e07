//! One client's long-lived event stream.
//!
//! A [`SubscriberConnection`] owns the sending half of a bounded queue; the
//! matching [`ConnectionStream`] is handed to the transport and yields queued
//! payloads. The connection becomes terminal the first time any of these
//! happens:
//!
//! - the transport drops its [`ConnectionStream`] (client went away),
//! - a push fails because the queue is full or the receiver is gone,
//! - the server calls [`SubscriberConnection::close`].
//!
//! At that moment the sender is dropped, so the stream drains what was
//! already queued and then ends, and the detach hook fires exactly once.

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Detach hook, called with the id of the connection that closed.
pub type CloseHook = Box<dyn FnOnce(ConnectionId) + Send + 'static>;

/// What happened to a single push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The payload is queued for the client.
    Queued,
    /// The connection was already terminal; nothing was sent.
    Closed,
    /// Delivery failed and the connection was detached.
    Dropped,
}

struct State {
    sink: Option<mpsc::Sender<Arc<str>>>,
    hook: Option<CloseHook>,
    closed: bool,
    /// Taken by the registry that owns this connection.
    claimed: bool,
}

impl State {
    /// Mark terminal and hand back the hook, if one is still pending.
    fn shut(&mut self) -> Option<CloseHook> {
        self.closed = true;
        self.sink = None;
        self.hook.take()
    }
}

/// A registered subscriber.
///
/// Sink, hook, and closed flag share one mutex: pushes to the same
/// connection are serialized, and no push can enqueue once the hook fired.
pub struct SubscriberConnection {
    id: ConnectionId,
    state: Mutex<State>,
}

impl SubscriberConnection {
    /// Open a connection with a queue of `capacity` pending messages.
    pub fn open(capacity: usize) -> (Arc<Self>, ConnectionStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let connection = Arc::new(Self {
            id: ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)),
            state: Mutex::new(State {
                sink: Some(tx),
                hook: None,
                closed: false,
                claimed: false,
            }),
        });
        let stream = ConnectionStream {
            rx,
            connection: Arc::clone(&connection),
        };
        (connection, stream)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Take ownership for a registry. Succeeds once, and only while open.
    pub fn claim(&self) -> bool {
        let mut state = self.lock();
        if state.closed || state.claimed {
            return false;
        }
        state.claimed = true;
        true
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `message` for this client without waiting.
    ///
    /// Never fails: a full queue or a vanished receiver detaches the
    /// connection and reports [`PushOutcome::Dropped`].
    pub fn push(&self, message: &Arc<str>) -> PushOutcome {
        let mut state = self.lock();
        let Some(sink) = state.sink.as_ref() else {
            return PushOutcome::Closed;
        };

        match sink.try_send(Arc::clone(message)) {
            Ok(()) => PushOutcome::Queued,
            Err(err) => {
                match err {
                    TrySendError::Full(_) => {
                        warn!(connection = %self.id, "Subscriber queue full, detaching slow client")
                    }
                    TrySendError::Closed(_) => {
                        debug!(connection = %self.id, "Subscriber stream gone, detaching")
                    }
                }
                let hook = state.shut();
                drop(state);
                if let Some(hook) = hook {
                    hook(self.id);
                }
                PushOutcome::Dropped
            }
        }
    }

    /// Register the detach hook.
    ///
    /// Runs immediately when the connection is already terminal. A second
    /// registration on an open connection replaces the first.
    pub fn on_close<F>(&self, hook: F)
    where
        F: FnOnce(ConnectionId) + Send + 'static,
    {
        let mut state = self.lock();
        if state.closed {
            drop(state);
            hook(self.id);
            return;
        }
        state.hook = Some(Box::new(hook));
    }

    /// Close the connection. Idempotent; only the first call fires the hook.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        let hook = state.shut();
        drop(state);
        debug!(connection = %self.id, "Subscriber connection closed");
        if let Some(hook) = hook {
            hook(self.id);
        }
    }
}

impl fmt::Debug for SubscriberConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberConnection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Receiving side of a connection, consumed by the transport.
///
/// Dropping it closes the connection.
pub struct ConnectionStream {
    rx: mpsc::Receiver<Arc<str>>,
    connection: Arc<SubscriberConnection>,
}

impl ConnectionStream {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection.id()
    }
}

impl Stream for ConnectionStream {
    type Item = Arc<str>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ConnectionStream {
    fn drop(&mut self) {
        self.connection.close();
    }
}
