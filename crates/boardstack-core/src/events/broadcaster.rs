//! Write path of the fan-out: one publish, every live subscriber.

use std::sync::Arc;

use tracing::{debug, warn};

use super::channel::ChannelId;
use super::connection::PushOutcome;
use super::message::BoardEvent;
use super::registry::ChannelRegistry;

/// Publishes events to the subscribers of a channel.
///
/// Delivery is best-effort: nothing is retried or persisted, and a failing
/// subscriber is detached without affecting the others. Pushes never block,
/// so a slow client cannot hold up a publisher.
#[derive(Clone, Default)]
pub struct Broadcaster {
    registry: ChannelRegistry,
}

impl Broadcaster {
    pub fn new(registry: ChannelRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Serialize `event` once and fan it out.
    pub fn publish(&self, channel: &ChannelId, event: &BoardEvent) {
        match serde_json::to_string(event) {
            Ok(json) => self.publish_raw(channel, json),
            Err(e) => warn!(channel = %channel, kind = event.kind(), error = %e, "Failed to serialize event"),
        }
    }

    /// Fan out an already serialized payload.
    ///
    /// Publishing to a channel without subscribers does nothing and does not
    /// create the channel.
    pub fn publish_raw(&self, channel: &ChannelId, payload: impl Into<Arc<str>>) {
        let subscribers = self.registry.snapshot(channel);
        if subscribers.is_empty() {
            debug!(channel = %channel, "No subscribers, event discarded");
            return;
        }

        let payload: Arc<str> = payload.into();
        let mut dropped = 0usize;
        for subscriber in &subscribers {
            if subscriber.push(&payload) == PushOutcome::Dropped {
                dropped += 1;
            }
        }
        debug!(
            channel = %channel,
            subscribers = subscribers.len(),
            dropped,
            "Event published"
        );
    }
}
