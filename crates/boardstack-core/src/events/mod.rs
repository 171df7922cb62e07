//! Real-time fan-out of board mutations.
//!
//! Clients viewing a board hold a [`SubscriberConnection`] registered in the
//! [`ChannelRegistry`] under the board's [`ChannelId`]. Mutation handlers call
//! [`Broadcaster::publish`] after their store write; every live subscriber of
//! that channel gets the serialized [`BoardEvent`]. Delivery is in-memory,
//! single-process and best-effort.

pub mod broadcaster;
pub mod channel;
pub mod connection;
pub mod message;
pub mod registry;

pub use broadcaster::Broadcaster;
pub use channel::ChannelId;
pub use connection::{ConnectionId, ConnectionStream, PushOutcome, SubscriberConnection};
pub use message::{BoardEvent, PublishRequest};
pub use registry::{ChannelRegistry, RegistryStats};
