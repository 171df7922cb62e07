//! Channel identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque key naming one broadcast scope.
///
/// Boards map to `boards/{board_id}`; no two boards share a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// The channel carrying live updates for one board.
    pub fn board(board_id: &str) -> Self {
        Self(format!("boards/{}", board_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ChannelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
