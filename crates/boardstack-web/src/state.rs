//! Application state.

use std::sync::Arc;

use boardstack_core::events::{BoardEvent, Broadcaster, ChannelId, ChannelRegistry};
use boardstack_core::mailer::{LogMailer, Mailer};
use boardstack_core::BoardResult;
use boardstack_db::DbPool;

use crate::auth::SessionStore;
use crate::config::{MailMode, ServerConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub events: Broadcaster,
    pub sessions: SessionStore,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state with a fresh registry and the mailer the config asks for.
    pub fn new(db: DbPool, config: ServerConfig) -> BoardResult<Self> {
        let mailer: Option<Arc<dyn Mailer>> = match config.mail {
            MailMode::Log => Some(Arc::new(LogMailer::new(
                config.public_url.clone(),
                config.invitation_ttl_days,
            )?)),
            MailMode::Disabled => None,
        };
        Ok(Self {
            db,
            events: Broadcaster::new(ChannelRegistry::new()),
            sessions: SessionStore::new(),
            mailer,
            config: Arc::new(config),
        })
    }

    pub fn registry(&self) -> &ChannelRegistry {
        self.events.registry()
    }

    /// Publish an event to everyone watching `board_id`.
    pub fn broadcast(&self, board_id: &str, event: BoardEvent) {
        self.events.publish(&ChannelId::board(board_id), &event);
    }
}
