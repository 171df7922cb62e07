//! BoardStack Core Library
//!
//! Domain logic for collaborative boards and the real-time fan-out that keeps
//! every viewer of a board in sync.

pub mod access;
pub mod activity;
pub mod avatar;
pub mod board;
pub mod card;
pub mod error;
pub mod events;
pub mod invitation;
pub mod label;
pub mod list;
pub mod mailer;
pub mod member;
pub mod position;
pub mod user;
pub mod validation;

pub use error::{BoardError, BoardResult};
