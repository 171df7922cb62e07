//! Route handlers.

pub mod activity;
pub mod auth;
pub mod boards;
pub mod cards;
pub mod events;
pub mod internal;
pub mod invitations;
pub mod labels;
pub mod lists;
pub mod members;
pub mod users;
