//! idea-discord: Discord Gateway for Idea Bot
//!
//! Serenity 0.12 を使用して Discord Gateway に接続し、
//! `ready` と `message` イベントを idea-core のセッションに渡します。

pub mod bot;
pub mod error;
pub mod handler;

pub use bot::IdeaBot;
pub use error::{DiscordError, Result};
pub use handler::{DiscordReplySink, Handler};
