//! Platform-independent bot session
//!
//! The session reacts to two notifications from the chat platform:
//! `ready` (once per established connection) and `message` (once per
//! inbound message). The only active behaviour is answering messages that
//! start with [`TRIGGER_PREFIX`].

use std::fmt;
use std::sync::OnceLock;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::{Config, GreetingStyle};
use crate::Result;

/// Literal prefix that makes the bot reply (case-sensitive)
pub const TRIGGER_PREFIX: &str = ".idea";

/// Fixed reply text for triggered messages
pub const IDEA_REPLY: &str = "Okay, so how about this:";

/// Printed before connecting when using [`GreetingStyle::LoggedOn`]
pub const STARTUP_LINE: &str = "Working on it...";

/// Sent to the announce channel on ready
pub const ANNOUNCEMENT: &str = "bot is online";

/// Authenticated user as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: u64,
    pub name: String,
}

impl Identity {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Server the session is a member of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSummary {
    pub name: String,
    pub id: u64,
}

/// Inbound chat message
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
}

/// Reply to be delivered into the originating channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    /// Message being replied to
    pub in_reply_to: u64,
    pub channel_id: u64,
    pub content: String,
}

/// Message posted to a fixed channel once the session is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub channel_id: u64,
    pub content: String,
}

/// Output of the ready notification
#[derive(Debug, Clone, Default)]
pub struct ReadyReport {
    /// Console lines, in print order
    pub lines: Vec<String>,
    pub announcement: Option<Announcement>,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

/// Outbound side of the chat platform
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver a reply to the message it references
    async fn reply(&self, reply: &OutboundReply) -> Result<()>;
}

/// Behaviour options for a session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub greeting: GreetingStyle,
    pub announce_channel_id: Option<u64>,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            greeting: config.greeting.style,
            announce_channel_id: config.greeting.announce_channel_id,
        }
    }
}

/// Bot session state shared with the platform event handler
#[derive(Debug)]
pub struct BotSession {
    options: SessionOptions,
    identity: OnceLock<Identity>,
}

impl BotSession {
    /// Create a disconnected session
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            identity: OnceLock::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.identity.get().is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Own identity, once ready
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    /// Handle the ready notification
    ///
    /// Records the own identity on the first call. Later calls (gateway
    /// reconnects) keep the first identity and report again.
    pub fn on_ready(&self, identity: Identity, guilds: &[GuildSummary]) -> ReadyReport {
        let identity = self.identity.get_or_init(|| identity);
        info!("Session ready as {} ({})", identity, identity.id);

        let lines = match self.options.greeting {
            GreetingStyle::Roster => {
                let mut lines = Vec::with_capacity(guilds.len() + 2);
                lines.push(format!("{} has connected to discord...", identity));
                lines.push("Bot servers: ".to_string());
                lines.extend(
                    guilds
                        .iter()
                        .map(|g| format!("Server name: {}, Server ID: {}", g.name, g.id)),
                );
                lines
            }
            GreetingStyle::LoggedOn => vec![format!("Logged on as {}!", identity)],
        };

        let announcement = self.options.announce_channel_id.map(|channel_id| Announcement {
            channel_id,
            content: ANNOUNCEMENT.to_string(),
        });

        ReadyReport {
            lines,
            announcement,
        }
    }

    /// Decide whether a message gets a reply
    pub fn respond_to(&self, message: &IncomingMessage) -> Option<OutboundReply> {
        let own = self.identity.get()?;

        if message.author_id == own.id {
            return None;
        }

        if !message.content.starts_with(TRIGGER_PREFIX) {
            return None;
        }

        Some(OutboundReply {
            in_reply_to: message.id,
            channel_id: message.channel_id,
            content: IDEA_REPLY.to_string(),
        })
    }

    /// Handle the message notification, sending at most one reply
    ///
    /// Returns whether a reply was sent.
    pub async fn handle_message<S>(&self, message: &IncomingMessage, sink: &S) -> Result<bool>
    where
        S: ReplySink + ?Sized,
    {
        let Some(reply) = self.respond_to(message) else {
            return Ok(false);
        };

        debug!(
            "Replying to {} in {} (message {})",
            message.author_name, message.channel_id, message.id
        );
        sink.reply(&reply).await?;
        Ok(true)
    }
}
