//! Discord Bot implementation using Serenity

use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::info;

use idea_core::{BotSession, Config, Credential, SessionOptions};

use crate::error::Result;
use crate::handler::Handler;

/// Discord Bot that answers `.idea`
pub struct IdeaBot {
    config: Config,
    session: Arc<BotSession>,
}

impl IdeaBot {
    /// Create a new bot instance in the disconnected state
    pub fn new(config: Config) -> Self {
        let session = Arc::new(BotSession::new(SessionOptions::from(&config)));
        Self { config, session }
    }

    /// Get the session shared with the event handler
    pub fn session(&self) -> Arc<BotSession> {
        self.session.clone()
    }

    /// Gateway intents the bot subscribes to
    ///
    /// MESSAGE_CONTENT is privileged and must be enabled in the developer portal.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    /// Connect and run until the client stops
    ///
    /// A missing or empty credential fails here, before any connection is made.
    pub async fn start(&self) -> Result<()> {
        let credential = Credential::load(&self.config.credential)?;

        info!("Starting Discord bot...");

        let handler = Handler::new(self.session.clone());

        let mut client = Client::builder(credential.expose(), Self::intents())
            .event_handler(handler)
            .await?;

        // Start listening for events
        client.start().await?;

        Ok(())
    }
}
