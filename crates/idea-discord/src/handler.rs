//! Discord event handler implementation

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::CreateMessage;
use serenity::http::{GuildPagination, Http};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::prelude::*;
use tracing::{debug, error, info, warn};

use idea_core::{BotSession, GuildSummary, Identity, IncomingMessage, OutboundReply, ReplySink};

/// Maximum page size of `GET /users/@me/guilds`
const GUILD_PAGE_LIMIT: usize = 200;

/// Sends replies through the Discord HTTP API
pub struct DiscordReplySink {
    http: Arc<Http>,
}

impl DiscordReplySink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReplySink for DiscordReplySink {
    async fn reply(&self, reply: &OutboundReply) -> idea_core::Result<()> {
        let channel_id = ChannelId::new(reply.channel_id);
        let builder = CreateMessage::new()
            .content(&reply.content)
            .reference_message((channel_id, MessageId::new(reply.in_reply_to)));

        channel_id
            .send_message(&*self.http, builder)
            .await
            .map_err(|e| idea_core::Error::Send(e.to_string()))?;

        Ok(())
    }
}

/// Serenity event handler bridging `ready` and `message` into the session
pub struct Handler {
    session: Arc<BotSession>,
}

impl Handler {
    pub fn new(session: Arc<BotSession>) -> Self {
        Self { session }
    }

    /// Fetch every guild the bot is a member of, in API order
    async fn fetch_guilds(ctx: &Context) -> Vec<GuildSummary> {
        let http = ctx.http.clone();
        let result = collect_guild_pages(|after| {
            let http = http.clone();
            async move {
                let target = after.map(|id| GuildPagination::After(GuildId::new(id)));
                let page = http.get_guilds(target, Some(GUILD_PAGE_LIMIT as u64)).await?;
                Ok::<_, serenity::Error>(
                    page.into_iter()
                        .map(|g| GuildSummary {
                            name: g.name,
                            id: g.id.get(),
                        })
                        .collect(),
                )
            }
        })
        .await;

        match result {
            Ok(guilds) => guilds,
            Err(e) => {
                warn!("Failed to fetch guild list: {:?}", e);
                Vec::new()
            }
        }
    }
}

/// Walk the guild list page by page until a short page comes back
async fn collect_guild_pages<F, Fut, E>(mut fetch_page: F) -> Result<Vec<GuildSummary>, E>
where
    F: FnMut(Option<u64>) -> Fut,
    Fut: Future<Output = Result<Vec<GuildSummary>, E>>,
{
    let mut guilds = Vec::new();
    let mut after = None;

    loop {
        let page = fetch_page(after).await?;
        let full_page = page.len() >= GUILD_PAGE_LIMIT;
        after = page.last().map(|g| g.id);
        guilds.extend(page);

        if !full_page || after.is_none() {
            break;
        }
        debug!("Fetched {} guilds, requesting next page", guilds.len());
    }

    Ok(guilds)
}

/// Convert a serenity message into the platform-independent form
fn incoming(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        content: msg.content.clone(),
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let identity = Identity::new(ready.user.id.get(), ready.user.tag());
        info!("Connected to Discord as {}", identity);

        let guilds = Self::fetch_guilds(&ctx).await;
        let report = self.session.on_ready(identity, &guilds);

        for line in &report.lines {
            println!("{}", line);
        }

        if let Some(announcement) = report.announcement {
            if let Err(e) = ChannelId::new(announcement.channel_id)
                .say(&ctx.http, announcement.content)
                .await
            {
                warn!(
                    "Failed to announce in channel {}: {:?}",
                    announcement.channel_id, e
                );
            }
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let incoming = incoming(&msg);
        let sink = DiscordReplySink::new(ctx.http.clone());

        match self.session.handle_message(&incoming, &sink).await {
            Ok(true) => info!("Replied to {} in {}", msg.author.name, msg.channel_id),
            Ok(false) => debug!("No reply for message {}", msg.id),
            Err(e) => error!("Failed to send reply: {}", e),
        }
    }
}
