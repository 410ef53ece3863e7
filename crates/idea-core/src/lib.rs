//! idea-core: Idea Bot Core Library
//!
//! 設定の読み込み、認証トークンの管理、チャットプラットフォームに
//! 依存しないボットセッションのロジックを提供します。

pub mod config;
pub mod credential;
pub mod error;
pub mod session;

pub use config::{Config, CredentialSource, GreetingConfig, GreetingStyle};
pub use credential::Credential;
pub use error::{Error, Result};
pub use session::{
    Announcement, BotSession, GuildSummary, Identity, IncomingMessage, OutboundReply,
    ReadyReport, ReplySink, SessionOptions, SessionState,
};
