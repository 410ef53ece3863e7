//! エラー型定義 (idea-discord)

use thiserror::Error;

/// idea-discord のエラー型
#[derive(Error, Debug)]
pub enum DiscordError {
    #[error(transparent)]
    Core(#[from] idea_core::Error),

    #[error("Serenity error: {0}")]
    SerenityError(#[from] serenity::Error),
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, DiscordError>;
