//! idea-bot: Main Binary
//!
//! Usage:
//!   idea-bot                   - Connect to Discord and answer `.idea`
//!   idea-bot --config <path>   - Use a specific config file
//!   idea-bot --help            - Show help

use idea_core::{Config, GreetingStyle};
use idea_core::session::STARTUP_LINE;
use idea_discord::IdeaBot;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Connect and run the bot
    Run { config_path: Option<String> },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = match parse_args(std::env::args().skip(1))? {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("idea-bot {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Run { config_path } => config_path,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load_from(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting idea-bot...");
    tracing::debug!("Credential source: {:?}", config.credential);

    if config.greeting.style == GreetingStyle::LoggedOn {
        println!("{}", STARTUP_LINE);
    }

    let bot = IdeaBot::new(config);

    tokio::select! {
        result = bot.start() => {
            result.map_err(|e| anyhow::anyhow!("Discord bot error: {}", e))?;
            tracing::info!("Discord client stopped");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> anyhow::Result<RunMode>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config_path = Some(path);
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(RunMode::Run { config_path })
}

/// Print help message
fn print_help() {
    println!("idea-bot - Discord bot that answers .idea");
    println!();
    println!("Usage:");
    println!("  idea-bot                  Connect to Discord");
    println!("  idea-bot --config <path>  Load settings from <path> instead of ./idea-bot.toml");
    println!("  idea-bot --help           Show this help message");
    println!("  idea-bot --version        Show version");
    println!();
    println!("Environment Variables:");
    println!("  TOKEN                       Bot token (default credential variable)");
    println!("  IDEA_BOT_CREDENTIAL_SOURCE  env or file (default: env)");
    println!("  IDEA_BOT_TOKEN_VAR          Variable holding the token (default: TOKEN)");
    println!("  IDEA_BOT_TOKEN_FILE         Token file (default: .token)");
    println!("  IDEA_BOT_GREETING           roster or logged_on (default: logged_on)");
    println!("  IDEA_BOT_ANNOUNCE_CHANNEL   Channel ID for the online message (optional)");
    println!("  RUST_LOG                    Log filter");
}
