//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. idea-bot.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::Deserialize;
use std::path::Path;

use crate::Error;

/// デフォルトの設定ファイル名
pub const DEFAULT_CONFIG_FILE: &str = "idea-bot.toml";

/// Where the bot token comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Environment variable (after `.env` has been loaded)
    Env { var: String },
    /// Local file whose contents are the token
    File { path: String },
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self::Env {
            var: default_token_var(),
        }
    }
}

/// What the bot prints once the session is ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GreetingStyle {
    /// `<identity> has connected to discord...` followed by the server roster
    Roster,
    /// `Working on it...` at startup, then `Logged on as <identity>!`
    #[default]
    LoggedOn,
}

impl GreetingStyle {
    fn parse(value: &str) -> crate::Result<Self> {
        match value.to_lowercase().as_str() {
            "roster" => Ok(Self::Roster),
            "logged_on" | "logged-on" | "loggedon" => Ok(Self::LoggedOn),
            other => Err(Error::Config(format!("Unknown greeting style: {}", other))),
        }
    }
}

/// Ready-time output configuration
#[derive(Debug, Clone, Default)]
pub struct GreetingConfig {
    /// Greeting style
    pub style: GreetingStyle,

    /// Channel that receives a "bot is online" message on ready (optional)
    pub announce_channel_id: Option<u64>,
}

/// Main configuration for idea-bot
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Token source
    pub credential: CredentialSource,

    /// Ready-time output
    pub greeting: GreetingConfig,
}

fn default_token_var() -> String {
    "TOKEN".to_string()
}

fn default_token_file() -> String {
    ".token".to_string()
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let var_name: String = chars.by_ref().take_while(|&c| c != '}').collect();

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換され、
    /// その後 `IDEA_BOT_*` 環境変数で上書きされます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides()?;

        Ok(cfg)
    }

    /// TOML 文字列から設定を構築する (環境変数の上書きなし)
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded_content = Self::expand_env_vars(content);

        let toml: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        Self::from_toml_config(toml)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `./idea-bot.toml` があればそれを使い、なければ環境変数のみ。
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// 指定パスがあればそこから、なければデフォルトの順序で読み込む
    pub fn load_from(path: Option<&str>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => Self::load(),
        }
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> crate::Result<Self> {
        let credential = toml.credential.unwrap_or_default();
        let credential = Self::credential_source(
            credential.source.as_deref().unwrap_or("env"),
            credential.env_var,
            credential.path,
        )?;

        let greeting = toml.greeting.unwrap_or_default();
        let style = match greeting.style {
            Some(style) => GreetingStyle::parse(&style)?,
            None => GreetingStyle::default(),
        };

        Ok(Config {
            credential,
            greeting: GreetingConfig {
                style,
                announce_channel_id: greeting
                    .announce_channel_id
                    .map(Self::channel_id)
                    .transpose()?,
            },
        })
    }

    /// Discord の ID は 0 を取らない
    fn channel_id(id: u64) -> crate::Result<u64> {
        if id == 0 {
            return Err(Error::Config("announce_channel_id must be non-zero".to_string()));
        }
        Ok(id)
    }

    fn credential_source(
        source: &str,
        env_var: Option<String>,
        path: Option<String>,
    ) -> crate::Result<CredentialSource> {
        match source.to_lowercase().as_str() {
            "env" => Ok(CredentialSource::Env {
                var: env_var.unwrap_or_else(default_token_var),
            }),
            "file" => Ok(CredentialSource::File {
                path: path.unwrap_or_else(default_token_file),
            }),
            other => Err(Error::Config(format!("Unknown credential source: {}", other))),
        }
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) -> crate::Result<()> {
        // 認証情報の上書き
        let (current_var, current_path) = match &self.credential {
            CredentialSource::Env { var } => (Some(var.clone()), None),
            CredentialSource::File { path } => (None, Some(path.clone())),
        };
        let env_var = std::env::var("IDEA_BOT_TOKEN_VAR").ok().or(current_var);
        let path = std::env::var("IDEA_BOT_TOKEN_FILE").ok().or(current_path);

        let source = match std::env::var("IDEA_BOT_CREDENTIAL_SOURCE") {
            Ok(source) if !source.is_empty() => source,
            _ => match self.credential {
                CredentialSource::Env { .. } => "env".to_string(),
                CredentialSource::File { .. } => "file".to_string(),
            },
        };
        self.credential = Self::credential_source(&source, env_var, path)?;

        // 挨拶設定の上書き
        if let Ok(style) = std::env::var("IDEA_BOT_GREETING") {
            if !style.is_empty() {
                self.greeting.style = GreetingStyle::parse(&style)?;
            }
        }
        if let Some(channel) = std::env::var("IDEA_BOT_ANNOUNCE_CHANNEL")
            .ok()
            .filter(|c| !c.trim().is_empty())
        {
            let id = channel.trim().parse().map_err(|_| {
                Error::Config(format!("Invalid IDEA_BOT_ANNOUNCE_CHANNEL: {}", channel))
            })?;
            self.greeting.announce_channel_id = Some(Self::channel_id(id)?);
        }

        Ok(())
    }
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

/// TOML ファイル用のトップレベル構造
#[derive(Debug, Deserialize)]
struct TomlConfig {
    /// 認証情報の設定
    credential: Option<TomlCredentialConfig>,
    /// 挨拶の設定
    greeting: Option<TomlGreetingConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlCredentialConfig {
    /// "env" または "file"
    #[serde(default)]
    source: Option<String>,
    /// 環境変数名
    #[serde(default)]
    env_var: Option<String>,
    /// トークンファイルのパス
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlGreetingConfig {
    /// "roster" または "logged_on"
    #[serde(default)]
    style: Option<String>,
    /// 起動通知を送るチャンネル ID
    #[serde(default)]
    announce_channel_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// `IDEA_BOT_*` overrides are process-global; tests reading them take this lock
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(
            config.credential,
            CredentialSource::Env {
                var: "TOKEN".to_string()
            }
        );
        assert_eq!(config.greeting.style, GreetingStyle::LoggedOn);
        assert!(config.greeting.announce_channel_id.is_none());
    }

    #[test]
    fn test_greeting_style_parse() {
        assert_eq!(GreetingStyle::parse("roster").unwrap(), GreetingStyle::Roster);
        assert_eq!(GreetingStyle::parse("Logged_On").unwrap(), GreetingStyle::LoggedOn);
        assert!(matches!(GreetingStyle::parse("banner"), Err(Error::Config(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("IDEA_BOT_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${IDEA_BOT_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        // 存在しない環境変数
        let result = Config::expand_env_vars("prefix_${IDEA_BOT_NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("IDEA_BOT_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        let result = Config::expand_env_vars("no_vars_here $HOME");
        assert_eq!(result, "no_vars_here $HOME");
    }

    #[test]
    fn test_expand_env_vars_empty_name() {
        let result = Config::expand_env_vars("${}_content");
        assert_eq!(result, "_content");
    }

    #[test]
    fn test_toml_roster_with_env_var() {
        let toml_content = r#"
[credential]
source = "env"
env_var = "token"

[greeting]
style = "roster"
announce_channel_id = 123456789
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.credential,
            CredentialSource::Env {
                var: "token".to_string()
            }
        );
        assert_eq!(config.greeting.style, GreetingStyle::Roster);
        assert_eq!(config.greeting.announce_channel_id, Some(123456789));
    }

    #[test]
    fn test_toml_file_source_default_path() {
        let toml_content = r#"
[credential]
source = "file"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.credential,
            CredentialSource::File {
                path: ".token".to_string()
            }
        );
        assert_eq!(config.greeting.style, GreetingStyle::LoggedOn);
    }

    #[test]
    fn test_toml_empty_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.credential, CredentialSource::default());
        assert_eq!(config.greeting.style, GreetingStyle::LoggedOn);
    }

    #[test]
    fn test_toml_unknown_source() {
        let toml_content = r#"
[credential]
source = "vault"
"#;

        let result = Config::from_toml_str(toml_content);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_zero_channel_rejected() {
        let toml_content = r#"
[greeting]
announce_channel_id = 0
"#;

        let result = Config::from_toml_str(toml_content);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_invalid_syntax() {
        let result = Config::from_toml_str("[credential\nsource = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_path_expansion() {
        unsafe {
            std::env::set_var("IDEA_BOT_TEST_TOKEN_DIR", "/run/secrets");
        }

        let toml_content = r#"
[credential]
source = "file"
path = "${IDEA_BOT_TEST_TOKEN_DIR}/.token"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.credential,
            CredentialSource::File {
                path: "/run/secrets/.token".to_string()
            }
        );

        unsafe {
            std::env::remove_var("IDEA_BOT_TEST_TOKEN_DIR");
        }
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("IDEA_BOT_CREDENTIAL_SOURCE", "file");
            std::env::set_var("IDEA_BOT_TOKEN_FILE", "/tmp/idea.token");
            std::env::set_var("IDEA_BOT_GREETING", "roster");
            std::env::set_var("IDEA_BOT_ANNOUNCE_CHANNEL", "42");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.credential,
            CredentialSource::File {
                path: "/tmp/idea.token".to_string()
            }
        );
        assert_eq!(config.greeting.style, GreetingStyle::Roster);
        assert_eq!(config.greeting.announce_channel_id, Some(42));

        unsafe {
            std::env::set_var("IDEA_BOT_ANNOUNCE_CHANNEL", "general");
        }
        assert!(matches!(Config::from_env(), Err(Error::Config(_))));

        unsafe {
            std::env::remove_var("IDEA_BOT_CREDENTIAL_SOURCE");
            std::env::remove_var("IDEA_BOT_TOKEN_FILE");
            std::env::remove_var("IDEA_BOT_GREETING");
            std::env::remove_var("IDEA_BOT_ANNOUNCE_CHANNEL");
        }
    }

    #[test]
    fn test_env_empty_announce_channel_is_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("IDEA_BOT_ANNOUNCE_CHANNEL", "");
        }

        let config = Config::from_env().unwrap();
        assert!(config.greeting.announce_channel_id.is_none());

        unsafe {
            std::env::remove_var("IDEA_BOT_ANNOUNCE_CHANNEL");
        }
    }

    #[test]
    fn test_from_toml_file_with_env_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idea-bot.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[credential]
source = "env"
env_var = "token"

[greeting]
style = "roster"
announce_channel_id = 111
"#
        )
        .unwrap();

        unsafe {
            std::env::set_var("IDEA_BOT_GREETING", "logged_on");
        }

        let config = Config::load_from(Some(path.to_str().unwrap())).unwrap();

        unsafe {
            std::env::remove_var("IDEA_BOT_GREETING");
        }

        // ファイルの値
        assert_eq!(
            config.credential,
            CredentialSource::Env {
                var: "token".to_string()
            }
        );
        assert_eq!(config.greeting.announce_channel_id, Some(111));
        // 環境変数が優先
        assert_eq!(config.greeting.style, GreetingStyle::LoggedOn);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idea-bot.toml");

        let result = Config::load_from(Some(path.to_str().unwrap()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_credential_source_file_ignores_env_var() {
        let source = Config::credential_source("FILE", Some("token".to_string()), None).unwrap();
        assert_eq!(
            source,
            CredentialSource::File {
                path: ".token".to_string()
            }
        );
    }
}
