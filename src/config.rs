use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::error;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplyConfig {
    /// Name that forces a reply when it appears anywhere in a message
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    /// Non-referenced messages are answered with probability 1/reply_chance
    #[serde(default = "default_reply_chance")]
    pub reply_chance: u32,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_max_reply_length")]
    pub max_reply_length: usize,
    /// Treat an @-mention of the bot like saying its name
    #[serde(default = "default_mention_bypass")]
    pub mention_bypass: bool,
}

impl ReplyConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_temperature() -> f32 {
    0.9
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_system_prompt() -> String {
    "You are Twirl the Snail, a tiny, friendly mascot from Emerald Shores.\n\
     You secretly wander the island and sometimes hide in comic panels where only the readers can see you.\n\
     \n\
     Rules:\n\
     - You talk to the reader, never to the Emerald Shores characters.\n\
     - You are sweet, playful, curious, shy and wholesome.\n\
     - Use a gentle, friendly tone with occasional cute emojis like 🐌✨🌿💜\n\
     - Keep messages short and warm.\n\
     - Sometimes mention hiding or moving slowly.\n\
     - Avoid arguments, negativity, adult content, or heavy topics.\n\
     - Do not spam or demand attention.\n\
     - Refer to yourself as Twirl sometimes."
        .to_string()
}

fn default_bot_name() -> String {
    "twirl".to_string()
}

fn default_reply_chance() -> u32 {
    3
}

fn default_cooldown_secs() -> u64 {
    25
}

fn default_max_reply_length() -> usize {
    300
}

fn default_mention_bypass() -> bool {
    true
}

fn default_port() -> u16 {
    10000
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            command_prefix: default_command_prefix(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            reply_chance: default_reply_chance(),
            cooldown_secs: default_cooldown_secs(),
            max_reply_length: default_max_reply_length(),
            mention_bypass: default_mention_bypass(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load the config file (if it exists) and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML")
    }

    /// Overlay `DISCORD_TOKEN`, `OPENAI_KEY` and `PORT` on top of file values.
    /// Empty variables are treated as unset; a malformed `PORT` is logged and
    /// the configured port is kept.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Some(key) = get("OPENAI_KEY") {
            self.llm.api_key = key;
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(port) => self.web.port = port,
                Err(e) => error!(
                    "PORT is not a valid port number ({:?}: {}), using {}",
                    port, e, self.web.port
                ),
            }
        }
    }

    /// Names of the required environment variables that ended up empty.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.discord.token.trim().is_empty() {
            missing.push("DISCORD_TOKEN");
        }
        if self.llm.api_key.trim().is_empty() {
            missing.push("OPENAI_KEY");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_twirl_settings() {
        let config = Config::default();
        assert_eq!(config.reply.reply_chance, 3);
        assert_eq!(config.reply.cooldown(), Duration::from_secs(25));
        assert_eq!(config.reply.max_reply_length, 300);
        assert_eq!(config.reply.bot_name, "twirl");
        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert_eq!(config.llm.max_tokens, 200);
        assert!((config.llm.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.web.port, 10000);
        assert_eq!(config.discord.command_prefix, "!");
        assert!(config.llm.system_prompt.contains("Twirl the Snail"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [reply]
            cooldown_secs = 60

            [llm]
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();
        assert_eq!(config.reply.cooldown_secs, 60);
        assert_eq!(config.reply.reply_chance, 3);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.web.port, 10000);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::parse("[reply\ncooldown_secs = ").is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::parse(
            r#"
            [discord]
            token = "from-file"
            [web]
            port = 8080
            "#,
        )
        .unwrap();
        config.apply_env(env(&[
            ("DISCORD_TOKEN", "from-env"),
            ("OPENAI_KEY", "sk-test"),
            ("PORT", "9000"),
        ]));
        assert_eq!(config.discord.token, "from-env");
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.web.port, 9000);
    }

    #[test]
    fn test_empty_env_var_is_ignored() {
        let mut config = Config::default();
        config.discord.token = "kept".to_string();
        config.apply_env(env(&[("DISCORD_TOKEN", "  ")]));
        assert_eq!(config.discord.token, "kept");
    }

    #[test]
    fn test_bad_port_keeps_default() {
        let mut config = Config::default();
        config.apply_env(env(&[("PORT", "seventy"), ("OPENAI_KEY", "sk-test")]));
        assert_eq!(config.web.port, 10000);
        assert_eq!(config.llm.api_key, "sk-test");

        config.apply_env(env(&[("PORT", "70000")]));
        assert_eq!(config.web.port, 10000);
    }

    #[test]
    fn test_bad_port_keeps_file_value() {
        let mut config = Config::parse("[web]\nport = 8080").unwrap();
        config.apply_env(env(&[("PORT", "-1")]));
        assert_eq!(config.web.port, 8080);
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = Config::default();
        assert_eq!(config.missing_credentials(), vec!["DISCORD_TOKEN", "OPENAI_KEY"]);
        config.discord.token = "abc".to_string();
        assert_eq!(config.missing_credentials(), vec!["OPENAI_KEY"]);
        config.llm.api_key = "sk".to_string();
        assert!(config.missing_credentials().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reply]\nbot_name = \"shelly\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.reply.bot_name, "shelly");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.reply.bot_name, "twirl");
    }
}
