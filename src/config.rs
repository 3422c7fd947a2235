//! Environment-driven configuration

use crate::conversation::ConversationConfig;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 800;

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    /// Chat-completions URL override
    pub base_url: Option<String>,
    pub port: u16,
    pub max_completion_tokens: u32,
    pub conversation: ConversationConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable values fall back
    /// to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ConversationConfig::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let conversation = ConversationConfig {
            max_input_tokens: parse_or(
                "PARLEY_MAX_INPUT_TOKENS",
                var("PARLEY_MAX_INPUT_TOKENS"),
                defaults.max_input_tokens,
            ),
            chars_per_token: parse_or(
                "PARLEY_CHARS_PER_TOKEN",
                var("PARLEY_CHARS_PER_TOKEN"),
                defaults.chars_per_token,
            ),
            call_timeout: Duration::from_secs(parse_or(
                "PARLEY_CALL_TIMEOUT_SECS",
                var("PARLEY_CALL_TIMEOUT_SECS"),
                defaults.call_timeout.as_secs(),
            )),
            chain_of_thought: parse_or(
                "PARLEY_CHAIN_OF_THOUGHT",
                var("PARLEY_CHAIN_OF_THOUGHT"),
                defaults.chain_of_thought,
            ),
            default_model: var("PARLEY_DEFAULT_MODEL"),
        };

        Self {
            api_key: var("PARLEY_API_KEY").or_else(|| var("LLM_API_KEY")),
            base_url: var("PARLEY_BASE_URL"),
            port: parse_or("PARLEY_PORT", var("PARLEY_PORT"), DEFAULT_PORT),
            max_completion_tokens: parse_or(
                "PARLEY_MAX_COMPLETION_TOKENS",
                var("PARLEY_MAX_COMPLETION_TOKENS"),
                DEFAULT_MAX_COMPLETION_TOKENS,
            ),
            conversation,
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Debug>(key: &str, value: Option<String>, default: T) -> T {
    let Some(raw) = value else {
        return default;
    };
    match raw.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(key, value = %raw, ?default, "Invalid configuration value, using default");
            default
        }
    }
}
