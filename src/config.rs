//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Groq model used when `FINGUARD_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default timeout for recommendation requests, in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Bot configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token; when absent the bot runs CLI-only.
    pub telegram_token: Option<String>,
    /// Telegram allowlist (usernames or numeric ids, `*` = everyone).
    pub allowed_users: Vec<String>,
    /// API key for the recommendation generator.
    pub api_key: SecretString,
    /// Model name passed to the recommendation generator.
    pub model: String,
    /// Timeout applied to each recommendation request.
    pub request_timeout: Duration,
}

impl BotConfig {
    /// Read configuration from the environment.
    ///
    /// Missing generator credentials are a fatal startup error; everything
    /// else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GROQ_API_KEY".to_string()))?;

        let model =
            std::env::var("FINGUARD_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let telegram_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let allowed_users = parse_allowed_users(
            &std::env::var("TELEGRAM_ALLOWED_USERS").unwrap_or_else(|_| "*".to_string()),
        );

        let request_timeout = match std::env::var("FINGUARD_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "FINGUARD_REQUEST_TIMEOUT_SECS".to_string(),
                    message: format!("expected an integer number of seconds, got {raw:?}"),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            telegram_token,
            allowed_users,
            api_key: SecretString::from(api_key),
            model,
            request_timeout,
        })
    }
}

/// Parse a comma-separated allowlist, trimming entries and dropping blanks.
pub fn parse_allowed_users(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_users_trims_and_drops_blanks() {
        assert_eq!(
            parse_allowed_users("alice, bob , ,123456"),
            vec!["alice", "bob", "123456"]
        );
    }

    #[test]
    fn allowed_users_wildcard() {
        assert_eq!(parse_allowed_users("*"), vec!["*"]);
    }

    #[test]
    fn allowed_users_empty_input() {
        assert!(parse_allowed_users("").is_empty());
        assert!(parse_allowed_users(" , ,").is_empty());
    }
}
