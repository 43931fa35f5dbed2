//! Error types for FinGuard.
//!
//! Validation rejections are deliberately not here: a malformed answer is a
//! local re-prompt (`flow::validate::Reject`), never an error that escapes
//! the dispatcher.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Recommendation error: {0}")]
    Recommend(#[from] RecommendError),
}

/// Configuration-related errors. Fatal at startup, before any session exists.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Recommendation generator errors. Rendered as visible text in the result
/// state; the flow always resolves.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("Recommendation request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Malformed response from recommendation service: {reason}")]
    InvalidResponse { reason: String },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
