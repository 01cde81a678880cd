//! # Configuration Module
//!
//! Environment configuration for the bot process and the retry/timeout
//! policy used for backend calls.

use anyhow::{Context, Result};
use std::env;

/// Deadline for a single backend request in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Retries for idempotent reads. Mutating calls never retry.
pub const DEFAULT_READ_RETRIES: u32 = 1;
/// Base delay before a read retry in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
/// Upper bound of the random jitter added to retry delays in milliseconds.
pub const DEFAULT_RETRY_JITTER_MS: u64 = 250;
/// Bounded attempts when /play has to create a game first.
pub const DEFAULT_CREATE_GAME_ATTEMPTS: u32 = 3;

/// Retry and timeout policy for backend calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub request_timeout_secs: u64,
    pub read_retries: u32,
    pub base_retry_delay_ms: u64,
    pub retry_jitter_ms: u64,
    pub create_game_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            read_retries: DEFAULT_READ_RETRIES,
            base_retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            retry_jitter_ms: DEFAULT_RETRY_JITTER_MS,
            create_game_attempts: DEFAULT_CREATE_GAME_ATTEMPTS,
        }
    }
}

/// Process configuration read from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub bot_token: String,
    /// Base URL of the backend API, stored without a trailing slash
    pub backend_url: String,
    /// Websocket URL of the socket gateway
    pub gateway_url: String,
    /// Web app the /start menu links to, optional
    pub web_app_url: Option<String>,
    pub retry: RetryConfig,
}

impl BotConfig {
    pub fn from_env() -> Result<BotConfig> {
        let bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let backend_url = env::var("BACKEND_URL").context("BACKEND_URL must be set")?;
        let gateway_url = env::var("GATEWAY_URL").context("GATEWAY_URL must be set")?;
        let web_app_url = env::var("WEB_APP_URL").ok().filter(|url| !url.is_empty());

        Ok(BotConfig {
            bot_token,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            gateway_url,
            web_app_url,
            retry: RetryConfig::default(),
        })
    }
}
