use dotenvy::dotenv;
use eyre::Result;
use std::{env, fmt, str::FromStr, time::Duration};
use tracing::{info, warn};

use crate::fetcher::DEFAULT_CONCURRENCY;

pub const DEFAULT_API_URL: &str = "https://api.etherscan.io/api";
pub const DEFAULT_NUMBER_OF_BLOCKS: u64 = 100;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing ETHERSCAN_API_KEY env var")]
    MissingApiKey,
}

#[derive(Clone)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
    pub number_of_blocks: u64,
    pub fetch_concurrency: usize,
    pub http_timeout: Duration,
    pub port: u16,
}

// keeps the key out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("number_of_blocks", &self.number_of_blocks)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("http_timeout", &self.http_timeout)
            .field("port", &self.port)
            .finish()
    }
}

/// Load from the process environment, reading `.env` first if present.
pub fn load() -> Result<Config> {
    dotenv().ok();

    let cfg = Config::from_lookup(|key| env::var(key).ok())?;
    info!("Loaded config: {:?}", cfg);
    Ok(cfg)
}

impl Config {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("ETHERSCAN_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_key = lookup("ETHERSCAN_API_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let number_of_blocks = parse_or(&lookup, "NUMBER_OF_BLOCKS", DEFAULT_NUMBER_OF_BLOCKS);
        let fetch_concurrency = parse_or(&lookup, "FETCH_CONCURRENCY", DEFAULT_CONCURRENCY).max(1);
        let http_timeout = Duration::from_secs(parse_or(
            &lookup,
            "HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )
        .max(1));
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);

        Ok(Self {
            api_url,
            api_key,
            number_of_blocks,
            fetch_concurrency,
            http_timeout,
            port,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}
