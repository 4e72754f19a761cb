//! Relay configuration from the environment

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use herald::{CacheConfig, DispatchConfig, FetchCacheConfig, HubConfig};
use herald_integration_discord::{DiscordConfig, DEFAULT_RSVP_EMOJIS};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub discord_token: Option<String>,
    pub bot_user_id: Option<String>,
    pub embed_channels: Vec<String>,
    pub message_channels: Vec<String>,
    pub buffer_capacity: usize,
    pub recent_capacity: usize,
    pub queue_capacity: usize,
    pub heartbeat: Duration,
    pub asset_ttl: Duration,
    pub asset_timeout: Duration,
    pub asset_max_entries: usize,
    pub asset_hosts: Vec<String>,
    pub rsvp_emojis: Vec<String>,
}

impl RelayConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            bind_addr: get("HERALD_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            discord_token: get("DISCORD_TOKEN"),
            bot_user_id: get("DISCORD_BOT_USER_ID"),
            embed_channels: get("HERALD_EMBED_CHANNELS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            message_channels: get("HERALD_MESSAGE_CHANNELS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            buffer_capacity: positive(&get, "HERALD_BUFFER_CAPACITY", 50)?,
            recent_capacity: positive(&get, "HERALD_RECENT_CAPACITY", 10)?,
            queue_capacity: positive(&get, "HERALD_QUEUE_CAPACITY", 256)?,
            heartbeat: Duration::from_secs(positive(&get, "HERALD_HEARTBEAT_SECS", 30)?),
            asset_ttl: Duration::from_secs(positive(&get, "HERALD_ASSET_TTL_SECS", 12 * 60 * 60)?),
            asset_timeout: Duration::from_secs(positive(&get, "HERALD_ASSET_TIMEOUT_SECS", 10)?),
            asset_max_entries: positive(&get, "HERALD_ASSET_MAX_ENTRIES", 256)?,
            asset_hosts: get("HERALD_ASSET_HOSTS")
                .map(|v| split_list(&v))
                .unwrap_or_else(|| {
                    vec![
                        "cdn.discordapp.com".to_string(),
                        "media.discordapp.net".to_string(),
                    ]
                }),
            rsvp_emojis: get("HERALD_RSVP_EMOJIS")
                .map(|v| split_list(&v))
                .unwrap_or_else(|| DEFAULT_RSVP_EMOJIS.iter().map(|e| e.to_string()).collect()),
        })
    }

    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            channel_capacity: self.buffer_capacity,
            recent_capacity: self.recent_capacity,
        }
    }

    pub fn hub(&self) -> HubConfig {
        HubConfig {
            heartbeat_interval: self.heartbeat,
            ..HubConfig::default()
        }
    }

    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            capacity: self.queue_capacity,
        }
    }

    pub fn fetch_cache(&self) -> FetchCacheConfig {
        FetchCacheConfig {
            ttl: self.asset_ttl,
            fetch_timeout: self.asset_timeout,
            max_entries: self.asset_max_entries,
        }
    }

    /// Discord settings, when a token is configured
    pub fn discord(&self) -> Option<DiscordConfig> {
        let token = self.discord_token.as_ref()?;
        let mut config = DiscordConfig::new(token.clone())
            .with_embed_channels(self.embed_channels.clone())
            .with_message_channels(self.message_channels.clone());
        if let Some(user_id) = &self.bot_user_id {
            config = config.with_bot_user_id(user_id.clone());
        }
        Some(config)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn positive<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    let value: T = raw
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw })?;
    if value == T::default() {
        return Err(ConfigError::Zero { key });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_vars(HashMap::new()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.buffer_capacity, 50);
        assert_eq!(config.recent_capacity, 10);
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.heartbeat, Duration::from_secs(30));
        assert_eq!(config.asset_ttl, Duration::from_secs(43200));
        assert_eq!(config.fetch_cache().max_entries, 256);
        assert_eq!(config.rsvp_emojis, vec!["✅", "❓", "❌"]);
        assert!(config.discord().is_none());
    }

    #[test]
    fn test_lists_and_discord() {
        let config = RelayConfig::from_vars(vars(&[
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_BOT_USER_ID", "77"),
            ("HERALD_EMBED_CHANNELS", " 1, 2 ,,3"),
            ("HERALD_MESSAGE_CHANNELS", ""),
        ]))
        .unwrap();

        assert_eq!(config.embed_channels, vec!["1", "2", "3"]);
        assert!(config.message_channels.is_empty());

        let discord = config.discord().unwrap();
        assert_eq!(discord.token, "abc");
        assert_eq!(discord.bot_user_id.as_deref(), Some("77"));
        assert_eq!(discord.embed_channels.len(), 3);
    }

    #[test]
    fn test_invalid_numbers() {
        let err = RelayConfig::from_vars(vars(&[("HERALD_QUEUE_CAPACITY", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: "HERALD_QUEUE_CAPACITY",
                value: "lots".into()
            }
        );

        let err = RelayConfig::from_vars(vars(&[("HERALD_HEARTBEAT_SECS", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::Zero { key: "HERALD_HEARTBEAT_SECS" });
    }
}
