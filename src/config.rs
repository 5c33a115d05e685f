use std::env;
use std::str::FromStr;
use std::time::Duration;

use log::warn;
use uuid::Uuid;

use crate::blockchain::{DEFAULT_MINING_REWARD, DEFAULT_REWARD_SENDER};

/// Node settings, read from the environment (and `.env`, loaded in `main`).
///
/// - `HOST`, `PORT`: listen address (default `127.0.0.1:5000`)
/// - `NODE_ID`: recipient of mining rewards (default: random UUID)
/// - `MINING_REWARD`, `REWARD_SENDER`: reward transaction constants
/// - `PEER_TIMEOUT_SECS`: per-peer fetch timeout during consensus
/// - `MINING_TIMEOUT_SECS`: give up mining after this long (0 = never)
/// - `RESOLVE_INTERVAL_SECS`: background consensus period (0 = disabled)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub node_id: String,
    pub reward_sender: String,
    pub mining_reward: i64,
    pub peer_timeout: Duration,
    pub mining_timeout: Option<Duration>,
    pub resolve_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            node_id: Uuid::new_v4().simple().to_string(),
            reward_sender: DEFAULT_REWARD_SENDER.to_string(),
            mining_reward: DEFAULT_MINING_REWARD,
            peer_timeout: Duration::from_secs(5),
            mining_timeout: None,
            resolve_interval: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            node_id: lookup("NODE_ID")
                .filter(|id| !id.trim().is_empty())
                .unwrap_or(defaults.node_id),
            reward_sender: lookup("REWARD_SENDER").unwrap_or(defaults.reward_sender),
            mining_reward: parse_or(&lookup, "MINING_REWARD", defaults.mining_reward),
            peer_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PEER_TIMEOUT_SECS",
                defaults.peer_timeout.as_secs(),
            )),
            mining_timeout: optional_secs(parse_or(&lookup, "MINING_TIMEOUT_SECS", 0)),
            resolve_interval: optional_secs(parse_or(&lookup, "RESOLVE_INTERVAL_SECS", 0)),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("config - {key}={raw:?} is not valid; using default");
            default
        }),
        None => default,
    }
}

fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
