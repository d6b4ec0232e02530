// Runtime configuration, read from the environment (and `.env` when present)

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{warn, Level};

use crate::address::Address;

/// Program id used when `SETTLEMENT_PROGRAM_ID` is unset
pub const DEFAULT_PROGRAM_ID: Address = Address::new(*b"blackbook-settlement-program-v1!");

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Authority every derived address is computed under
    pub program_id: Address,
    pub base_decimals: u8,
    pub state_path: PathBuf,
    pub journal_capacity: usize,
    pub enable_airdrop: bool,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 1234)),
            program_id: DEFAULT_PROGRAM_ID,
            base_decimals: 9,
            state_path: PathBuf::from("data/settlement_state.json"),
            journal_capacity: 1000,
            enable_airdrop: true,
            log_level: Level::INFO,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; missing or bad values keep the default
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            bind_addr: parse_or(&lookup, "SETTLEMENT_BIND_ADDR", defaults.bind_addr),
            program_id: parse_or(&lookup, "SETTLEMENT_PROGRAM_ID", defaults.program_id),
            base_decimals: parse_or(&lookup, "SETTLEMENT_BASE_DECIMALS", defaults.base_decimals),
            state_path: lookup("SETTLEMENT_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            journal_capacity: parse_or(
                &lookup,
                "SETTLEMENT_JOURNAL_CAPACITY",
                defaults.journal_capacity,
            ),
            enable_airdrop: lookup("SETTLEMENT_ENABLE_AIRDROP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.enable_airdrop),
            log_level: parse_or(&lookup, "SETTLEMENT_LOG_LEVEL", defaults.log_level),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!(
                key,
                value = %raw,
                error = %e,
                fallback = %default,
                "⚠️ Ignoring bad config value"
            );
            default
        }),
    }
}
