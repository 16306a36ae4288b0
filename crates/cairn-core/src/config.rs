//! Configuration system for Cairn.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $CAIRN_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/cairn/config.toml
//!   3. ~/.config/cairn/config.toml

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CairnConfig {
    /// UDP port the gossip layer binds for failure detection.
    pub swim_port: u16,
    pub swim: SwimTuning,
}

/// Protocol tuning passed through opaquely to the gossip layer.
///
/// All timings in milliseconds. Defaults match the upstream SWIM
/// implementation and rarely need changing outside tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimTuning {
    /// Gossip round interval.
    pub interval_ms: u64,
    /// How long bootstrap waits for join acks.
    pub join_timeout_ms: u64,
    /// Direct ping timeout.
    pub ping_timeout_ms: u64,
    /// Indirect (ping-req) timeout.
    pub ping_req_timeout_ms: u64,
    /// How many relays an indirect probe fans out to.
    pub ping_req_group_size: u32,
}

impl SwimTuning {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn ping_req_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_req_timeout_ms)
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default gossip port.
pub const DEFAULT_SWIM_PORT: u16 = 2700;

impl Default for CairnConfig {
    fn default() -> Self {
        Self {
            swim_port: DEFAULT_SWIM_PORT,
            swim: SwimTuning::default(),
        }
    }
}

impl Default for SwimTuning {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            join_timeout_ms: 300,
            ping_timeout_ms: 30,
            ping_req_timeout_ms: 80,
            ping_req_group_size: 2,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("cairn")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl CairnConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            CairnConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("CAIRN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&CairnConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply CAIRN_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CAIRN_SWIM_PORT") {
            if let Ok(p) = v.parse() {
                self.swim_port = p;
            }
        }
        if let Ok(v) = std::env::var("CAIRN_SWIM__INTERVAL_MS") {
            if let Ok(ms) = v.parse() {
                self.swim.interval_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("CAIRN_SWIM__JOIN_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.swim.join_timeout_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("CAIRN_SWIM__PING_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.swim.ping_timeout_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("CAIRN_SWIM__PING_REQ_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.swim.ping_req_timeout_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("CAIRN_SWIM__PING_REQ_GROUP_SIZE") {
            if let Ok(n) = v.parse() {
                self.swim.ping_req_group_size = n;
            }
        }
    }
}
