//! Configuration system for Whisper.
//!
//! Resolution order: defaults → config file → environment variables.
//! Command-line flags are applied on top by the daemon.
//!
//! Config file location:
//!   1. $WHISPER_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/whisper/config.toml
//!   3. ~/.config/whisper/config.toml
//!
//! A missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::wire::{DEFAULT_LISTEN_PORT, DISCOVERY_BROADCAST, DISCOVERY_PORT};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    pub network: NetworkConfig,
    pub node: NodeSettings,
    pub discovery: DiscoveryConfig,
    pub api: ApiConfig,
    pub bridge: BridgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Host to listen on and advertise. Empty = auto-detect.
    pub host: String,
    /// TCP port for peer links. 0 = OS-assigned.
    pub port: u16,
    /// Peer host:port to dial at startup. Empty = rely on discovery.
    pub peer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Display nickname stamped on originated messages.
    pub nick: String,
    /// Per-peer outbound queue depth. Messages beyond this are dropped.
    pub queue_depth: usize,
    /// Forget seen message ids after N seconds. 0 = never.
    pub seen_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub enabled: bool,
    /// UDP port the listener binds and a bare `target` is sent to.
    /// 0 = OS-assigned listener; the beacon then uses the well-known port.
    pub port: u16,
    /// Beacon destination: a bare host (sent to `port`) or a full host:port.
    /// Normally the limited broadcast address.
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Port for the HTTP status and compose endpoint. 0 = disabled.
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Redis URL, e.g. redis://127.0.0.1:6379. Empty = bridge disabled.
    pub redis_url: String,
    /// Channel delivered messages are published to.
    pub publish_channel: String,
    /// Channel whose messages are originated locally.
    pub subscribe_channel: String,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_LISTEN_PORT,
            peer: String::new(),
        }
    }
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            nick: String::new(),
            queue_depth: 16,
            seen_ttl_secs: 0,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: DISCOVERY_PORT,
            target: DISCOVERY_BROADCAST.to_string(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            redis_url: String::new(),
            publish_channel: "in".to_string(),
            subscribe_channel: "out".to_string(),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("whisper")
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
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl WhisperConfig {
    /// Load config: defaults → file → env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::file_path())
    }

    /// Load from an explicit file path, then apply env overrides.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?
        } else {
            WhisperConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("WHISPER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Apply WHISPER_* overrides, reading variables through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("WHISPER_NETWORK__HOST") {
            self.network.host = v;
        }
        if let Some(p) = lookup("WHISPER_NETWORK__PORT").and_then(|v| v.parse().ok()) {
            self.network.port = p;
        }
        if let Some(v) = lookup("WHISPER_NETWORK__PEER") {
            self.network.peer = v;
        }
        if let Some(v) = lookup("WHISPER_NODE__NICK") {
            self.node.nick = v;
        }
        if let Some(n) = lookup("WHISPER_NODE__QUEUE_DEPTH").and_then(|v| v.parse().ok()) {
            self.node.queue_depth = n;
        }
        if let Some(n) = lookup("WHISPER_NODE__SEEN_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.node.seen_ttl_secs = n;
        }
        if let Some(v) = lookup("WHISPER_DISCOVERY__ENABLED") {
            self.discovery.enabled = v == "true" || v == "1";
        }
        if let Some(p) = lookup("WHISPER_DISCOVERY__PORT").and_then(|v| v.parse().ok()) {
            self.discovery.port = p;
        }
        if let Some(v) = lookup("WHISPER_DISCOVERY__TARGET") {
            self.discovery.target = v;
        }
        if let Some(p) = lookup("WHISPER_API__PORT").and_then(|v| v.parse().ok()) {
            self.api.port = p;
        }
        if let Some(v) = lookup("WHISPER_BRIDGE__REDIS_URL") {
            self.bridge.redis_url = v;
        }
    }
}
