//! Node configuration
//!
//! `signet.conf` is a flat `Key = value` file; `#` starts a comment. The same
//! reader parses the per-peer records under `nodes/`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default root directory for all node state
pub const DEFAULT_ROOT_DIR: &str = "/etc/signet";

/// Default HTTP port, also appended to peer addresses without one
pub const DEFAULT_PORT: &str = "8080";

const DEFAULT_CONF_PATH: &str = "/etc/signet/signet.conf";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SIGNET_CONFIG";

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding key, block log, pending snapshot, and peer records
    pub root_dir: PathBuf,

    /// Host (or host:port) this node is reachable at
    pub address: String,

    /// Display name
    pub nick_name: String,

    /// Network-unique node identifier
    pub node_name: String,

    /// HTTP listen port
    pub port: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            address: String::new(),
            nick_name: String::new(),
            node_name: String::new(),
            port: DEFAULT_PORT.to_string(),
        }
    }
}

impl Config {
    /// Load from the default path, honoring the `SIGNET_CONFIG` override
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load from an explicit path; a missing file yields defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Config::default();
        let path = path.as_ref();

        if !path.exists() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let values = parse_kv(&content)?;

        if let Some(v) = values.get("RootDir") {
            config.root_dir = PathBuf::from(v);
        }
        if let Some(v) = values.get("Address") {
            config.address = v.clone();
        }
        if let Some(v) = values.get("NickName") {
            config.nick_name = v.clone();
        }
        if let Some(v) = values.get("NodeName") {
            config.node_name = v.clone();
        }
        if let Some(v) = values.get("Port") {
            config.port = v.clone();
        }

        Ok(config)
    }

    /// Write the config in the same `Key = value` form the loader reads
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = format!(
            "RootDir = {}\nAddress = {}\nNickName = {}\nNodeName = {}\nPort = {}\n",
            self.root_dir.display(),
            self.address,
            self.nick_name,
            self.node_name,
            self.port
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolved config file location (`SIGNET_CONFIG` or the default)
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONF_PATH))
    }

    /// Private key file
    pub fn priv_key_path(&self) -> PathBuf {
        self.root_dir.join("ed25519.priv")
    }

    /// Append-only block log
    pub fn block_file_path(&self) -> PathBuf {
        self.root_dir.join("block.jsonl")
    }

    /// Pending pool snapshot
    pub fn pending_file_path(&self) -> PathBuf {
        self.root_dir.join("pending_transaction.json")
    }

    /// Peer record directory
    pub fn nodes_dir(&self) -> PathBuf {
        self.root_dir.join("nodes")
    }

    /// PID file written by `start`
    pub fn pid_file_path(&self) -> PathBuf {
        self.root_dir.join("signet.pid")
    }
}

/// Parse a flat `Key = value` document.
///
/// Blank lines and `#` comments are skipped; surrounding single or double
/// quotes on values are stripped.
pub fn parse_kv(content: &str) -> Result<HashMap<String, String>> {
    let mut result = HashMap::new();

    for (line_no, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| {
            Error::Config(format!("invalid format at line {}: {}", line_no + 1, line))
        })?;

        let key = key.trim().to_string();
        let mut value = value.trim();
        if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
            || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
        {
            value = &value[1..value.len() - 1];
        }

        result.insert(key, value.to_string());
    }

    Ok(result)
}

/// Split an address into host and port, defaulting the port.
///
/// Accepts `host` or `host:port`; never invents a second port.
pub fn parse_address(addr: &str) -> (String, String) {
    match addr.split_once(':') {
        Some((host, port)) if !port.contains(':') => (host.to_string(), port.to_string()),
        _ => (addr.to_string(), DEFAULT_PORT.to_string()),
    }
}

/// Canonical `host:port` form of an address
pub fn normalize_address(addr: &str) -> String {
    let (host, port) = parse_address(addr);
    format!("{}:{}", host, port)
}
