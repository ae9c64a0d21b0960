//! Server configuration and logging setup

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Transport mechanism for the MCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Standard input/output (default)
    Stdio,
    /// Unix domain socket, one connection served at a time
    UnixSocket,
}

impl Default for TransportKind {
    fn default() -> Self {
        Self::Stdio
    }
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "unix_socket" | "unix" => Ok(Self::UnixSocket),
            other => bail!("Unknown transport: {}", other),
        }
    }
}

/// Logging level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => bail!("Unknown log level: {}", other),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Configuration for the MCP server
#[derive(Debug, Clone)]
pub struct Config {
    pub transport: TransportKind,
    /// Only used by [`TransportKind::UnixSocket`]
    pub socket_path: PathBuf,
    pub log_level: LogLevel,
    /// Install the keyboard/mouse hooks at startup instead of on first use
    pub eager_hooks: bool,
    /// How long to wait for a freshly installed OS hook to report failure
    pub hook_probe: Duration,
    /// Minimum delay between installation attempts after a permission failure
    pub permission_retry: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            socket_path: default_socket_path(),
            log_level: LogLevel::default(),
            eager_hooks: false,
            hook_probe: Duration::from_millis(250),
            permission_retry: Duration::from_millis(5000),
        }
    }
}

impl Config {
    /// Build a configuration from `INPUT_MCP_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = var("INPUT_MCP_TRANSPORT") {
            config.transport = value.parse()?;
        }
        if let Some(value) = var("INPUT_MCP_SOCKET") {
            config.socket_path = PathBuf::from(value);
        }
        if let Some(value) = var("INPUT_MCP_LOG") {
            config.log_level = value.parse()?;
        }
        if let Some(value) = var("INPUT_MCP_EAGER_HOOKS") {
            config.eager_hooks = parse_bool(&value)
                .with_context(|| format!("Invalid INPUT_MCP_EAGER_HOOKS: {}", value))?;
        }
        if let Some(value) = var("INPUT_MCP_HOOK_PROBE_MS") {
            config.hook_probe = parse_millis(&value)
                .with_context(|| format!("Invalid INPUT_MCP_HOOK_PROBE_MS: {}", value))?;
        }
        if let Some(value) = var("INPUT_MCP_PERMISSION_RETRY_MS") {
            config.permission_retry = parse_millis(&value)
                .with_context(|| format!("Invalid INPUT_MCP_PERMISSION_RETRY_MS: {}", value))?;
        }

        Ok(config)
    }
}

/// Initialize logging to stderr (ignored if already initialized).
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn default_socket_path() -> PathBuf {
    PathBuf::from(format!("/tmp/input_mcp_{}.sock", std::process::id()))
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {}", other),
    }
}

fn parse_millis(value: &str) -> Result<Duration> {
    let millis: u64 = value.trim().parse()?;
    Ok(Duration::from_millis(millis))
}
