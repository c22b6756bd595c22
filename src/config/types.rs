use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub panel: PanelConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Panel connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelConfig {
    /// Base URL of the panel, e.g. "https://panel.example.com"
    pub url: String,

    /// Application API key (server listing, feature limits)
    pub admin_api_key: String,

    /// Client API key (backup listing, create, delete)
    pub client_api_key: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Rotation behavior settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RotationConfig {
    /// What to do when the oldest deletable backup is locked
    #[serde(default)]
    pub on_locked: RotationPolicy,

    /// Simulate all deletions and creations without calling the panel
    #[serde(default)]
    pub dry_run: bool,

    /// Server identifiers to leave alone entirely
    #[serde(default)]
    pub skip_servers: Vec<String>,
}

/// Policy for handling a locked (or otherwise undeletable) eviction candidate
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum RotationPolicy {
    /// Prompt the operator for every locked candidate
    #[default]
    #[serde(rename = "ask")]
    AskEachTime,

    /// Silently move on to the next-oldest candidate
    #[serde(rename = "delete-next")]
    AutoDeleteNext,

    /// Abort rotation for the server; do not create a new backup
    #[serde(rename = "skip")]
    SkipCreation,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_directory: default_log_directory(),
            log_level: default_log_level(),
            log_max_files: default_log_max_files(),
        }
    }
}

// Default value functions

fn default_request_timeout() -> u64 { 30 }
fn default_log_directory() -> PathBuf { PathBuf::from("~/logs") }
fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
