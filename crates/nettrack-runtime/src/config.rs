//! Startup configuration: optional TOML file merged with CLI flags.
//!
//! Precedence is CLI flag, then config file, then built-in default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nettrack_core::DebounceConfig;
use nettrack_probe::DEFAULT_SUBNET;
use nettrack_sink::publish::{DEFAULT_BRANCH, DEFAULT_REMOTE};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

pub const DEFAULT_OUTPUT_DIR: &str = "csvs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error(transparent)]
    Debounce(#[from] nettrack_core::ConfigError),
}

// ─── File schema ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// alias -> device identifier
    pub devices: BTreeMap<String, String>,
    pub debounce: DebounceSection,
    pub probe: ProbeSection,
    pub publish: PublishSection,
    pub output: OutputSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebounceSection {
    pub confirm_attempts: Option<u32>,
    pub confirm_interval_secs: Option<u64>,
    pub reconnect_threshold_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSection {
    pub subnet: Option<String>,
    pub nmap_bin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSection {
    pub enabled: Option<bool>,
    pub remote: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}

// ─── Resolved settings ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    pub remote: String,
    pub branch: String,
}

/// Everything the runtime needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub device: String,
    pub alias: String,
    pub debounce: DebounceConfig,
    pub subnet: String,
    pub nmap_bin: String,
    pub output_dir: PathBuf,
    /// `None` when publishing is disabled.
    pub publish: Option<PublishSettings>,
}

impl Settings {
    /// Load the config file named on the command line (if any) and resolve.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match cli.config {
            Some(ref path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let requested = cli.device.trim();
        if requested.is_empty() {
            return Err(ConfigError::Invalid("device identifier is empty".into()));
        }

        // A config alias maps to the real identifier; the alias then names the log.
        let (device, alias_default) = match file.devices.get(requested) {
            Some(id) => (id.clone(), requested.to_string()),
            None => (requested.to_string(), requested.to_string()),
        };
        let alias = cli.alias.clone().unwrap_or(alias_default);
        if alias.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "alias {alias:?} cannot contain path separators"
            )));
        }

        let mut debounce =
            DebounceConfig::default().with_poll_interval(Duration::from_secs(cli.poll_secs));
        if let Some(n) = cli.confirm_attempts.or(file.debounce.confirm_attempts) {
            debounce = debounce.with_confirm_attempts(n);
        }
        if let Some(s) = cli
            .confirm_interval_secs
            .or(file.debounce.confirm_interval_secs)
        {
            debounce = debounce.with_confirm_interval(Duration::from_secs(s));
        }
        if let Some(s) = cli
            .reconnect_threshold_secs
            .or(file.debounce.reconnect_threshold_secs)
        {
            debounce = debounce.with_reconnect_threshold(Duration::from_secs(s));
        }
        debounce.validate()?;

        let publish_enabled = !cli.no_publish && file.publish.enabled.unwrap_or(true);
        let publish = publish_enabled.then(|| PublishSettings {
            remote: cli
                .remote
                .clone()
                .or(file.publish.remote)
                .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            branch: cli
                .branch
                .clone()
                .or(file.publish.branch)
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        });

        Ok(Self {
            device,
            alias,
            debounce,
            subnet: cli
                .subnet
                .clone()
                .or(file.probe.subnet)
                .unwrap_or_else(|| DEFAULT_SUBNET.to_string()),
            nmap_bin: cli
                .nmap_bin
                .clone()
                .or(file.probe.nmap_bin)
                .unwrap_or_else(|| "nmap".to_string()),
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output.dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            publish,
        })
    }
}
