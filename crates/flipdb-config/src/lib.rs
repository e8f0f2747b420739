pub mod error;

pub use error::*;

use flipdb_core::DeploySettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "FLIPDB_CONFIG_PATH";
pub const BUCKET_ENV: &str = "AWS_S3_BUCKET_NAME";
pub const REGION_ENV: &str = "AWS_REGION";
pub const POLL_INTERVAL_ENV: &str = "FLIPDB_POLL_INTERVAL_SECS";
pub const PROVISION_TIMEOUT_ENV: &str = "FLIPDB_PROVISION_TIMEOUT_SECS";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_PROVISION_TIMEOUT_SECS: u64 = 60 * 60;

/// Runtime settings shared by every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Bucket holding one descriptor object per deployment
    pub bucket: String,
    /// AWS region; the SDK's own resolution applies when unset
    pub region: Option<String>,
    pub poll_interval: Duration,
    pub provision_timeout: Duration,
    /// Prepended to `<name>.yml` when building descriptor keys
    pub key_prefix: String,
}

/// On-disk form; every field optional so env can fill the gaps
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
struct FileSettings {
    bucket: Option<String>,
    region: Option<String>,
    poll_interval_secs: Option<u64>,
    provision_timeout_secs: Option<u64>,
    key_prefix: Option<String>,
}

impl Settings {
    /// Resolve settings from defaults, the config file and the environment,
    /// in increasing order of precedence
    pub fn load() -> Result<Self> {
        let file = match find_config_file()? {
            Some(path) => {
                tracing::debug!("Reading settings from {}", path.display());
                read_file(&path)?
            }
            None => FileSettings::default(),
        };
        Self::resolve(file)
    }

    /// Like [`Settings::load`] but with an explicit config file
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::resolve(read_file(path)?)
    }

    fn resolve(file: FileSettings) -> Result<Self> {
        let bucket = env_var(BUCKET_ENV)
            .or(file.bucket)
            .filter(|b| !b.trim().is_empty())
            .ok_or(ConfigError::MissingBucket)?;

        let region = env_var(REGION_ENV).or(file.region);

        let poll_secs = match env_var(POLL_INTERVAL_ENV) {
            Some(value) => parse_secs(POLL_INTERVAL_ENV, &value)?,
            None => file.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        };
        let timeout_secs = match env_var(PROVISION_TIMEOUT_ENV) {
            Some(value) => parse_secs(PROVISION_TIMEOUT_ENV, &value)?,
            None => file
                .provision_timeout_secs
                .unwrap_or(DEFAULT_PROVISION_TIMEOUT_SECS),
        };

        if poll_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "poll interval".to_string(),
                value: "0".to_string(),
                reason: "must be at least one second".to_string(),
            });
        }

        Ok(Self {
            bucket,
            region,
            poll_interval: Duration::from_secs(poll_secs),
            provision_timeout: Duration::from_secs(timeout_secs),
            key_prefix: file.key_prefix.unwrap_or_default(),
        })
    }

    pub fn to_deploy_settings(&self) -> DeploySettings {
        DeploySettings {
            poll_interval: self.poll_interval,
            provision_timeout: self.provision_timeout,
        }
    }
}

/// Locate the settings file
///
/// Search order:
/// 1. `FLIPDB_CONFIG_PATH` (must exist when set)
/// 2. `./flipdb.yaml`
/// 3. `~/.config/flipdb/config.yaml`
///
/// Having no file at all is fine; the environment alone can configure flipdb.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Some(config_path) = env_var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigFileNotFound(path));
    }

    let local = std::env::current_dir()?.join("flipdb.yaml");
    if local.exists() {
        return Ok(Some(local));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("flipdb").join("config.yaml");
        if global.exists() {
            return Ok(Some(global));
        }
    }

    Ok(None)
}

fn read_file(path: &Path) -> Result<FileSettings> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(FileSettings::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_secs(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
