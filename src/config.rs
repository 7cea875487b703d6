//! Configuration loading and management
//!
//! Handles parsing of `taskbuddy.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::task::Priority;

pub const CONFIG_FILENAME: &str = "taskbuddy.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential hashing configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Demo data configuration
    #[serde(default)]
    pub demo: DemoConfig,

    /// Tasks configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// How long a writer waits for another writer's lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Argon2id cost parameters for new credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    argon2::Params::DEFAULT_M_COST
}

fn default_iterations() -> u32 {
    argon2::Params::DEFAULT_T_COST
}

fn default_parallelism() -> u32 {
    argon2::Params::DEFAULT_P_COST
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

/// Demo data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Seed the demo account and tasks whenever the app opens
    #[serde(default = "default_true")]
    pub seed: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { seed: true }
    }
}

/// Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority used when `tb task new` gets no `--priority`
    #[serde(default)]
    pub default_priority: Priority,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: Priority::Medium,
        }
    }
}

impl Config {
    /// Load configuration from a `taskbuddy.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|err| Error::InvalidConfig(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `taskbuddy.toml` from the data directory, or defaults when absent.
    ///
    /// A present but invalid file is an error rather than a silent default.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILENAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.storage.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.auth.iterations == 0 {
            return Err(Error::InvalidConfig(
                "auth.iterations must be > 0".to_string(),
            ));
        }
        if self.auth.parallelism == 0 {
            return Err(Error::InvalidConfig(
                "auth.parallelism must be > 0".to_string(),
            ));
        }
        let min_memory_kib = self.auth.parallelism.checked_mul(8).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "auth.parallelism {} is too large",
                self.auth.parallelism
            ))
        })?;
        if self.auth.memory_kib < min_memory_kib {
            return Err(Error::InvalidConfig(format!(
                "auth.memory_kib must be >= {} for parallelism {}",
                min_memory_kib, self.auth.parallelism
            )));
        }
        Ok(())
    }
}

/// Platform data directory, e.g. `~/.local/share/taskbuddy` on Linux
pub fn default_data_dir() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.data_dir().join("taskbuddy"))
        .ok_or_else(|| {
            Error::InvalidConfig("cannot determine a home directory; pass --data-dir".to_string())
        })
}
