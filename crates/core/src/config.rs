//! Bucket options and their TOML file
//!
//! Options are stored at `<config dir>/sftpblob/config.toml`. Bump
//! SCHEMA_VERSION only together with a migration for older files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Schema version written by this build
pub const SCHEMA_VERSION: u32 = 1;

/// Page size used when a listing asks for 0 items
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Name of the hidden marker file that keeps a logical directory alive
pub const DEFAULT_PLACEHOLDER: &str = ".newdir";

/// How a listing traverses the remote tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStrategy {
    /// Walk the whole subtree below the scan root, collapsing on the delimiter
    #[default]
    Recursive,
    /// Read a single directory level; directories first
    Flat,
}

/// Options a bucket is opened with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketOptions {
    /// Default number of entries per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Directory placeholder file name
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Listing traversal
    #[serde(default)]
    pub strategy: ListStrategy,

    /// Report placeholder files as objects in listings
    #[serde(default)]
    pub list_placeholders: bool,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl Default for BucketOptions {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            placeholder: default_placeholder(),
            strategy: ListStrategy::default(),
            list_placeholders: false,
        }
    }
}

impl BucketOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholder = name.into();
        self
    }

    pub fn strategy(mut self, strategy: ListStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn list_placeholders(mut self, list: bool) -> Self {
        self.list_placeholders = list;
        self
    }

    /// Check the options before a bucket is opened with them
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".into()));
        }
        if self.placeholder.is_empty()
            || self.placeholder.contains('/')
            || self.placeholder == "."
            || self.placeholder == ".."
        {
            return Err(Error::Config(format!(
                "invalid placeholder name '{}'",
                self.placeholder
            )));
        }
        Ok(())
    }
}

/// Persisted bucket defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bumped on incompatible layout changes
    pub schema_version: u32,

    #[serde(default)]
    pub bucket: BucketOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            bucket: BucketOptions::default(),
        }
    }
}

/// Reads and writes the sftpblob config file
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Use `<config dir>/sftpblob/config.toml`
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("no config directory for this platform".into()))?;
        Ok(Self::with_path(base.join("sftpblob").join("config.toml")))
    }

    /// Use an explicit file path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the config, falling back to defaults when no file exists yet
    pub fn load(&self) -> Result<Config> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&text)?;
        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "schema version {} is newer than supported {}",
                config.schema_version, SCHEMA_VERSION
            )));
        }
        config.bucket.validate()?;
        Ok(config)
    }

    /// Write the config, replacing the old file in one rename.
    ///
    /// On unix the file is readable by its owner only.
    pub fn save(&self, config: &Config) -> Result<()> {
        config.bucket.validate()?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let staged = self.path.with_extension("toml.tmp");
        std::fs::write(&staged, toml::to_string_pretty(config)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&staged, &self.path)?;
        tracing::debug!("saved config to {}", self.path.display());
        Ok(())
    }
}
