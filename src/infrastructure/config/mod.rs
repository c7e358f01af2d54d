use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::error::{AppError, Result};
use crate::domain::loc::{FormatConfig, PriorityRule};
use crate::infrastructure::storage::WriteOptions;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "lockit.toml";

/// `LOCKIT_FORMAT__COLUMNS=20` sets `format.columns`
pub const ENV_PREFIX: &str = "LOCKIT_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub format: FormatConfig,
    pub backup: BackupConfig,
    pub dedupe: DedupeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Copy each file aside before rewriting it
    pub enabled: bool,

    /// Collect backups here instead of next to the originals
    pub dir: Option<PathBuf>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    pub priority: PriorityRule,

    /// Replace removed lines with a `# KEY removed ...` comment instead of deleting them
    pub annotate_removed: bool,

    /// Also drop repeated keys when running `fix`
    pub within_file_on_fix: bool,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            priority: PriorityRule::LastLoadedWins,
            annotate_removed: true,
            within_file_on_fix: false,
        }
    }
}

impl AppConfig {
    /// Layer defaults, the TOML file, then `LOCKIT_*` variables.
    ///
    /// An explicit `config_path` must exist; the default file is optional.
    pub fn figment(config_path: Option<&Path>) -> Result<Figment> {
        let toml = match config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(AppError::NotFound(format!(
                        "Config file does not exist: {}",
                        path.display()
                    )));
                }
                Toml::file(path)
            }
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };

        Ok(Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(toml)
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(config_path)?)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        self.format.check()?;
        if let Some(dir) = &self.backup.dir {
            if dir.as_os_str().is_empty() {
                return Err(AppError::ConfigError(
                    "Invalid [backup] section: dir must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Disk behaviour for a rewrite, with command line overrides applied
    pub fn write_options(&self, dry_run: bool, no_backup: bool) -> WriteOptions {
        WriteOptions {
            dry_run,
            backup: self.backup.enabled && !no_backup,
            backup_dir: self.backup.dir.clone(),
        }
    }
}
