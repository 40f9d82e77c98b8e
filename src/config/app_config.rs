use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::errors::{CertStoreError, Result};

/// Default store used when `--store` is omitted.
pub const DEFAULT_STORE_NAME: &str = "MY";

/// Name of the configuration file looked up under the state directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level certstore configuration, read from `config.toml`.
///
/// Every section is optional; a missing file is the same as an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub store: StoreSection,
    pub paths: PathsSection,
    pub logging: LoggingSection,
    pub audit: AuditSection,
}

impl AppConfig {
    /// Load and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CertStoreError::InvalidConfig {
                detail: format!("config file {} not found", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| CertStoreError::InvalidConfig {
            detail: format!("Failed to parse {}: {e}", path.display()),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else `{state_dir}/config.toml` if it
    /// exists, else defaults.
    pub fn discover(explicit: Option<&Path>, state_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let implicit = state_dir.join(CONFIG_FILE_NAME);
        if implicit.exists() {
            Self::load(&implicit)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.store.default_name.trim().is_empty() {
            return Err(CertStoreError::InvalidConfig {
                detail: "[store] default_name must not be empty".into(),
            });
        }

        validate_simple_filename(&self.audit.log_file, "audit log file")?;

        if let Some(dir_name) = &self.paths.user_key_dir_name {
            validate_simple_filename(dir_name, "user key directory name")?;
        }

        Ok(())
    }
}

/// The `[store]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub default_name: String,
    /// Backend to use; platform default when absent.
    pub backend: Option<BackendKind>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_STORE_NAME.to_string(),
            backend: None,
        }
    }
}

/// Which certificate store implementation backs the commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Directory-backed store, available everywhere.
    File,
    /// The operating system's CryptoAPI stores (Windows only).
    Native,
}

impl BackendKind {
    pub fn platform_default() -> Self {
        if cfg!(windows) { Self::Native } else { Self::File }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Native => write!(f, "native"),
        }
    }
}

/// The `[paths]` section. Unset fields fall back to platform defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub machine_data_dir: Option<PathBuf>,
    pub user_data_dir: Option<PathBuf>,
    pub user_key_dir_name: Option<String>,
}

/// The `[logging]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// The `[audit]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSection {
    pub enabled: bool,
    pub log_file: String,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: "audit.log".to_string(),
        }
    }
}

/// Reject names that would escape the directory they are joined to.
pub fn validate_simple_filename(name: &str, what: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains("..");

    if bad {
        return Err(CertStoreError::InvalidConfig {
            detail: format!("Invalid {what} '{name}': must be a plain file name"),
        });
    }
    Ok(())
}
