use std::path::{Path, PathBuf};

use crate::core::errors::{CertStoreError, Result};
use crate::core::models::store_scope::StoreScope;
use crate::core::services::key_file_resolver::KeyDirectories;

/// On-disk locations of stores, key containers and certstore's own state.
///
/// Mirrors the platform layout: the machine root plays the role of the
/// all-users application data directory and the user root that of the
/// roaming application data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub machine_data_dir: PathBuf,
    pub user_data_dir: PathBuf,
    pub user_key_dir_name: String,
}

impl StoreLayout {
    pub fn data_dir(&self, scope: StoreScope) -> &Path {
        match scope {
            StoreScope::Machine => &self.machine_data_dir,
            StoreScope::User => &self.user_data_dir,
        }
    }

    /// Directory holding one subdirectory per named store.
    pub fn stores_root(&self, scope: StoreScope) -> PathBuf {
        self.data_dir(scope)
            .join("Microsoft")
            .join("SystemCertificates")
    }

    pub fn machine_key_dir(&self) -> PathBuf {
        self.machine_data_dir
            .join("Microsoft")
            .join("Crypto")
            .join("RSA")
            .join("MachineKeys")
    }

    /// Parent of the per-user key directories.
    pub fn user_key_root(&self) -> PathBuf {
        self.user_data_dir.join("Microsoft").join("Crypto").join("RSA")
    }

    /// Key directory for the current user.
    pub fn user_key_dir(&self) -> PathBuf {
        self.user_key_root().join(&self.user_key_dir_name)
    }

    pub fn key_directories(&self) -> KeyDirectories {
        KeyDirectories {
            machine_keys: self.machine_key_dir(),
            user_key_root: self.user_key_root(),
        }
    }

    /// certstore's own configuration and audit log.
    pub fn state_dir(&self) -> PathBuf {
        self.user_data_dir.join("certstore")
    }
}

/// All-users application data root.
pub fn default_machine_data_dir() -> PathBuf {
    if cfg!(windows) {
        std::env::var_os("ProgramData")
            .or_else(|| std::env::var_os("ALLUSERSPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
    } else {
        PathBuf::from("/var/lib/certstore")
    }
}

/// Current user's application data root.
pub fn default_user_data_dir() -> Result<PathBuf> {
    dirs::data_dir().ok_or_else(|| CertStoreError::InvalidConfig {
        detail: "Cannot determine the user data directory.\n\n  \
                 Pass --user-data-dir or set CERTSTORE_USER_DATA_DIR."
            .into(),
    })
}

/// Name of the current user's key directory under the user key root.
pub fn default_user_key_dir_name() -> String {
    current_user().unwrap_or_else(|| "default".to_string())
}

/// Login name from the environment, if any.
pub fn current_user() -> Option<String> {
    ["USERNAME", "USER"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.trim().is_empty())
}
