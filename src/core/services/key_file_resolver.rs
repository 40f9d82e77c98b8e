use std::path::PathBuf;

use crate::core::errors::CertStoreError;
use crate::core::traits::key_provider::{KeyProvider, ProviderParam, container_name, query_param};

/// The two roots private key containers are persisted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDirectories {
    /// Machine-wide key directory, probed directly.
    pub machine_keys: PathBuf,
    /// Parent of the per-user key directories, each probed in turn.
    pub user_key_root: PathBuf,
}

/// Maps a certificate's private key to the file its container lives in.
///
/// The crypto provider only reports a container name; the file has to be
/// found by probing the key directories. The machine directory always
/// wins over user directories.
#[derive(Debug, Clone)]
pub struct KeyFileResolver {
    dirs: KeyDirectories,
}

impl KeyFileResolver {
    pub fn new(dirs: KeyDirectories) -> Self {
        Self { dirs }
    }

    /// Full path of the key file behind `provider`, if one can be found.
    ///
    /// A missing provider, a failed parameter query or an unlocatable file
    /// all yield `None`; only the last is worth a warning.
    pub fn resolve(&self, provider: Option<&dyn KeyProvider>) -> Option<PathBuf> {
        let provider = provider?;

        let bytes = match query_param(provider, ProviderParam::UniqueContainer) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Unique container query failed: {e}");
                return None;
            }
        };

        let container = container_name(&bytes)?;
        let found = self.locate(&container);
        if found.is_none() {
            tracing::warn!("{}", CertStoreError::KeyFileNotLocated { container });
        }
        found
    }

    /// Probe the machine directory, then each user directory in name order.
    pub fn locate(&self, container: &str) -> Option<PathBuf> {
        if container.contains(['/', '\\']) || container.contains("..") {
            tracing::warn!("Ignoring key container name with path components: {container}");
            return None;
        }

        let machine_candidate = self.dirs.machine_keys.join(container);
        tracing::debug!("Probing {}", machine_candidate.display());
        if machine_candidate.is_file() {
            return Some(machine_candidate);
        }

        let mut user_dirs: Vec<PathBuf> = match std::fs::read_dir(&self.dirs.user_key_root) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect(),
            Err(e) => {
                tracing::debug!(
                    "Cannot list user key root {}: {e}",
                    self.dirs.user_key_root.display()
                );
                Vec::new()
            }
        };
        user_dirs.sort();

        user_dirs
            .into_iter()
            .map(|dir| dir.join(container))
            .inspect(|candidate| tracing::debug!("Probing {}", candidate.display()))
            .find(|candidate| candidate.is_file())
    }
}
