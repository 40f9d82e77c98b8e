pub mod file_store;
#[cfg(windows)]
pub mod native_store;

use crate::config::app_config::BackendKind;
use crate::config::layout::StoreLayout;
use crate::core::errors::{CertStoreError, Result};
use crate::core::models::store_scope::StoreScope;
use crate::core::traits::cert_store::{CertificateStore, StoreLocator};

pub use file_store::{FileStoreLocator, ProvisionReport};

/// The store backend chosen from configuration.
pub enum SelectedLocator {
    File(FileStoreLocator),
    #[cfg(windows)]
    Native(native_store::NativeStoreLocator),
}

impl SelectedLocator {
    pub fn new(kind: BackendKind, layout: StoreLayout) -> Result<Self> {
        match kind {
            BackendKind::File => Ok(Self::File(FileStoreLocator::new(layout))),
            #[cfg(windows)]
            BackendKind::Native => {
                let _ = layout;
                Ok(Self::Native(native_store::NativeStoreLocator))
            }
            #[cfg(not(windows))]
            BackendKind::Native => Err(CertStoreError::UnsupportedBackend {
                backend: kind.to_string(),
            }),
        }
    }

    /// Provision the standard stores. Only the file backend manages its
    /// own stores; the platform provisions system stores itself.
    pub fn provision(&self, scope: StoreScope) -> Result<ProvisionReport> {
        match self {
            Self::File(locator) => locator.provision(scope),
            #[cfg(windows)]
            Self::Native(_) => Err(CertStoreError::UnsupportedBackend {
                backend: format!("{} (init)", BackendKind::Native),
            }),
        }
    }
}

impl StoreLocator for SelectedLocator {
    type Store = Box<dyn CertificateStore>;

    fn open(&self, name: &str, scope: StoreScope) -> Result<Self::Store> {
        match self {
            Self::File(locator) => Ok(Box::new(locator.open(name, scope)?)),
            #[cfg(windows)]
            Self::Native(locator) => Ok(Box::new(locator.open(name, scope)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn layout() -> StoreLayout {
        StoreLayout {
            machine_data_dir: PathBuf::from("/m"),
            user_data_dir: PathBuf::from("/u"),
            user_key_dir_name: "builder".into(),
        }
    }

    #[test]
    fn file_backend_is_always_available() {
        assert!(matches!(
            SelectedLocator::new(BackendKind::File, layout()),
            Ok(SelectedLocator::File(_))
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn native_backend_is_rejected_off_windows() {
        let err = SelectedLocator::new(BackendKind::Native, layout()).err().unwrap();
        assert!(matches!(err, CertStoreError::UnsupportedBackend { .. }));
    }
}
