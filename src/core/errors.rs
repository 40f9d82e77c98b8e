use std::path::PathBuf;

use crate::core::models::search_key::SearchKey;
use crate::core::models::store_scope::StoreScope;

/// All domain errors for certstore.
///
/// Each variant names the key, store or file involved so a failing
/// build log is enough to diagnose the problem.
#[derive(Debug, thiserror::Error)]
pub enum CertStoreError {
    #[error(
        "Store '{store}' not found in {scope}\n\n  \
         Stores are never created implicitly.\n  \
         Run 'certstore init' to provision the standard stores, or check the --store name."
    )]
    StoreNotFound { store: String, scope: StoreScope },

    #[error("No certificates with {key} found in the {store} store.")]
    NotFound { key: SearchKey, store: String },

    #[error(
        "More than one certificate with {key} found in the {store} store ({count} matches).\n\n  \
         Supply --thumbprint instead to select a single certificate."
    )]
    AmbiguousMatch {
        key: SearchKey,
        store: String,
        count: usize,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unable to locate private key file for container '{container}'")]
    KeyFileNotLocated { container: String },

    #[error(
        "Import failed for {path}: {reason}\n\n  \
         Check that the file is a PKCS#12 bundle or X.509 certificate\n  \
         and that the password is correct."
    )]
    ImportFailure { path: PathBuf, reason: String },

    #[error("Invalid search key: {detail}")]
    InvalidSearchKey { detail: String },

    #[error("Could not decode certificate: {reason}")]
    DecodeFailure { reason: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(
        "Store backend '{backend}' is not available on this platform\n\n  \
         Set [store] backend = \"file\" in the configuration."
    )]
    UnsupportedBackend { backend: String },

    #[error("Platform certificate API failed: {detail}")]
    Platform { detail: String },

    #[error("Audit log error: {detail}")]
    AuditError { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CertStoreError>;
