use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::adapters::x509::thumbprint;
use crate::config::layout::StoreLayout;
use crate::core::errors::{CertStoreError, Result};
use crate::core::models::certificate::StoreEntry;
use crate::core::models::import::{ImportedCertificate, KeyStorageFlags};
use crate::core::models::store_scope::StoreScope;
use crate::core::traits::cert_store::{CertificateStore, StoreLocator};
use crate::core::traits::key_provider::{KeyProvider, ProviderParam};

/// Stores `certstore init` provisions in each scope.
pub const STANDARD_STORES: &[&str] = &[
    "My",
    "Root",
    "CA",
    "AuthRoot",
    "TrustedPeople",
    "TrustedPublisher",
    "AddressBook",
    "Disallowed",
];

const CERTIFICATES_DIR: &str = "Certificates";
const LOCK_FILE: &str = ".lock";

/// One certificate entry as persisted under `Certificates/<THUMBPRINT>.json`.
#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    /// Hex-encoded DER.
    certificate: String,
    #[serde(default)]
    friendly_name: String,
    #[serde(default)]
    archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<KeyLink>,
}

/// Reference from a certificate entry to its persisted key container.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyLink {
    container: String,
    scope: StoreScope,
}

/// Contents of a key container file.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    exportable: bool,
    /// Hex-encoded PKCS#8.
    key: String,
}

/// What `provision` did for one scope.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
    pub key_dir: PathBuf,
}

/// Opens stores laid out on disk the way the platform lays out its
/// system certificate registry.
#[derive(Debug, Clone)]
pub struct FileStoreLocator {
    layout: StoreLayout,
}

impl FileStoreLocator {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    #[cfg(test)]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Create the standard stores and the key directory for `scope`.
    /// Stores that already exist, under any casing, are left alone.
    pub fn provision(&self, scope: StoreScope) -> Result<ProvisionReport> {
        let root = self.layout.stores_root(scope);
        fs::create_dir_all(&root)?;

        let mut report = ProvisionReport::default();
        for name in STANDARD_STORES {
            if let Some(existing) = find_store_dir(&root, name)? {
                tracing::debug!("Store {} already exists", existing.display());
                report.existing.push((*name).to_string());
                continue;
            }
            fs::create_dir_all(root.join(name).join(CERTIFICATES_DIR))?;
            tracing::info!("Created store {name} in {scope}");
            report.created.push((*name).to_string());
        }

        report.key_dir = match scope {
            StoreScope::Machine => self.layout.machine_key_dir(),
            StoreScope::User => self.layout.user_key_dir(),
        };
        fs::create_dir_all(&report.key_dir)?;

        Ok(report)
    }
}

impl StoreLocator for FileStoreLocator {
    type Store = FileStore;

    fn open(&self, name: &str, scope: StoreScope) -> Result<FileStore> {
        let root = self.layout.stores_root(scope);
        let dir = find_store_dir(&root, name)?.ok_or_else(|| CertStoreError::StoreNotFound {
            store: name.to_string(),
            scope,
        })?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        lock.lock()?;
        tracing::debug!("Opened store {} ({scope})", dir.display());

        Ok(FileStore {
            name: name.to_string(),
            scope,
            certs_dir: dir.join(CERTIFICATES_DIR),
            machine_key_dir: self.layout.machine_key_dir(),
            user_key_dir: self.layout.user_key_dir(),
            lock,
        })
    }
}

/// Case-insensitive lookup of a store directory under `root`.
fn find_store_dir(root: &Path, name: &str) -> Result<Option<PathBuf>> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Ok(None);
    }
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}

/// An open store directory. Holds an exclusive lock until dropped.
pub struct FileStore {
    name: String,
    scope: StoreScope,
    certs_dir: PathBuf,
    machine_key_dir: PathBuf,
    user_key_dir: PathBuf,
    lock: File,
}

impl FileStore {
    fn entry_path(&self, thumbprint: &str) -> PathBuf {
        self.certs_dir.join(format!("{thumbprint}.json"))
    }

    fn read_entry_file(path: &Path) -> Result<EntryFile> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CertStoreError::DecodeFailure {
            reason: format!("{}: {e}", path.display()),
        })
    }

    fn key_dir(&self, scope: StoreScope) -> &Path {
        match scope {
            StoreScope::Machine => &self.machine_key_dir,
            StoreScope::User => &self.user_key_dir,
        }
    }

    /// Write the key container and return the link to it.
    fn persist_key(&self, pkcs8: &[u8], flags: KeyStorageFlags) -> Result<KeyLink> {
        let scope = if flags.contains(KeyStorageFlags::MACHINE_KEY_SET) {
            StoreScope::Machine
        } else {
            StoreScope::User
        };
        let container = container_for(pkcs8);
        let dir = self.key_dir(scope);
        fs::create_dir_all(dir)?;

        let body = serde_json::to_vec_pretty(&KeyFile {
            exportable: flags.contains(KeyStorageFlags::EXPORTABLE),
            key: hex::encode(pkcs8),
        })
        .map_err(|e| CertStoreError::ImportFailure {
            path: dir.join(&container),
            reason: e.to_string(),
        })?;
        write_atomic(&dir.join(&container), &body, true)?;
        tracing::debug!("Persisted key container {container} in {}", dir.display());

        Ok(KeyLink { container, scope })
    }
}

impl CertificateStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> StoreScope {
        self.scope
    }

    fn entries(&self) -> Result<Vec<StoreEntry>> {
        let listing = match fs::read_dir(&self.certs_dir) {
            Ok(listing) => listing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths: Vec<PathBuf> = listing
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let file = match Self::read_entry_file(&path) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!("Skipping unreadable store entry: {e}");
                    continue;
                }
            };
            let Ok(der) = hex::decode(&file.certificate) else {
                tracing::warn!("Skipping store entry with malformed DER: {}", path.display());
                continue;
            };
            entries.push(StoreEntry {
                thumbprint: thumbprint(&der),
                der,
                friendly_name: file.friendly_name,
                archived: file.archived,
                has_private_key: file.key.is_some(),
            });
        }
        Ok(entries)
    }

    fn add(&mut self, cert: &ImportedCertificate, flags: KeyStorageFlags) -> Result<StoreEntry> {
        let key = match &cert.private_key {
            Some(pkcs8) if flags.contains(KeyStorageFlags::PERSIST_KEY_SET) => {
                Some(self.persist_key(pkcs8, flags)?)
            }
            Some(_) => {
                tracing::warn!("Key set not persisted; the certificate is added without its key");
                None
            }
            None => None,
        };

        let entry = StoreEntry {
            thumbprint: thumbprint(&cert.certificate),
            der: cert.certificate.clone(),
            friendly_name: cert.friendly_name.clone(),
            archived: false,
            has_private_key: key.is_some(),
        };

        let file = EntryFile {
            certificate: hex::encode(&entry.der),
            friendly_name: entry.friendly_name.clone(),
            archived: entry.archived,
            key,
        };
        let body = serde_json::to_vec_pretty(&file).map_err(|e| CertStoreError::ImportFailure {
            path: self.entry_path(&entry.thumbprint),
            reason: e.to_string(),
        })?;

        fs::create_dir_all(&self.certs_dir)?;
        let path = self.entry_path(&entry.thumbprint);
        if path.exists() {
            tracing::info!("Replacing existing certificate {}", entry.thumbprint);
        }
        write_atomic(&path, &body, false)?;

        Ok(entry)
    }

    fn remove(&mut self, entry: &StoreEntry) -> Result<()> {
        let path = self.entry_path(&entry.thumbprint);
        fs::remove_file(&path)?;
        tracing::debug!("Deleted {}", path.display());
        Ok(())
    }

    fn key_provider(&self, entry: &StoreEntry) -> Option<Box<dyn KeyProvider + '_>> {
        if !entry.has_private_key {
            return None;
        }
        match Self::read_entry_file(&self.entry_path(&entry.thumbprint)) {
            Ok(file) => file.key.map(|link| {
                Box::new(FileKeyProvider {
                    container: link.container,
                }) as Box<dyn KeyProvider>
            }),
            Err(e) => {
                tracing::debug!("No key link for {}: {e}", entry.thumbprint);
                None
            }
        }
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.lock.unlock() {
            tracing::debug!("Releasing lock on store {} failed: {e}", self.name);
        }
    }
}

/// Provider view of a key container written by `FileStore`.
#[derive(Debug, Clone)]
pub struct FileKeyProvider {
    container: String,
}

impl FileKeyProvider {
    fn value(&self, param: ProviderParam) -> Vec<u8> {
        match param {
            ProviderParam::UniqueContainer => {
                let mut bytes = self.container.as_bytes().to_vec();
                bytes.push(0);
                bytes
            }
        }
    }
}

impl KeyProvider for FileKeyProvider {
    fn get_param(&self, param: ProviderParam, buf: Option<&mut [u8]>) -> Result<usize> {
        let value = self.value(param);
        match buf {
            None => Ok(value.len()),
            Some(buf) if buf.len() < value.len() => Err(CertStoreError::Platform {
                detail: format!(
                    "provider parameter {} needs {} bytes, got {}",
                    param.code(),
                    value.len(),
                    buf.len()
                ),
            }),
            Some(buf) => {
                buf[..value.len()].copy_from_slice(&value);
                Ok(value.len())
            }
        }
    }
}

/// Container name derived from the key material, so re-importing the same
/// key reuses its container.
fn container_for(pkcs8: &[u8]) -> String {
    let digest = Sha256::digest(pkcs8);
    format!("{}_{}", hex::encode(&digest[..16]), hex::encode(&digest[16..20]))
}

/// Write through a temporary file in the same directory, then rename.
fn write_atomic(path: &Path, body: &[u8], private: bool) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(body)?;
    tmp.as_file().sync_all()?;

    if private {
        restrict_to_owner(tmp.as_file())?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(file: &File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(())
}

// Key directories inherit their ACLs on Windows.
#[cfg(not(unix))]
fn restrict_to_owner(_file: &File) -> Result<()> {
    Ok(())
}
