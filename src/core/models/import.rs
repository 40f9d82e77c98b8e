use std::path::PathBuf;

use bitflags::bitflags;
use zeroize::Zeroizing;

use crate::core::models::store_scope::StoreScope;

bitflags! {
    /// Key persistence options applied when a bundle is imported.
    ///
    /// Bit values match the platform's X509 key-storage flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyStorageFlags: u32 {
        const USER_KEY_SET = 0x01;
        const MACHINE_KEY_SET = 0x02;
        const EXPORTABLE = 0x04;
        const PERSIST_KEY_SET = 0x10;
    }
}

impl KeyStorageFlags {
    /// Flags used by `add`: machine key set for machine scope, always
    /// persisted, exportable only on request.
    pub fn for_import(scope: StoreScope, exportable: bool) -> Self {
        let mut flags = match scope {
            StoreScope::Machine => Self::MACHINE_KEY_SET,
            StoreScope::User => Self::empty(),
        };
        if exportable {
            flags |= Self::EXPORTABLE;
        }
        flags | Self::PERSIST_KEY_SET
    }
}

/// Parameters of one `add` invocation.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file: PathBuf,
    pub password: Option<String>,
    pub exportable: bool,
    pub scope: StoreScope,
    pub store_name: String,
}

impl ImportRequest {
    pub fn key_flags(&self) -> KeyStorageFlags {
        KeyStorageFlags::for_import(self.scope, self.exportable)
    }
}

/// A certificate read from disk, ready to be added to a store.
pub struct ImportedCertificate {
    /// DER of the end-entity certificate.
    pub certificate: Vec<u8>,
    /// PKCS#8 private key, when the bundle carried one.
    pub private_key: Option<Zeroizing<Vec<u8>>>,
    /// Friendly name taken from the bundle's alias; empty when absent.
    pub friendly_name: String,
    /// Original file contents, for backends that re-import natively.
    pub source: Zeroizing<Vec<u8>>,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for ImportedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportedCertificate")
            .field("certificate_len", &self.certificate.len())
            .field("has_private_key", &self.private_key.is_some())
            .field("friendly_name", &self.friendly_name)
            .finish_non_exhaustive()
    }
}
