use crate::core::errors::Result;
use crate::core::models::certificate::StoreEntry;
use crate::core::models::import::{ImportedCertificate, KeyStorageFlags};
use crate::core::models::store_scope::StoreScope;
use crate::core::traits::key_provider::KeyProvider;

/// An open, exclusively held certificate store.
///
/// Implementations release the underlying handle in `Drop`, so a store
/// is closed on every exit path of the operation that opened it.
pub trait CertificateStore {
    /// Store name as it was requested.
    fn name(&self) -> &str;

    fn scope(&self) -> StoreScope;

    /// Every certificate currently in the store.
    fn entries(&self) -> Result<Vec<StoreEntry>>;

    /// Add a certificate, persisting its private key according to `flags`.
    /// An entry with the same thumbprint is replaced.
    fn add(&mut self, cert: &ImportedCertificate, flags: KeyStorageFlags) -> Result<StoreEntry>;

    /// Remove the entry. The private key container is left untouched.
    fn remove(&mut self, entry: &StoreEntry) -> Result<()>;

    /// Acquire the provider holding the entry's private key.
    /// `None` when the entry has no usable key.
    fn key_provider(&self, entry: &StoreEntry) -> Option<Box<dyn KeyProvider + '_>>;
}

impl<S: CertificateStore + ?Sized> CertificateStore for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn scope(&self) -> StoreScope {
        (**self).scope()
    }

    fn entries(&self) -> Result<Vec<StoreEntry>> {
        (**self).entries()
    }

    fn add(&mut self, cert: &ImportedCertificate, flags: KeyStorageFlags) -> Result<StoreEntry> {
        (**self).add(cert, flags)
    }

    fn remove(&mut self, entry: &StoreEntry) -> Result<()> {
        (**self).remove(entry)
    }

    fn key_provider(&self, entry: &StoreEntry) -> Option<Box<dyn KeyProvider + '_>> {
        (**self).key_provider(entry)
    }
}

/// Port for opening named stores.
pub trait StoreLocator {
    type Store: CertificateStore;

    /// Open an existing store read-write. Never creates one.
    fn open(&self, name: &str, scope: StoreScope) -> Result<Self::Store>;
}
