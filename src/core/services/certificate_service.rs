use crate::core::errors::Result;
use crate::core::models::certificate::CertificateRecord;
use crate::core::models::import::{ImportRequest, ImportedCertificate};
use crate::core::models::search_key::SearchKey;
use crate::core::models::store_scope::StoreScope;
use crate::core::services::finder;
use crate::core::services::key_file_resolver::KeyFileResolver;
use crate::core::traits::cert_store::{CertificateStore, StoreLocator};
use crate::core::traits::decoder::CertificateDecoder;

/// Identity of a certificate that was added or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateIdentity {
    pub thumbprint: String,
    pub subject_name: String,
}

/// Implements `add`, `remove` and `info` on top of a `StoreLocator`.
///
/// Each operation opens its store, works on it and lets it drop, so the
/// handle is released on success and on every error return alike.
pub struct CertificateService<L: StoreLocator, D: CertificateDecoder> {
    pub locator: L,
    pub decoder: D,
    pub resolver: KeyFileResolver,
}

impl<L: StoreLocator, D: CertificateDecoder> CertificateService<L, D> {
    /// Add an imported certificate to the requested store.
    pub fn add(
        &self,
        request: &ImportRequest,
        cert: &ImportedCertificate,
    ) -> Result<CertificateIdentity> {
        let decoded = self.decoder.decode(&cert.certificate)?;
        let flags = request.key_flags();

        tracing::info!(
            "Adding certificate {} to store {} ({})",
            request.file.display(),
            request.store_name,
            request.scope
        );
        tracing::debug!("Key storage flags: {flags:?}");

        let mut store = self.locator.open(&request.store_name, request.scope)?;
        let entry = store.add(cert, flags)?;
        tracing::debug!(
            "Stored {} in {} ({})",
            entry.thumbprint,
            store.name(),
            store.scope()
        );

        Ok(CertificateIdentity {
            thumbprint: entry.thumbprint,
            subject_name: decoded.subject_name,
        })
    }

    /// Remove the single certificate matching `key`.
    ///
    /// The private key container stays on disk.
    pub fn remove(
        &self,
        key: &SearchKey,
        scope: StoreScope,
        store_name: &str,
    ) -> Result<CertificateIdentity> {
        let mut store = self.locator.open(store_name, scope)?;
        let found = finder::find(&store, key, &self.decoder)?;

        tracing::info!(
            "Removing certificate {} ({}) from {} ({})",
            found.entry.thumbprint,
            found.decoded.subject_name,
            store.name(),
            store.scope()
        );
        store.remove(&found.entry)?;

        Ok(CertificateIdentity {
            thumbprint: found.entry.thumbprint,
            subject_name: found.decoded.subject_name,
        })
    }

    /// Describe the single certificate matching `key`, including the
    /// location of its private key file when it can be found.
    pub fn get_info(
        &self,
        key: &SearchKey,
        scope: StoreScope,
        store_name: &str,
    ) -> Result<CertificateRecord> {
        let store = self.locator.open(store_name, scope)?;
        let found = finder::find(&store, key, &self.decoder)?;

        let mut record = CertificateRecord::assemble(&found.entry, found.decoded);
        let provider = store.key_provider(&found.entry);
        record.private_key_file_name = self.resolver.resolve(provider.as_deref());

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::adapters::x509::X509Decoder;
    use crate::core::errors::CertStoreError;
    use crate::core::models::import::KeyStorageFlags;
    use crate::core::services::key_file_resolver::KeyDirectories;
    use crate::test_support::{self, CountingLocator};

    fn service(locator: CountingLocator) -> CertificateService<CountingLocator, X509Decoder> {
        CertificateService {
            locator,
            decoder: X509Decoder,
            resolver: KeyFileResolver::new(KeyDirectories {
                machine_keys: PathBuf::from("/nonexistent/MachineKeys"),
                user_key_root: PathBuf::from("/nonexistent/RSA"),
            }),
        }
    }

    fn request(exportable: bool) -> ImportRequest {
        ImportRequest {
            file: PathBuf::from("cert.pfx"),
            password: Some("PASSW".into()),
            exportable,
            scope: StoreScope::User,
            store_name: "MY".into(),
        }
    }

    #[test]
    fn add_returns_thumbprint_and_subject() {
        let svc = service(CountingLocator::with_store("MY"));
        let imported = test_support::imported("Agent");

        let identity = svc.add(&request(true), &imported).unwrap();

        assert_eq!(identity.thumbprint.len(), 40);
        assert_eq!(identity.subject_name, "CN=Agent, O=Acme Builds, C=US");
        assert_eq!(svc.locator.balance(), (1, 1));
    }

    #[test]
    fn add_passes_key_flags_through_unmodified() {
        let svc = service(CountingLocator::with_store("MY"));
        let imported = test_support::imported("Agent");

        svc.add(&request(false), &imported).unwrap();

        assert_eq!(
            svc.locator.last_flags(),
            Some(KeyStorageFlags::PERSIST_KEY_SET)
        );
    }

    #[test]
    fn info_after_add_reports_the_certificate() {
        let svc = service(CountingLocator::with_store("MY"));
        let imported = test_support::imported("Agent");
        let identity = svc.add(&request(true), &imported).unwrap();

        let key = SearchKey::thumbprint(&identity.thumbprint.to_lowercase()).unwrap();
        let record = svc.get_info(&key, StoreScope::User, "MY").unwrap();

        assert_eq!(record.thumbprint, identity.thumbprint);
        assert_eq!(record.subject_name, identity.subject_name);
        assert_eq!(record.serial_number, test_support::SERIAL_HEX);
        assert!(record.has_private_key);
        assert!(!record.archived);
        assert_eq!(record.friendly_name, "Agent");
    }

    #[test]
    fn remove_then_info_is_not_found() {
        let svc = service(CountingLocator::with_store("MY"));
        let identity = svc
            .add(&request(true), &test_support::imported("Agent"))
            .unwrap();
        let key = SearchKey::thumbprint(&identity.thumbprint).unwrap();

        svc.remove(&key, StoreScope::User, "MY").unwrap();
        let err = svc.get_info(&key, StoreScope::User, "MY").unwrap_err();

        assert!(matches!(err, CertStoreError::NotFound { .. }));
        assert_eq!(svc.locator.balance(), (3, 3));
    }

    #[test]
    fn ambiguous_subject_is_refused_and_store_closed() {
        let svc = service(CountingLocator::with_store("MY"));
        svc.add(&request(true), &test_support::imported("Twin"))
            .unwrap();
        svc.add(&request(true), &test_support::imported("Twin"))
            .unwrap();

        let key = SearchKey::subject_name("CN=Twin, O=Acme Builds, C=US").unwrap();
        let err = svc.remove(&key, StoreScope::User, "MY").unwrap_err();

        assert!(matches!(err, CertStoreError::AmbiguousMatch { count: 2, .. }));
        assert_eq!(svc.locator.balance(), (3, 3));
        assert_eq!(svc.locator.entry_count(), 2);
    }

    #[test]
    fn unique_thumbprint_selects_only_that_certificate() {
        let svc = service(CountingLocator::with_store("MY"));
        let first = svc
            .add(&request(true), &test_support::imported("Twin"))
            .unwrap();
        let second = svc
            .add(&request(true), &test_support::imported("Twin"))
            .unwrap();

        let key = SearchKey::thumbprint(&second.thumbprint).unwrap();
        let record = svc.get_info(&key, StoreScope::User, "MY").unwrap();

        assert_eq!(record.thumbprint, second.thumbprint);
        assert_ne!(record.thumbprint, first.thumbprint);
    }

    #[test]
    fn missing_certificate_closes_store() {
        let svc = service(CountingLocator::with_store("MY"));
        let key = SearchKey::thumbprint("00112233").unwrap();

        let err = svc.get_info(&key, StoreScope::User, "MY").unwrap_err();

        assert!(matches!(err, CertStoreError::NotFound { .. }));
        assert!(err.to_string().contains("Thumbprint '00112233'"));
        assert_eq!(svc.locator.balance(), (1, 1));
    }

    #[test]
    fn unknown_store_never_opens() {
        let svc = service(CountingLocator::with_store("MY"));
        let key = SearchKey::thumbprint("00").unwrap();

        let err = svc.remove(&key, StoreScope::User, "Root").unwrap_err();

        assert!(matches!(err, CertStoreError::StoreNotFound { .. }));
        assert_eq!(svc.locator.balance(), (0, 0));
    }

    #[test]
    fn info_without_locatable_key_file_still_succeeds() {
        let svc = service(CountingLocator::with_store("MY"));
        let identity = svc
            .add(&request(true), &test_support::imported("Agent"))
            .unwrap();

        let key = SearchKey::thumbprint(&identity.thumbprint).unwrap();
        let record = svc.get_info(&key, StoreScope::User, "MY").unwrap();

        assert!(record.has_private_key);
        assert_eq!(record.private_key_file_name, None);
    }
}
