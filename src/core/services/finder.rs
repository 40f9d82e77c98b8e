use crate::core::errors::{CertStoreError, Result};
use crate::core::models::certificate::{DecodedCertificate, StoreEntry};
use crate::core::models::search_key::SearchKey;
use crate::core::traits::cert_store::CertificateStore;
use crate::core::traits::decoder::CertificateDecoder;

/// The single certificate a search resolved to.
#[derive(Debug, Clone)]
pub struct FoundCertificate {
    pub entry: StoreEntry,
    pub decoded: DecodedCertificate,
}

/// Locate exactly one certificate in `store`.
///
/// Zero matches is `NotFound`, more than one is `AmbiguousMatch`; the
/// finder never picks between candidates.
pub fn find<S, D>(store: &S, key: &SearchKey, decoder: &D) -> Result<FoundCertificate>
where
    S: CertificateStore + ?Sized,
    D: CertificateDecoder + ?Sized,
{
    let mut matches = match key {
        SearchKey::Thumbprint(thumbprint) => {
            let mut found = Vec::new();
            for entry in store.entries()? {
                if entry.thumbprint.eq_ignore_ascii_case(thumbprint) {
                    let decoded = decoder.decode(&entry.der)?;
                    found.push(FoundCertificate { entry, decoded });
                }
            }
            found
        }
        SearchKey::SubjectName(subject) => {
            let mut found = Vec::new();
            for entry in store.entries()? {
                let decoded = match decoder.decode(&entry.der) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        tracing::warn!(
                            "Skipping undecodable certificate {} in the {} store: {e}",
                            entry.thumbprint,
                            store.name()
                        );
                        continue;
                    }
                };
                if decoded.subject_name == *subject {
                    found.push(FoundCertificate { entry, decoded });
                }
            }
            found
        }
    };

    match matches.len() {
        0 => Err(CertStoreError::NotFound {
            key: key.clone(),
            store: store.name().to_string(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(CertStoreError::AmbiguousMatch {
            key: key.clone(),
            store: store.name().to_string(),
            count,
        }),
    }
}
