use std::path::Path;

use p12_keystore::{Certificate, KeyStore, KeyStoreEntry};
use x509_parser::prelude::{FromDer, X509Certificate};
use zeroize::Zeroizing;

use crate::adapters::pkcs12::cert_bags::{self, CertificateBag};
use crate::core::errors::{CertStoreError, Result};
use crate::core::models::import::ImportedCertificate;

/// Reads certificate files for `add`.
///
/// PKCS#12 bundles are the primary input. A file that is not a bundle
/// but holds a single DER or PEM certificate is accepted too and yields
/// a certificate without a private key.
pub struct PfxReader;

impl PfxReader {
    pub fn read(path: &Path, password: Option<&str>) -> Result<ImportedCertificate> {
        if !path.is_file() {
            return Err(CertStoreError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let source = Zeroizing::new(std::fs::read(path)?);
        let password = Zeroizing::new(password.unwrap_or_default().to_string());

        match KeyStore::from_pkcs12(&source, &password) {
            Ok(keystore) => {
                let bags = cert_bags::certificate_bags(&source, &password).unwrap_or_else(|e| {
                    tracing::debug!("Cannot read certificate bags of {}: {e}", path.display());
                    Vec::new()
                });
                Self::from_keystore(path, &keystore, &bags, source, password)
            }
            Err(p12_err) => match Self::bare_certificate(&source) {
                Some(certificate) => {
                    tracing::debug!(
                        "{} is not a PKCS#12 bundle, importing it as a bare certificate",
                        path.display()
                    );
                    Ok(ImportedCertificate {
                        certificate,
                        private_key: None,
                        friendly_name: String::new(),
                        source,
                        password,
                    })
                }
                None => Err(CertStoreError::ImportFailure {
                    path: path.to_path_buf(),
                    reason: p12_err.to_string(),
                }),
            },
        }
    }

    fn from_keystore(
        path: &Path,
        keystore: &KeyStore,
        bags: &[CertificateBag],
        source: Zeroizing<Vec<u8>>,
        password: Zeroizing<String>,
    ) -> Result<ImportedCertificate> {
        let mut with_key = None;
        let mut cert_only = None;

        for (alias, entry) in keystore.entries() {
            match entry {
                KeyStoreEntry::PrivateKeyChain(chain) if with_key.is_none() => {
                    with_key = Some((alias.as_str(), chain));
                }
                KeyStoreEntry::Certificate(cert) if cert_only.is_none() => {
                    cert_only = Some((alias.as_str(), cert));
                }
                _ => {}
            }
        }

        if let Some((alias, chain)) = with_key {
            // The entity certificate leads the chain
            let entity = chain
                .chain()
                .first()
                .ok_or_else(|| CertStoreError::ImportFailure {
                    path: path.to_path_buf(),
                    reason: "private key has no associated certificate".into(),
                })?;

            return Ok(ImportedCertificate {
                certificate: entity.as_der().to_vec(),
                private_key: Some(Zeroizing::new(chain.key().to_vec())),
                friendly_name: friendly_name(alias, entity, bags),
                source,
                password,
            });
        }

        if let Some((alias, cert)) = cert_only {
            return Ok(ImportedCertificate {
                certificate: cert.as_der().to_vec(),
                private_key: None,
                friendly_name: friendly_name(alias, cert, bags),
                source,
                password,
            });
        }

        // Key-less certificates without a trust marker never reach the
        // keystore view; take the first bag directly.
        match bags.first() {
            Some(bag) => {
                let cert =
                    Certificate::from_der(&bag.der).map_err(|e| CertStoreError::ImportFailure {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!("{} holds no private key", path.display());
                Ok(ImportedCertificate {
                    certificate: bag.der.clone(),
                    private_key: None,
                    friendly_name: friendly_name("", &cert, bags),
                    source,
                    password,
                })
            }
            None => Err(CertStoreError::ImportFailure {
                path: path.to_path_buf(),
                reason: "bundle contains no readable certificates (certificate safes \
                         encrypted with legacy RC2 or 3DES are not supported)"
                    .into(),
            }),
        }
    }

    /// DER, or the first `CERTIFICATE` block of a PEM file.
    fn bare_certificate(bytes: &[u8]) -> Option<Vec<u8>> {
        if X509Certificate::from_der(bytes).is_ok() {
            return Some(bytes.to_vec());
        }

        let (_, pem) = x509_parser::pem::parse_x509_pem(bytes).ok()?;
        if pem.label != "CERTIFICATE" {
            return None;
        }
        X509Certificate::from_der(&pem.contents).ok()?;
        Some(pem.contents)
    }
}

/// Friendly name for `cert`: the entry alias, else the name on its own
/// certificate bag, else empty.
///
/// A name equal to the subject string counts as absent. The keystore
/// substitutes the subject for a missing alias, and its writer labels
/// chain certificates with their subject.
fn friendly_name(alias: &str, cert: &Certificate, bags: &[CertificateBag]) -> String {
    let bag_name = bags
        .iter()
        .find(|bag| bag.der == cert.as_der())
        .and_then(|bag| bag.friendly_name.as_deref());

    [Some(alias), bag_name]
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty() && *name != cert.subject())
        .unwrap_or_default()
        .to_string()
}
