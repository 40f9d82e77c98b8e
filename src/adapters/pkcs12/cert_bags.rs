//! Certificate bags read straight from a PKCS#12 bundle.
//!
//! The keystore view keeps a key-less certificate only when it carries
//! the Java trust attribute, and names key chains after their subject
//! when no friendly name is present. Import needs the certificates and
//! their own friendly names as written, so they are read here.

use cms::content_info::ContentInfo;
use cms::encrypted_data::EncryptedData;
use der::asn1::{BmpString, ContextSpecific, ObjectIdentifier, OctetString};
use der::{Decode, Encode};
use pkcs12::authenticated_safe::AuthenticatedSafe;
use pkcs12::cert_type::CertBag;
use pkcs12::pfx::Pfx;
use pkcs12::safe_bag::{SafeBag, SafeContents};
use pkcs5::pbes2;

pub(crate) const DATA_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
pub(crate) const ENCRYPTED_DATA_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.6");
pub(crate) const PBES2_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.5.13");
pub(crate) const CERT_BAG_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.10.1.3");
pub(crate) const X509_CERTIFICATE_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.22.1");
pub(crate) const FRIENDLY_NAME_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.20");

/// One X.509 certificate bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBag {
    pub der: Vec<u8>,
    /// `None` when the bag has no friendlyName attribute.
    pub friendly_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BagError {
    #[error("malformed PKCS#12 structure: {0}")]
    Malformed(#[from] der::Error),

    #[error("cannot decrypt certificate safe: {0}")]
    Decrypt(pkcs5::Error),
}

/// Every certificate bag in the bundle, in file order.
///
/// Safes encrypted with anything but PBES2 are skipped, so bundles
/// written with legacy RC2 or 3DES encryption may yield fewer bags than
/// they hold. The bundle's MAC is not checked here.
pub fn certificate_bags(source: &[u8], password: &str) -> Result<Vec<CertificateBag>, BagError> {
    let pfx = Pfx::from_der(source)?;
    if pfx.auth_safe.content_type != DATA_OID {
        return Ok(Vec::new());
    }
    let safes = AuthenticatedSafe::from_der(&octets(&pfx.auth_safe)?)?;

    let mut bags = Vec::new();
    for safe in &safes {
        let contents = match safe.content_type {
            DATA_OID => octets(safe)?,
            ENCRYPTED_DATA_OID => match decrypt_safe(safe, password)? {
                Some(plain) => plain,
                None => continue,
            },
            other => {
                tracing::debug!("Skipping PKCS#12 safe of content type {other}");
                continue;
            }
        };

        for bag in SafeContents::from_der(&contents)? {
            if let Some(cert) = certificate_bag(&bag)? {
                bags.push(cert);
            }
        }
    }
    Ok(bags)
}

fn octets(info: &ContentInfo) -> Result<Vec<u8>, BagError> {
    Ok(OctetString::from_der(&info.content.to_der()?)?.into_bytes())
}

fn decrypt_safe(safe: &ContentInfo, password: &str) -> Result<Option<Vec<u8>>, BagError> {
    let encrypted = EncryptedData::from_der(&safe.content.to_der()?)?;
    let info = &encrypted.enc_content_info;
    let Some(ciphertext) = info.encrypted_content.as_ref() else {
        return Ok(None);
    };

    let algorithm = &info.content_enc_alg;
    let params = match (algorithm.oid, algorithm.parameters.as_ref()) {
        (PBES2_OID, Some(params)) => params.to_der()?,
        (oid, _) => {
            tracing::debug!("Skipping certificate safe encrypted with {oid}");
            return Ok(None);
        }
    };
    let params = pbes2::Parameters::from_der(&params)?;

    params
        .decrypt(password.as_bytes(), ciphertext.as_bytes())
        .map(Some)
        .map_err(BagError::Decrypt)
}

fn certificate_bag(bag: &SafeBag) -> Result<Option<CertificateBag>, BagError> {
    if bag.bag_id != CERT_BAG_OID {
        return Ok(None);
    }
    let value: ContextSpecific<CertBag> = ContextSpecific::from_der(&bag.bag_value)?;
    if value.value.cert_id != X509_CERTIFICATE_OID {
        return Ok(None);
    }

    Ok(Some(CertificateBag {
        der: value.value.cert_value.as_bytes().to_vec(),
        friendly_name: friendly_name(bag),
    }))
}

fn friendly_name(bag: &SafeBag) -> Option<String> {
    let attribute = bag
        .bag_attributes
        .as_ref()?
        .iter()
        .find(|attribute| attribute.oid == FRIENDLY_NAME_OID)?;
    let value = attribute.values.iter().next()?.to_der().ok()?;
    let name = BmpString::from_der(&value).ok()?.to_string();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, RawPfx};

    #[test]
    fn reads_bags_from_encrypted_safe() {
        let fixture = test_support::certificate("Loose");
        let source = test_support::raw_pfx(
            &fixture,
            RawPfx {
                with_key: false,
                friendly_name: Some("loose cert"),
            },
            "PASSW",
        );

        let bags = certificate_bags(&source, "PASSW").unwrap();

        assert_eq!(
            bags,
            vec![CertificateBag {
                der: fixture.der,
                friendly_name: Some("loose cert".into()),
            }]
        );
    }

    #[test]
    fn bag_without_friendly_name_reports_none() {
        let fixture = test_support::certificate("Nameless");
        let source = test_support::raw_pfx(
            &fixture,
            RawPfx {
                with_key: true,
                friendly_name: None,
            },
            "PASSW",
        );

        let bags = certificate_bags(&source, "PASSW").unwrap();

        assert_eq!(bags.len(), 1);
        assert_eq!(bags[0].friendly_name, None);
    }

    #[test]
    fn wrong_password_fails_to_decrypt() {
        let fixture = test_support::certificate("Locked");
        let source = test_support::raw_pfx(
            &fixture,
            RawPfx {
                with_key: false,
                friendly_name: None,
            },
            "PASSW",
        );

        let err = certificate_bags(&source, "wrong").unwrap_err();
        assert!(matches!(err, BagError::Decrypt(_) | BagError::Malformed(_)));
    }

    #[test]
    fn keystore_written_bundle_is_readable() {
        let fixture = test_support::certificate("Agent");
        let source = test_support::pfx(&fixture, "PASSW", "agent alias");

        let bags = certificate_bags(&source, "PASSW").unwrap();

        // The keystore writer names chain certificates after their subject
        // and keeps the alias on the key bag.
        let subject = p12_keystore::Certificate::from_der(&fixture.der).unwrap();
        assert_eq!(bags.len(), 1);
        assert_eq!(bags[0].der, fixture.der);
        assert_eq!(bags[0].friendly_name.as_deref(), Some(subject.subject()));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = certificate_bags(b"not der at all", "PASSW").unwrap_err();
        assert!(matches!(err, BagError::Malformed(_)));
    }
}
