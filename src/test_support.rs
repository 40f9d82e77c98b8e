//! Certificate and PKCS#12 fixtures shared by unit tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cms::cert::x509::attr::{Attribute, Attributes};
use cms::cert::x509::spki::AlgorithmIdentifierOwned;
use cms::content_info::{CmsVersion, ContentInfo};
use cms::encrypted_data::EncryptedData;
use cms::enveloped_data::EncryptedContentInfo;
use der::asn1::{BmpString, ObjectIdentifier, OctetString, SetOfVec};
use der::{Any, Decode, Encode};
use p12_keystore::{KeyStore, KeyStoreEntry, PrivateKeyChain};
use pkcs12::cert_type::CertBag;
use pkcs12::pbe_params::EncryptedPrivateKeyInfo;
use pkcs12::pfx::{Pfx, Version};
use pkcs12::safe_bag::SafeBag;
use pkcs5::pbes2;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SerialNumber, date_time_ymd};
use zeroize::Zeroizing;

use crate::adapters::pkcs12::cert_bags::{
    CERT_BAG_OID, DATA_OID, ENCRYPTED_DATA_OID, FRIENDLY_NAME_OID, PBES2_OID, X509_CERTIFICATE_OID,
};
use crate::adapters::x509::thumbprint;
use crate::core::errors::{CertStoreError, Result};
use crate::core::models::certificate::StoreEntry;
use crate::core::models::import::{ImportedCertificate, KeyStorageFlags};
use crate::core::models::store_scope::StoreScope;
use crate::core::traits::cert_store::{CertificateStore, StoreLocator};
use crate::core::traits::key_provider::KeyProvider;

pub const SERIAL_HEX: &str = "0A1B2C";

pub struct Fixture {
    pub der: Vec<u8>,
    pub key: Vec<u8>,
}

/// Self-signed ECDSA certificate with subject `C=US, O=Acme Builds, CN={cn}`.
pub fn certificate(cn: &str) -> Fixture {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, "US");
    dn.push(DnType::OrganizationName, "Acme Builds");
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.serial_number = Some(SerialNumber::from_slice(&[0x0A, 0x1B, 0x2C]));
    params.not_before = date_time_ymd(2024, 1, 1);
    params.not_after = date_time_ymd(2034, 1, 1);

    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();

    Fixture {
        der: cert.der().to_vec(),
        key: key.serialize_der(),
    }
}

/// PKCS#12 bundle holding `fixture` under `alias`.
pub fn pfx(fixture: &Fixture, password: &str, alias: &str) -> Vec<u8> {
    let cert = p12_keystore::Certificate::from_der(&fixture.der).unwrap();
    let chain = PrivateKeyChain::new(&fixture.key, [0x01, 0x02, 0x03, 0x04], [cert]);

    let mut keystore = KeyStore::new();
    keystore.add_entry(alias, KeyStoreEntry::PrivateKeyChain(chain));
    keystore.writer(password).write().unwrap()
}

const SHROUDED_KEY_BAG_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.10.1.2");
const LOCAL_KEY_ID_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.21");

/// Shape of a bundle built by `raw_pfx`.
pub struct RawPfx<'a> {
    pub with_key: bool,
    pub friendly_name: Option<&'a str>,
}

/// PKCS#12 bundle laid out the way `openssl pkcs12 -export` writes one:
/// certificate bag in a PBES2-encrypted safe, optional shrouded key bag
/// in a plain safe, no Java trust attribute. Written without a MAC.
pub fn raw_pfx(fixture: &Fixture, shape: RawPfx<'_>, password: &str) -> Vec<u8> {
    let mut attributes = Attributes::new();
    if let Some(name) = shape.friendly_name {
        let value = Any::from_der(&BmpString::from_utf8(name).unwrap().to_der().unwrap()).unwrap();
        attributes
            .insert(Attribute {
                oid: FRIENDLY_NAME_OID,
                values: SetOfVec::from_iter([value]).unwrap(),
            })
            .unwrap();
    }
    if shape.with_key {
        let value = Any::from_der(&OctetString::new(vec![1, 2, 3, 4]).unwrap().to_der().unwrap())
            .unwrap();
        attributes
            .insert(Attribute {
                oid: LOCAL_KEY_ID_OID,
                values: SetOfVec::from_iter([value]).unwrap(),
            })
            .unwrap();
    }
    let attributes = (!attributes.is_empty()).then_some(attributes);

    let salt = [7u8; 16];
    let iv = [9u8; 16];
    let params = pbes2::Parameters::pbkdf2_sha256_aes256cbc(2048, &salt, &iv).unwrap();
    let algorithm = AlgorithmIdentifierOwned {
        oid: PBES2_OID,
        parameters: Some(Any::from_der(&params.to_der().unwrap()).unwrap()),
    };

    let cert_bag = SafeBag {
        bag_id: CERT_BAG_OID,
        bag_value: CertBag {
            cert_id: X509_CERTIFICATE_OID,
            cert_value: OctetString::new(fixture.der.clone()).unwrap(),
        }
        .to_der()
        .unwrap(),
        bag_attributes: attributes.clone(),
    };
    let encrypted = EncryptedData {
        version: CmsVersion::V0,
        enc_content_info: EncryptedContentInfo {
            content_type: DATA_OID,
            content_enc_alg: algorithm.clone(),
            encrypted_content: Some(
                OctetString::new(
                    params
                        .encrypt(password, &vec![cert_bag].to_der().unwrap())
                        .unwrap(),
                )
                .unwrap(),
            ),
        },
        unprotected_attrs: None,
    };
    let mut safes = vec![ContentInfo {
        content_type: ENCRYPTED_DATA_OID,
        content: Any::from_der(&encrypted.to_der().unwrap()).unwrap(),
    }];

    if shape.with_key {
        let key_bag = SafeBag {
            bag_id: SHROUDED_KEY_BAG_OID,
            bag_value: EncryptedPrivateKeyInfo {
                encryption_algorithm: algorithm,
                encrypted_data: OctetString::new(params.encrypt(password, &fixture.key).unwrap())
                    .unwrap(),
            }
            .to_der()
            .unwrap(),
            bag_attributes: attributes,
        };
        safes.push(data_content(&vec![key_bag].to_der().unwrap()));
    }

    Pfx {
        version: Version::V3,
        auth_safe: data_content(&safes.to_der().unwrap()),
        mac_data: None,
    }
    .to_der()
    .unwrap()
}

fn data_content(bytes: &[u8]) -> ContentInfo {
    ContentInfo {
        content_type: DATA_OID,
        content: Any::from_der(&OctetString::new(bytes.to_vec()).unwrap().to_der().unwrap())
            .unwrap(),
    }
}

/// Write a PKCS#12 bundle for a fresh certificate into `dir`.
pub fn write_pfx(dir: &Path, file_name: &str, cn: &str, password: &str) -> (PathBuf, Fixture) {
    let fixture = certificate(cn);
    let path = dir.join(file_name);
    std::fs::write(&path, pfx(&fixture, password, cn)).unwrap();
    (path, fixture)
}

/// An `ImportedCertificate` for a fresh certificate, as `PfxReader` would
/// produce it.
pub fn imported(cn: &str) -> ImportedCertificate {
    let fixture = certificate(cn);
    let source = pfx(&fixture, "PASSW", cn);
    ImportedCertificate {
        certificate: fixture.der,
        private_key: Some(Zeroizing::new(fixture.key)),
        friendly_name: cn.to_string(),
        source: Zeroizing::new(source),
        password: Zeroizing::new("PASSW".to_string()),
    }
}

#[derive(Default)]
struct LocatorState {
    stores: Vec<String>,
    entries: Vec<StoreEntry>,
    opened: usize,
    closed: usize,
    last_flags: Option<KeyStorageFlags>,
}

/// In-memory locator that counts how many stores were opened and closed.
#[derive(Clone, Default)]
pub struct CountingLocator {
    state: Rc<RefCell<LocatorState>>,
}

impl CountingLocator {
    pub fn with_store(name: &str) -> Self {
        let locator = Self::default();
        locator.state.borrow_mut().stores.push(name.to_string());
        locator
    }

    /// `(opened, closed)` so far.
    pub fn balance(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.opened, state.closed)
    }

    pub fn last_flags(&self) -> Option<KeyStorageFlags> {
        self.state.borrow().last_flags
    }

    pub fn entry_count(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Put an entry straight into the store, bypassing `add`.
    pub fn insert(&self, entry: StoreEntry) {
        self.state.borrow_mut().entries.push(entry);
    }
}

impl StoreLocator for CountingLocator {
    type Store = MemoryStore;

    fn open(&self, name: &str, scope: StoreScope) -> Result<MemoryStore> {
        let mut state = self.state.borrow_mut();
        if !state.stores.iter().any(|s| s.eq_ignore_ascii_case(name)) {
            return Err(CertStoreError::StoreNotFound {
                store: name.to_string(),
                scope,
            });
        }
        state.opened += 1;
        Ok(MemoryStore {
            name: name.to_string(),
            scope,
            state: Rc::clone(&self.state),
        })
    }
}

pub struct MemoryStore {
    name: String,
    scope: StoreScope,
    state: Rc<RefCell<LocatorState>>,
}

impl CertificateStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> StoreScope {
        self.scope
    }

    fn entries(&self) -> Result<Vec<StoreEntry>> {
        Ok(self.state.borrow().entries.clone())
    }

    fn add(&mut self, cert: &ImportedCertificate, flags: KeyStorageFlags) -> Result<StoreEntry> {
        let entry = StoreEntry {
            der: cert.certificate.clone(),
            thumbprint: thumbprint(&cert.certificate),
            friendly_name: cert.friendly_name.clone(),
            archived: false,
            has_private_key: cert.private_key.is_some(),
        };
        let mut state = self.state.borrow_mut();
        state.entries.retain(|e| e.thumbprint != entry.thumbprint);
        state.entries.push(entry.clone());
        state.last_flags = Some(flags);
        Ok(entry)
    }

    fn remove(&mut self, entry: &StoreEntry) -> Result<()> {
        self.state
            .borrow_mut()
            .entries
            .retain(|e| e.thumbprint != entry.thumbprint);
        Ok(())
    }

    fn key_provider(&self, _entry: &StoreEntry) -> Option<Box<dyn KeyProvider + '_>> {
        None
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        self.state.borrow_mut().closed += 1;
    }
}
