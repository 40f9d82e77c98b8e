//! Backend over the platform's system certificate stores.

use std::ffi::c_void;

use windows::Win32::Foundation::{BOOL, GetLastError};
use windows::Win32::Security::Cryptography::{
    CERT_ARCHIVED_PROP_ID, CERT_CONTEXT, CERT_FIND_SHA1_HASH, CERT_FRIENDLY_NAME_PROP_ID,
    CERT_KEY_PROV_INFO_PROP_ID, CERT_KEY_SPEC, CERT_NCRYPT_KEY_SPEC, CERT_OPEN_STORE_FLAGS,
    CERT_QUERY_ENCODING_TYPE, CERT_STORE_ADD_REPLACE_EXISTING, CERT_STORE_PROV_SYSTEM_W,
    CERT_SYSTEM_STORE_CURRENT_USER, CERT_SYSTEM_STORE_LOCAL_MACHINE, CRYPT_ACQUIRE_FLAGS,
    CRYPT_INTEGER_BLOB, CRYPT_KEY_FLAGS, CertAddCertificateContextToStore,
    CertAddEncodedCertificateToStore, CertCloseStore, CertDeleteCertificateFromStore,
    CertEnumCertificatesInStore, CertFindCertificateInStore, CertFreeCertificateContext,
    CertGetCertificateContextProperty, CertOpenStore, CryptAcquireCertificatePrivateKey,
    CryptGetProvParam, CryptReleaseContext, HCERTSTORE, HCRYPTPROV_LEGACY, HCRYPTPROV_OR_NCRYPT_KEY_HANDLE,
    PFXImportCertStore, PKCS_7_ASN_ENCODING, X509_ASN_ENCODING,
};
use windows::core::PCWSTR;

use crate::adapters::x509::thumbprint;
use crate::core::errors::{CertStoreError, Result};
use crate::core::models::certificate::StoreEntry;
use crate::core::models::import::{ImportedCertificate, KeyStorageFlags};
use crate::core::models::store_scope::StoreScope;
use crate::core::traits::cert_store::{CertificateStore, StoreLocator};
use crate::core::traits::key_provider::{KeyProvider, ProviderParam};

const CERT_STORE_OPEN_EXISTING_FLAG: u32 = 0x0000_4000;
const CERT_STORE_ENUM_ARCHIVED_FLAG: u32 = 0x0000_0200;

const CRYPT_EXPORTABLE: u32 = 0x0000_0001;
const CRYPT_MACHINE_KEYSET: u32 = 0x0000_0020;
const CRYPT_USER_KEYSET: u32 = 0x0000_1000;
const PKCS12_NO_PERSIST_KEY: u32 = 0x0000_8000;

const CRYPT_ACQUIRE_SILENT_FLAG: u32 = 0x0000_0040;

fn encoding() -> CERT_QUERY_ENCODING_TYPE {
    CERT_QUERY_ENCODING_TYPE(X509_ASN_ENCODING.0 | PKCS_7_ASN_ENCODING.0)
}

fn last_error(what: &str) -> CertStoreError {
    let code = unsafe { GetLastError() };
    CertStoreError::Platform {
        detail: format!("{what}: Windows error 0x{:08X}", code.0),
    }
}

fn wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Translate import flags into `PFXImportCertStore` flags.
fn pfx_import_flags(flags: KeyStorageFlags) -> CRYPT_KEY_FLAGS {
    let mut bits = 0;
    if flags.contains(KeyStorageFlags::EXPORTABLE) {
        bits |= CRYPT_EXPORTABLE;
    }
    if flags.contains(KeyStorageFlags::MACHINE_KEY_SET) {
        bits |= CRYPT_MACHINE_KEYSET;
    }
    if flags.contains(KeyStorageFlags::USER_KEY_SET) {
        bits |= CRYPT_USER_KEYSET;
    }
    if !flags.contains(KeyStorageFlags::PERSIST_KEY_SET) {
        bits |= PKCS12_NO_PERSIST_KEY;
    }
    CRYPT_KEY_FLAGS(bits)
}

/// Opens `LocalMachine\<name>` or `CurrentUser\<name>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeStoreLocator;

impl StoreLocator for NativeStoreLocator {
    type Store = NativeStore;

    fn open(&self, name: &str, scope: StoreScope) -> Result<NativeStore> {
        let location = match scope {
            StoreScope::Machine => CERT_SYSTEM_STORE_LOCAL_MACHINE,
            StoreScope::User => CERT_SYSTEM_STORE_CURRENT_USER,
        };
        let flags = location | CERT_STORE_OPEN_EXISTING_FLAG | CERT_STORE_ENUM_ARCHIVED_FLAG;
        let wide_name = wide(name);

        let handle = unsafe {
            CertOpenStore(
                CERT_STORE_PROV_SYSTEM_W,
                CERT_QUERY_ENCODING_TYPE(0),
                HCRYPTPROV_LEGACY(0),
                CERT_OPEN_STORE_FLAGS(flags),
                Some(wide_name.as_ptr() as *const c_void),
            )
        };

        match handle {
            Ok(handle) if !handle.is_invalid() => Ok(NativeStore {
                name: name.to_string(),
                scope,
                handle,
            }),
            _ => Err(CertStoreError::StoreNotFound {
                store: name.to_string(),
                scope,
            }),
        }
    }
}

/// Temporary store produced by a PFX import.
struct StoreHandle(HCERTSTORE);

impl Drop for StoreHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CertCloseStore(self.0, 0);
        }
    }
}

/// An open system store handle, closed on drop.
pub struct NativeStore {
    name: String,
    scope: StoreScope,
    handle: HCERTSTORE,
}

impl NativeStore {
    /// Find the context for `entry`. The caller frees the returned context.
    fn find_context(&self, entry: &StoreEntry) -> Result<*const CERT_CONTEXT> {
        let mut hash = hex::decode(&entry.thumbprint).map_err(|e| CertStoreError::InvalidSearchKey {
            detail: e.to_string(),
        })?;
        let blob = CRYPT_INTEGER_BLOB {
            cbData: hash.len() as u32,
            pbData: hash.as_mut_ptr(),
        };

        let context = unsafe {
            CertFindCertificateInStore(
                self.handle,
                encoding(),
                0,
                CERT_FIND_SHA1_HASH,
                Some(&blob as *const _ as *const c_void),
                None,
            )
        };
        if context.is_null() {
            return Err(last_error("Certificate lookup failed"));
        }
        Ok(context)
    }

    fn to_entry(context: *const CERT_CONTEXT) -> StoreEntry {
        let der = unsafe {
            let ctx = &*context;
            std::slice::from_raw_parts(ctx.pbCertEncoded, ctx.cbCertEncoded as usize).to_vec()
        };
        StoreEntry {
            thumbprint: thumbprint(&der),
            der,
            friendly_name: friendly_name(context).unwrap_or_default(),
            archived: property(context, CERT_ARCHIVED_PROP_ID).is_some(),
            has_private_key: property(context, CERT_KEY_PROV_INFO_PROP_ID).is_some(),
        }
    }

    /// Import through a temporary in-memory store so the platform
    /// persists the key set according to `flags`.
    fn add_pfx(&mut self, cert: &ImportedCertificate, flags: KeyStorageFlags) -> Result<()> {
        let blob = CRYPT_INTEGER_BLOB {
            cbData: cert.source.len() as u32,
            pbData: cert.source.as_ptr() as *mut u8,
        };
        let password = wide(&cert.password);

        let temp = unsafe {
            PFXImportCertStore(&blob, PCWSTR(password.as_ptr()), pfx_import_flags(flags))
        }
        .map(StoreHandle)
        .map_err(|e| CertStoreError::Platform {
            detail: format!("PFX import failed: {e}"),
        })?;

        let mut added = false;
        let mut context: *mut CERT_CONTEXT = std::ptr::null_mut();
        loop {
            context = unsafe { CertEnumCertificatesInStore(temp.0, Some(context)) };
            if context.is_null() {
                break;
            }
            let der = unsafe {
                let ctx = &*context;
                std::slice::from_raw_parts(ctx.pbCertEncoded, ctx.cbCertEncoded as usize)
            };
            if der == cert.certificate.as_slice() {
                let result = unsafe {
                    CertAddCertificateContextToStore(
                        self.handle,
                        context,
                        CERT_STORE_ADD_REPLACE_EXISTING,
                        None,
                    )
                };
                unsafe {
                    let _ = CertFreeCertificateContext(Some(context));
                }
                result.map_err(|e| CertStoreError::Platform {
                    detail: format!("Adding certificate to {} failed: {e}", self.name),
                })?;
                added = true;
                break;
            }
        }

        if added {
            Ok(())
        } else {
            Err(CertStoreError::Platform {
                detail: "imported bundle did not contain the end-entity certificate".into(),
            })
        }
    }

    fn add_encoded(&mut self, der: &[u8]) -> Result<()> {
        unsafe {
            CertAddEncodedCertificateToStore(
                self.handle,
                X509_ASN_ENCODING,
                der,
                CERT_STORE_ADD_REPLACE_EXISTING,
                None,
            )
        }
        .map_err(|e| CertStoreError::Platform {
            detail: format!("Adding certificate to {} failed: {e}", self.name),
        })
    }
}

impl CertificateStore for NativeStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> StoreScope {
        self.scope
    }

    fn entries(&self) -> Result<Vec<StoreEntry>> {
        let mut entries = Vec::new();
        let mut context: *mut CERT_CONTEXT = std::ptr::null_mut();
        loop {
            context = unsafe { CertEnumCertificatesInStore(self.handle, Some(context)) };
            if context.is_null() {
                break;
            }
            entries.push(Self::to_entry(context));
        }
        Ok(entries)
    }

    fn add(&mut self, cert: &ImportedCertificate, flags: KeyStorageFlags) -> Result<StoreEntry> {
        if cert.private_key.is_some() {
            self.add_pfx(cert, flags)?;
        } else {
            self.add_encoded(&cert.certificate)?;
        }

        let probe = StoreEntry {
            thumbprint: thumbprint(&cert.certificate),
            der: cert.certificate.clone(),
            friendly_name: String::new(),
            archived: false,
            has_private_key: false,
        };
        let context = self.find_context(&probe)?;
        let entry = Self::to_entry(context);
        unsafe {
            let _ = CertFreeCertificateContext(Some(context));
        }
        Ok(entry)
    }

    fn remove(&mut self, entry: &StoreEntry) -> Result<()> {
        let context = self.find_context(entry)?;
        unsafe { CertDeleteCertificateFromStore(context) }.map_err(|e| CertStoreError::Platform {
            detail: format!("Deleting {} failed: {e}", entry.thumbprint),
        })
    }

    fn key_provider(&self, entry: &StoreEntry) -> Option<Box<dyn KeyProvider + '_>> {
        if !entry.has_private_key {
            return None;
        }
        let context = self.find_context(entry).ok()?;

        let mut handle = HCRYPTPROV_OR_NCRYPT_KEY_HANDLE(0);
        let mut key_spec = CERT_KEY_SPEC(0);
        let mut caller_frees = BOOL(0);
        let acquired = unsafe {
            CryptAcquireCertificatePrivateKey(
                context,
                CRYPT_ACQUIRE_FLAGS(CRYPT_ACQUIRE_SILENT_FLAG),
                None,
                &mut handle,
                Some(&mut key_spec),
                Some(&mut caller_frees),
            )
        };
        unsafe {
            let _ = CertFreeCertificateContext(Some(context));
        }

        if let Err(e) = acquired {
            tracing::debug!("Private key of {} not acquired: {e}", entry.thumbprint);
            return None;
        }
        if key_spec == CERT_NCRYPT_KEY_SPEC {
            tracing::debug!("Key of {} is held by a CNG provider", entry.thumbprint);
            return None;
        }

        Some(Box::new(NativeKeyProvider {
            handle: handle.0,
            release: caller_frees.as_bool(),
        }))
    }
}

impl Drop for NativeStore {
    fn drop(&mut self) {
        unsafe {
            let _ = CertCloseStore(self.handle, 0);
        }
    }
}

/// Legacy CryptoAPI provider acquired for one certificate's key.
struct NativeKeyProvider {
    handle: usize,
    release: bool,
}

impl KeyProvider for NativeKeyProvider {
    fn get_param(&self, param: ProviderParam, buf: Option<&mut [u8]>) -> Result<usize> {
        let mut len = buf.as_ref().map_or(0, |b| b.len() as u32);
        let data = buf.map(|b| b.as_mut_ptr());
        unsafe { CryptGetProvParam(self.handle, param.code(), data, &mut len, 0) }.map_err(|e| {
            CertStoreError::Platform {
                detail: format!("CryptGetProvParam({}) failed: {e}", param.code()),
            }
        })?;
        Ok(len as usize)
    }
}

impl Drop for NativeKeyProvider {
    fn drop(&mut self) {
        if self.release {
            unsafe {
                let _ = CryptReleaseContext(self.handle, 0);
            }
        }
    }
}

/// Raw bytes of a context property, if set.
fn property(context: *const CERT_CONTEXT, prop_id: u32) -> Option<Vec<u8>> {
    let mut len = 0u32;
    unsafe { CertGetCertificateContextProperty(context, prop_id, None, &mut len) }.ok()?;
    let mut buf = vec![0u8; len as usize];
    unsafe {
        CertGetCertificateContextProperty(
            context,
            prop_id,
            Some(buf.as_mut_ptr() as *mut c_void),
            &mut len,
        )
    }
    .ok()?;
    buf.truncate(len as usize);
    Some(buf)
}

fn friendly_name(context: *const CERT_CONTEXT) -> Option<String> {
    let bytes = property(context, CERT_FRIENDLY_NAME_PROP_ID)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    Some(String::from_utf16_lossy(&units))
}
