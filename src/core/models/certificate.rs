use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A certificate as held by a store: raw DER plus store-side properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub der: Vec<u8>,
    /// Uppercase hex SHA-1 of `der`.
    pub thumbprint: String,
    pub friendly_name: String,
    pub archived: bool,
    pub has_private_key: bool,
}

/// Fields decoded from the certificate body itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCertificate {
    pub subject_name: String,
    pub subject_name_oid: String,
    pub issuer_name: String,
    pub serial_number: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub version: u32,
    pub signature_algorithm: String,
}

/// Everything `info` reports about one installed certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CertificateRecord {
    pub subject_name: String,
    pub subject_name_oid_value: String,
    pub serial_number: String,
    pub archived: bool,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub friendly_name: String,
    pub has_private_key: bool,
    pub thumbprint: String,
    pub version: u32,
    pub signature_algorithm: String,
    pub issuer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_file_name: Option<PathBuf>,
}

impl CertificateRecord {
    /// Combine store properties with decoded certificate fields.
    pub fn assemble(entry: &StoreEntry, decoded: DecodedCertificate) -> Self {
        Self {
            subject_name: decoded.subject_name,
            subject_name_oid_value: decoded.subject_name_oid,
            serial_number: decoded.serial_number,
            archived: entry.archived,
            not_before: decoded.not_before,
            not_after: decoded.not_after,
            friendly_name: entry.friendly_name.clone(),
            has_private_key: entry.has_private_key,
            thumbprint: entry.thumbprint.clone(),
            version: decoded.version,
            signature_algorithm: decoded.signature_algorithm,
            issuer_name: decoded.issuer_name,
            private_key_file_name: None,
        }
    }

    /// `(label, value)` pairs in the order `info` prints them.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("SubjectName", self.subject_name.clone()),
            ("SubjectNameOidValue", self.subject_name_oid_value.clone()),
            ("SerialNumber", self.serial_number.clone()),
            ("Archived", self.archived.to_string()),
            ("NotBefore", self.not_before.to_rfc3339()),
            ("NotAfter", self.not_after.to_rfc3339()),
            ("FriendlyName", self.friendly_name.clone()),
            ("HasPrivateKey", self.has_private_key.to_string()),
            ("Thumbprint", self.thumbprint.clone()),
            ("Version", self.version.to_string()),
            ("SignatureAlgorithm", self.signature_algorithm.clone()),
            ("IssuerName", self.issuer_name.clone()),
        ];
        if let Some(path) = &self.private_key_file_name {
            fields.push(("PrivateKeyFileName", path.display().to_string()));
        }
        fields
    }
}
