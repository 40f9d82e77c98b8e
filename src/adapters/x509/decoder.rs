use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::time::ASN1Time;

use crate::adapters::x509::names;
use crate::core::errors::{CertStoreError, Result};
use crate::core::models::certificate::DecodedCertificate;
use crate::core::traits::decoder::CertificateDecoder;

/// Uppercase hex SHA-1 over the certificate DER: the store-unique identifier.
pub fn thumbprint(der: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(der))
}

/// `CertificateDecoder` backed by `x509-parser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct X509Decoder;

impl CertificateDecoder for X509Decoder {
    fn decode(&self, der: &[u8]) -> Result<DecodedCertificate> {
        let (_, cert) =
            X509Certificate::from_der(der).map_err(|e| CertStoreError::DecodeFailure {
                reason: e.to_string(),
            })?;

        let validity = cert.validity();

        Ok(DecodedCertificate {
            subject_name: names::render_name(cert.subject()),
            subject_name_oid: names::leading_attribute_oid(cert.subject()),
            issuer_name: names::render_name(cert.issuer()),
            serial_number: hex::encode_upper(cert.raw_serial()),
            not_before: to_utc(&validity.not_before)?,
            not_after: to_utc(&validity.not_after)?,
            version: cert.version().0 + 1,
            signature_algorithm: names::signature_algorithm_name(
                &cert.signature_algorithm.algorithm.to_id_string(),
            ),
        })
    }
}

fn to_utc(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0).ok_or_else(|| CertStoreError::DecodeFailure {
        reason: format!("validity time {time} is out of range"),
    })
}
