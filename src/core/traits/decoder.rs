use crate::core::errors::Result;
use crate::core::models::certificate::DecodedCertificate;

/// Port for turning certificate DER into reportable fields.
///
/// The only shipped implementation is `adapters::x509::X509Decoder`.
pub trait CertificateDecoder {
    fn decode(&self, der: &[u8]) -> Result<DecodedCertificate>;
}
