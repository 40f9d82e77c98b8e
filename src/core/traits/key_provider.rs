use crate::core::errors::Result;

/// Provider parameters certstore reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderParam {
    /// Unique key container name, NUL terminated.
    UniqueContainer,
}

impl ProviderParam {
    /// Numeric parameter id understood by the platform provider.
    pub fn code(self) -> u32 {
        match self {
            Self::UniqueContainer => 36,
        }
    }
}

/// Port for the cryptographic provider that holds a private key.
///
/// `get_param` follows the platform's size-then-fill convention: with no
/// buffer it reports the size the value needs; with a buffer at least
/// that large it fills it and reports the bytes written. Callers go
/// through [`query_param`] instead.
pub trait KeyProvider {
    fn get_param(&self, param: ProviderParam, buf: Option<&mut [u8]>) -> Result<usize>;
}

/// Read a provider parameter in full.
pub fn query_param(provider: &dyn KeyProvider, param: ProviderParam) -> Result<Vec<u8>> {
    let size = provider.get_param(param, None)?;
    let mut buf = vec![0u8; size];
    let written = provider.get_param(param, Some(&mut buf))?;
    buf.truncate(written);
    Ok(buf)
}

/// Container name from a unique-container value: everything before the
/// trailing NUL.
pub fn container_name(bytes: &[u8]) -> Option<String> {
    let trimmed = match bytes.split_last() {
        Some((0, rest)) => rest,
        _ => bytes,
    };
    if trimmed.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(trimmed).into_owned())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::core::errors::CertStoreError;

    struct FixedProvider {
        value: Vec<u8>,
        calls: Cell<usize>,
    }

    impl KeyProvider for FixedProvider {
        fn get_param(&self, _param: ProviderParam, buf: Option<&mut [u8]>) -> Result<usize> {
            self.calls.set(self.calls.get() + 1);
            match buf {
                None => Ok(self.value.len()),
                Some(buf) if buf.len() < self.value.len() => Err(CertStoreError::Platform {
                    detail: "more data".into(),
                }),
                Some(buf) => {
                    buf[..self.value.len()].copy_from_slice(&self.value);
                    Ok(self.value.len())
                }
            }
        }
    }

    #[test]
    fn query_probes_size_then_fills() {
        let provider = FixedProvider {
            value: b"abc_123\0".to_vec(),
            calls: Cell::new(0),
        };

        let bytes = query_param(&provider, ProviderParam::UniqueContainer).unwrap();

        assert_eq!(bytes, b"abc_123\0");
        assert_eq!(provider.calls.get(), 2);
    }

    #[test]
    fn container_name_strips_trailing_nul() {
        assert_eq!(container_name(b"abc\0").as_deref(), Some("abc"));
        assert_eq!(container_name(b"abc").as_deref(), Some("abc"));
    }

    #[test]
    fn empty_container_is_none() {
        assert_eq!(container_name(b"\0"), None);
        assert_eq!(container_name(b""), None);
    }
}
