use crate::core::errors::{CertStoreError, Result};

/// How a single certificate is located in a store.
///
/// Exactly one discriminant is ever active; constructors validate the
/// input so the finder never sees an empty or malformed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKey {
    /// SHA-1 thumbprint, normalized to uppercase hex without separators.
    Thumbprint(String),
    /// Subject distinguished name, matched exactly against the rendered DN.
    SubjectName(String),
}

impl SearchKey {
    /// Build a thumbprint key.
    ///
    /// Whitespace and `:` separators are dropped (thumbprints copied from
    /// certificate viewers carry both); what remains must be hex.
    pub fn thumbprint(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':' && *c != '\u{200e}')
            .collect::<String>()
            .to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(CertStoreError::InvalidSearchKey {
                detail: "thumbprint is empty".into(),
            });
        }

        if let Some(bad) = normalized.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(CertStoreError::InvalidSearchKey {
                detail: format!("thumbprint '{raw}' contains non-hex character '{bad}'"),
            });
        }

        Ok(Self::Thumbprint(normalized))
    }

    /// Build a subject name key. The name is kept verbatim.
    pub fn subject_name(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(CertStoreError::InvalidSearchKey {
                detail: "subject distinguished name is empty".into(),
            });
        }
        Ok(Self::SubjectName(raw.to_string()))
    }

    /// Pick the key from the two mutually exclusive CLI options.
    pub fn from_options(thumbprint: Option<&str>, subject: Option<&str>) -> Result<Self> {
        match (thumbprint, subject) {
            (Some(t), None) => Self::thumbprint(t),
            (None, Some(s)) => Self::subject_name(s),
            (Some(_), Some(_)) => Err(CertStoreError::InvalidSearchKey {
                detail: "supply either a thumbprint or a subject name, not both".into(),
            }),
            (None, None) => Err(CertStoreError::InvalidSearchKey {
                detail: "a thumbprint or a subject name is required".into(),
            }),
        }
    }
}

impl std::fmt::Display for SearchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thumbprint(t) => write!(f, "Thumbprint '{t}'"),
            Self::SubjectName(s) => write!(f, "SubjectDName '{s}'"),
        }
    }
}
