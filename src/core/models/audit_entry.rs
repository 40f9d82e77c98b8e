use serde::{Deserialize, Serialize};

use crate::core::models::store_scope::StoreScope;

/// Store mutations that get recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Init,
    Add,
    Remove,
}

/// A single entry in the audit log (JSON lines format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub author: String,
    pub action: AuditAction,
    pub scope: StoreScope,
    pub store: String,
    pub thumbprint: Option<String>,
    pub subject: Option<String>,
}
