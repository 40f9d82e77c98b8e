use chrono::Utc;

use crate::cli::context::Context;
use crate::cli::output;
use crate::config::layout;
use crate::core::models::audit_entry::{AuditAction, AuditEntry};
use crate::core::models::store_scope::StoreScope;
use crate::core::traits::audit::AuditLogger;

/// Login name of whoever ran the command, or `unknown`.
pub fn current_author() -> String {
    layout::current_user().unwrap_or_else(|| "unknown".to_string())
}

/// What a store mutation touched.
pub struct AuditTarget<'a> {
    pub scope: StoreScope,
    pub store: &'a str,
    pub thumbprint: Option<&'a str>,
    pub subject: Option<&'a str>,
}

/// Record an audit event. Warns on failure instead of propagating
/// the error, since the store change has already happened.
pub fn log_audit(ctx: &Context, action: AuditAction, target: AuditTarget<'_>) {
    let Some(logger) = ctx.audit_logger() else {
        return;
    };

    let entry = AuditEntry {
        timestamp: Utc::now(),
        author: current_author(),
        action,
        scope: target.scope,
        store: target.store.to_string(),
        thumbprint: target.thumbprint.map(str::to_string),
        subject: target.subject.map(str::to_string),
    };

    if let Err(e) = logger.log_event(&entry) {
        output::warning(&format!(
            "Could not write audit log {}: {e}",
            logger.path().display()
        ));
    }
}
