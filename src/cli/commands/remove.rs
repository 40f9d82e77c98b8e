use crate::cli::commands::audit_helpers::{self, AuditTarget};
use crate::cli::context::Context;
use crate::cli::{KeyArgs, OutputFormat, StoreTarget, output};
use crate::core::errors::Result;
use crate::core::models::audit_entry::AuditAction;
use crate::core::models::search_key::SearchKey;
use crate::core::models::store_scope::StoreScope;

/// Execute the `certstore remove` command.
///
/// Removes exactly one certificate. The private key file stays on disk.
pub fn execute(ctx: &Context, key: &KeyArgs, target: &StoreTarget) -> Result<()> {
    let search = SearchKey::from_options(key.thumbprint.as_deref(), key.subject.as_deref())?;
    let scope = StoreScope::from_machine_flag(target.machine);
    let store = ctx.store_name(target.store.as_deref());

    let removed = ctx.service()?.remove(&search, scope, &store)?;

    audit_helpers::log_audit(
        ctx,
        AuditAction::Remove,
        AuditTarget {
            scope,
            store: &store,
            thumbprint: Some(&removed.thumbprint),
            subject: Some(&removed.subject_name),
        },
    );

    match ctx.format {
        OutputFormat::Text => {
            output::success(&format!(
                "Removed {} ({}) from {scope}\\{store}",
                removed.thumbprint, removed.subject_name
            ));
            Ok(())
        }
        OutputFormat::Json => output::json(&serde_json::json!({
            "Thumbprint": removed.thumbprint,
            "SubjectDName": removed.subject_name,
        })),
    }
}
