use crate::cli::commands::audit_helpers::{self, AuditTarget};
use crate::cli::context::Context;
use crate::cli::{OutputFormat, output};
use crate::core::errors::Result;
use crate::core::models::audit_entry::AuditAction;
use crate::core::models::store_scope::StoreScope;

/// Execute the `certstore init` command.
///
/// Creates the standard stores and the key directory for one scope.
/// Safe to re-run: existing stores are left untouched.
pub fn execute(ctx: &Context, machine: bool, verbose: bool) -> Result<()> {
    let scope = StoreScope::from_machine_flag(machine);
    let report = ctx.locator()?.provision(scope)?;

    for name in &report.created {
        audit_helpers::log_audit(
            ctx,
            AuditAction::Init,
            AuditTarget {
                scope,
                store: name,
                thumbprint: None,
                subject: None,
            },
        );
    }

    if ctx.format == OutputFormat::Json {
        return output::json(&serde_json::json!({
            "Scope": scope.to_string(),
            "Created": report.created,
            "Existing": report.existing,
            "KeyDirectory": report.key_dir,
        }));
    }

    output::header(&format!("certstore: provisioning {scope}"));
    for name in &report.created {
        output::success(&format!("Created store {name}"));
    }
    if report.created.is_empty() {
        output::success("All standard stores already exist");
    } else if verbose {
        for name in &report.existing {
            output::success(&format!("Store {name} already exists"));
        }
    }
    output::success(&format!("Key directory: {}", report.key_dir.display()));

    if verbose {
        eprintln!();
        eprintln!("  Layout:");
        eprintln!(
            "     {}   certificate stores",
            ctx.layout.stores_root(scope).display()
        );
        eprintln!(
            "     {}   certstore state and audit log",
            ctx.layout.state_dir().display()
        );
    }

    Ok(())
}
