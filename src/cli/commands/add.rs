use std::path::Path;

use serde::Serialize;

use crate::adapters::pkcs12::PfxReader;
use crate::cli::commands::audit_helpers::{self, AuditTarget};
use crate::cli::context::Context;
use crate::cli::{OutputFormat, StoreTarget, output};
use crate::core::errors::Result;
use crate::core::models::audit_entry::AuditAction;
use crate::core::models::import::ImportRequest;
use crate::core::models::store_scope::StoreScope;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AddOutput<'a> {
    thumbprint: &'a str,
    subject_d_name: &'a str,
}

/// Execute the `certstore add` command.
///
/// Imports the certificate and its private key into the target store
/// and prints the thumbprint and subject of what was added.
pub fn execute(
    ctx: &Context,
    file: &Path,
    password: Option<&str>,
    exportable: bool,
    target: &StoreTarget,
) -> Result<()> {
    let request = ImportRequest {
        file: file.to_path_buf(),
        password: password.map(str::to_string),
        exportable,
        scope: StoreScope::from_machine_flag(target.machine),
        store_name: ctx.store_name(target.store.as_deref()),
    };

    let imported = PfxReader::read(&request.file, request.password.as_deref())?;
    let identity = ctx.service()?.add(&request, &imported)?;

    audit_helpers::log_audit(
        ctx,
        AuditAction::Add,
        AuditTarget {
            scope: request.scope,
            store: &request.store_name,
            thumbprint: Some(&identity.thumbprint),
            subject: Some(&identity.subject_name),
        },
    );

    match ctx.format {
        OutputFormat::Text => {
            output::fields(&[
                ("Thumbprint", identity.thumbprint.clone()),
                ("SubjectDName", identity.subject_name.clone()),
            ]);
            output::success(&format!(
                "Added to {}\\{}",
                request.scope, request.store_name
            ));
            Ok(())
        }
        OutputFormat::Json => output::json(&AddOutput {
            thumbprint: &identity.thumbprint,
            subject_d_name: &identity.subject_name,
        }),
    }
}
