use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use colored::Colorize;

use crate::cli::context::Context;
use crate::cli::{OutputFormat, output};
use crate::core::errors::{CertStoreError, Result};
use crate::core::models::audit_entry::{AuditAction, AuditEntry};
use crate::core::traits::audit::AuditLogger;

/// Execute the `certstore history` command.
///
/// Displays the audit log, oldest first, with optional filters for
/// store, date and entry count.
pub fn execute(
    ctx: &Context,
    store: Option<&str>,
    since: Option<&str>,
    last: Option<usize>,
) -> Result<()> {
    let Some(logger) = ctx.audit_logger() else {
        return Err(CertStoreError::InvalidConfig {
            detail: "Audit logging is disabled ([audit] enabled = false)".into(),
        });
    };

    let since_dt = since.map(parse_since).transpose()?;
    let entries = logger.query(store, since_dt)?;

    // Apply --last N (take from the end)
    let skip = last.map_or(0, |n| entries.len().saturating_sub(n));
    let display = &entries[skip..];

    if ctx.format == OutputFormat::Json {
        return output::json(&display);
    }

    if display.is_empty() {
        output::header("certstore history");
        output::warning("No audit entries found");
        if store.is_some() || since.is_some() {
            eprintln!("  Try removing filters to see all entries.");
        }
        return Ok(());
    }

    output::header(&format!("certstore history ({} entries)", display.len()));
    for entry in display {
        print_entry(entry);
    }

    Ok(())
}

/// Parse a date string (ISO 8601: `YYYY-MM-DD`) into a UTC DateTime.
fn parse_since(s: &str) -> Result<chrono::DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CertStoreError::InvalidConfig {
            detail: format!(
                "Invalid date format: '{s}'. Expected ISO 8601 (YYYY-MM-DD), e.g. 2026-01-15"
            ),
        })
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

/// Print a single audit entry as a formatted row.
fn print_entry(entry: &AuditEntry) {
    let date = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    let location = format!("{}\\{}", entry.scope, entry.store);
    let thumbprint = entry.thumbprint.as_deref().unwrap_or("-");
    let subject = entry.subject.as_deref().unwrap_or("").dimmed();

    println!(
        "  {} {} {:<8} {} {} {} {}",
        date.dimmed(),
        "│".dimmed(),
        format_action(&entry.action),
        location,
        thumbprint,
        subject,
        entry.author.dimmed(),
    );
}

/// Format an AuditAction as a colored string.
fn format_action(action: &AuditAction) -> String {
    match action {
        AuditAction::Init => "init".cyan().to_string(),
        AuditAction::Add => "add".green().to_string(),
        AuditAction::Remove => "remove".red().to_string(),
    }
}
