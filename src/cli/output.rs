use colored::Colorize;
use serde::Serialize;

use crate::core::errors::Result;

// Status lines go to stderr; stdout carries only `Key: value` results
// or JSON so callers can scrape it.

/// Print a success message.
pub fn success(msg: &str) {
    eprintln!("  {} {}", "✓".green(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    eprintln!("  {} {}", "⚠".yellow(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a header line.
pub fn header(msg: &str) {
    eprintln!("\n{}", msg.bold());
}

/// Print one result field as `Key: value`.
pub fn field(key: &str, value: &str) {
    println!("{key}: {value}");
}

/// Print result fields in order.
pub fn fields(pairs: &[(&str, String)]) {
    for (key, value) in pairs {
        field(key, value);
    }
}

/// Print `value` as a single pretty JSON document.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}
