//! Output functions for consistent build log formatting

use crate::diagnose::{Diagnostic, Severity};
use console::style;

/// Display a section header
pub fn section(title: &str) {
    println!("{} {}", style("====>").cyan().bold(), style(title).bold());
}

/// Display a progress step under the current section
pub fn step(message: &str) {
    println!("  {} {}", style("[OK]").green(), message);
}

/// Display a progress step with detail
pub fn step_detail(message: &str, detail: &str) {
    println!(
        "  {} {} ({})",
        style("[OK]").green(),
        message,
        style(detail).dim()
    );
}

/// Display a non-fatal warning
pub fn warn(message: &str) {
    println!("  {} {}", style("[WARN]").yellow(), message);
}

/// Display a failure line
pub fn fail(message: &str) {
    println!("  {} {}", style("[FAIL]").red(), message);
}

/// Display a final success line
pub fn done(message: &str) {
    println!();
    println!("{} {}", style("[DONE]").green().bold(), message);
}

/// Render one classifier diagnostic
pub fn diagnostic(diag: &Diagnostic) {
    match diag.severity {
        Severity::Explain => {
            println!("  {} {}", style("[FAIL]").red(), style(diag.title).bold());
        }
        Severity::Warn => {
            println!("  {} {}", style("[WARN]").yellow(), style(diag.title).bold());
        }
    }
    println!("         {}", diag.detail);
}
