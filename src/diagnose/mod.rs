//! Failure classification
//!
//! After a pipeline failure, the captured build log is scanned against a
//! fixed table of known failure patterns to attach human diagnostics.
//! Purely advisory: read-only over the log, never re-runs anything, and
//! an empty result leaves the raw failure to speak for itself.

pub mod patterns;

pub use patterns::{FailurePattern, Severity, PATTERNS};

use crate::process::LogBuffer;

/// A human-readable explanation attached to a matched failure pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable identifier of the matched pattern
    pub id: &'static str,
    /// Short headline
    pub title: &'static str,
    /// Actionable explanation
    pub detail: &'static str,
    /// Whether this explains the failure or is a side observation
    pub severity: Severity,
}

/// Scan the build log against every known pattern, in priority order
///
/// Patterns are independent; several may match one failure, and each
/// match contributes exactly one diagnostic. No match contributes
/// nothing.
pub fn classify(log: &LogBuffer) -> Vec<Diagnostic> {
    PATTERNS
        .iter()
        .filter(|p| p.matches(log))
        .map(|p| Diagnostic {
            id: p.id,
            title: p.title,
            detail: p.detail,
            severity: p.severity,
        })
        .collect()
}
