//! Known failure patterns
//!
//! A fixed, prioritized table mapping substrings of package manager
//! output to diagnostics. More specific and actionable patterns come
//! first. Policy lives here, not in user data; changing a pattern is a
//! code change with a test.

use crate::process::LogBuffer;

/// How a matched pattern relates to the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Explains why the build failed
    Explain,
    /// Noteworthy observation that may or may not be the root cause
    Warn,
}

/// One classification rule
#[derive(Debug, Clone, Copy)]
pub struct FailurePattern {
    /// Stable identifier
    pub id: &'static str,
    /// The pattern matches when any needle appears in any log line
    pub needles: &'static [&'static str],
    /// Relation to the failure
    pub severity: Severity,
    /// Short headline
    pub title: &'static str,
    /// Actionable explanation
    pub detail: &'static str,
}

impl FailurePattern {
    /// Whether any needle appears anywhere in the log
    pub fn matches(&self, log: &LogBuffer) -> bool {
        self.needles.iter().any(|needle| log.contains(needle))
    }
}

/// The classification table, in priority order
pub const PATTERNS: &[FailurePattern] = &[
    FailurePattern {
        id: "outdated-lockfile",
        needles: &[
            "Your lockfile needs to be updated",
            "can only install packages when your package.json and package-lock.json",
        ],
        severity: Severity::Explain,
        title: "Outdated lockfile",
        detail: "The lockfile does not match package.json. Run the package manager locally to regenerate it and commit the result.",
    },
    FailurePattern {
        id: "unmet-version",
        needles: &["No matching version found for", "Couldn't find any versions for"],
        severity: Severity::Explain,
        title: "No matching package version",
        detail: "A dependency range resolves to no published version. Check the requested version against the registry.",
    },
    FailurePattern {
        id: "integrity-mismatch",
        needles: &["EINTEGRITY"],
        severity: Severity::Explain,
        title: "Package integrity check failed",
        detail: "A downloaded package did not match its recorded checksum. Regenerate the lockfile or clear the package manager cache.",
    },
    FailurePattern {
        id: "native-build-failed",
        needles: &["gyp ERR!", "node-pre-gyp ERR!"],
        severity: Severity::Explain,
        title: "Native module build failed",
        detail: "A dependency compiles native code and its build failed. Check that the dependency supports this platform and Node version.",
    },
    FailurePattern {
        id: "out-of-memory",
        needles: &["JavaScript heap out of memory", "ENOMEM"],
        severity: Severity::Explain,
        title: "Out of memory",
        detail: "The install exhausted available memory. Reduce concurrent work or move heavy steps out of dependency installation.",
    },
    FailurePattern {
        id: "out-of-disk",
        needles: &["ENOSPC"],
        severity: Severity::Explain,
        title: "Out of disk space",
        detail: "The build directory ran out of space. Large dependency trees plus cached artifacts can exceed the sandbox allowance.",
    },
    FailurePattern {
        id: "network-interrupted",
        needles: &["ETIMEDOUT", "ECONNRESET", "EAI_AGAIN", "ENOTFOUND"],
        severity: Severity::Warn,
        title: "Network interruption during install",
        detail: "The registry was unreachable at some point. This is usually transient; retry the build.",
    },
    FailurePattern {
        id: "lifecycle-script-failed",
        needles: &["ELIFECYCLE"],
        severity: Severity::Warn,
        title: "A package lifecycle script failed",
        detail: "A dependency's own install script exited non-zero. The lines above the error usually name the package.",
    },
];
