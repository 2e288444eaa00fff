//! Toolchain signature
//!
//! A fingerprint of the installed toolchain used to decide whether a
//! stored cache can be trusted. Serialized to one stable line and
//! compared byte for byte; never parsed structurally.

use crate::runtime::Toolchain;
use sha2::{Digest, Sha256};
use std::fmt;

/// Version token prefixing every signature
///
/// Bumping this invalidates all existing caches by construction.
const SIGNATURE_VERSION: &str = "v2";

/// Serialized toolchain fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(String);

impl Signature {
    /// Compute the signature for a resolved toolchain
    ///
    /// Deterministic: the same toolchain and stack always produce the
    /// same signature. No side effects.
    pub fn compute(toolchain: &Toolchain) -> Self {
        Self(format!(
            "{}; {}; node-{}; npm-{}",
            SIGNATURE_VERSION, toolchain.stack, toolchain.node_version, toolchain.npm_version
        ))
    }

    /// Rehydrate a signature read from a cache record
    pub fn from_stored(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// The serialized form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short digest for logs (first 12 hex chars of SHA-256)
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..6])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain() -> Toolchain {
        Toolchain {
            node_version: "22.11.0".to_string(),
            npm_version: "10.9.0".to_string(),
            yarn_version: None,
            stack: "sandbox-24".to_string(),
        }
    }

    #[test]
    fn compute_is_deterministic() {
        let a = Signature::compute(&toolchain());
        let b = Signature::compute(&toolchain());
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "v2; sandbox-24; node-22.11.0; npm-10.9.0");
    }

    #[test]
    fn different_toolchains_differ() {
        let a = Signature::compute(&toolchain());
        let mut other = toolchain();
        other.npm_version = "11.0.0".to_string();
        let b = Signature::compute(&other);
        assert_ne!(a, b);
    }

    #[test]
    fn stored_roundtrip() {
        let sig = Signature::compute(&toolchain());
        let stored = Signature::from_stored(sig.as_str());
        assert_eq!(sig, stored);
    }

    #[test]
    fn digest_is_short_and_stable() {
        let sig = Signature::compute(&toolchain());
        let digest = sig.digest();
        assert_eq!(digest.len(), 12);
        assert_eq!(digest, sig.digest());
    }
}
