//! Persistent cache between builds
//!
//! Named directories from the build dir are stored under the cache dir
//! together with a toolchain signature. A stored cache is only trusted
//! when the signature recorded at save time matches the one computed for
//! the current build byte for byte.
//!
//! # Cache trust
//!
//! | Status  | Meaning                                   | Restore |
//! |---------|-------------------------------------------|---------|
//! | Absent  | No record from a previous build           | no      |
//! | Invalid | Record exists, toolchain changed          | no      |
//! | Valid   | Record matches the current toolchain      | yes     |

pub mod manager;
pub mod signature;
pub mod store;

pub use manager::{cache_directories, CacheManager, CacheStatus, DEFAULT_CACHE_DIRECTORIES};
pub use signature::Signature;
pub use store::{CacheRecord, CacheStore};
