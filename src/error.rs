//! Error types shared across the crate.
//!
//! Three kinds of failures surface to callers:
//! - [`CoreError::Config`] -- an option value or option combination that can
//!   never work (rejected before any graph is touched).
//! - [`CoreError::Input`] -- a graph or terminal that violates an entry
//!   contract (asymmetric adjacency, loops or multi arcs at cutter entry,
//!   out-of-bounds terminals, negative weights under a weighted pierce
//!   policy).
//! - [`CoreError::Internal`] -- a cross-component contract broke in a release
//!   build. Debug builds assert instead.
//!
//! Cutter stalls (no pierce candidate left, no cut of the requested quality)
//! are *not* errors: the enumeration simply terminates and the best cut seen
//! so far stands.

use thiserror::Error;

/// Error type for all fallible operations in the partitioner core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration value or incompatible policy combination.
    #[error("config error: {0}")]
    Config(String),

    /// Input graph or terminal data violates an entry contract.
    #[error("input error: {0}")]
    Input(String),

    /// A cross-component invariant broke in a release build.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Process exit code for wrapping tools: `1` for configuration errors,
    /// `2` for input or internal invariant violations. Success is `0`, which
    /// no error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Config(_) => 1,
            CoreError::Input(_) | CoreError::Internal(_) => 2,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CoreError>;
