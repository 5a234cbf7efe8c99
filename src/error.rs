//! Error types for the Reed-Solomon and secret-sharing engines.
//!
//! There are two families of errors, one per engine. Both are represented as
//! plain value types returned to the caller; nothing in this crate panics on
//! a malformed input.
use thiserror::Error;

/// An error produced by the Reed-Solomon encoder or decoder.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ReconstructionError {
    /// fewer than `k` shards were available for some chunk.
    #[error("insufficient shards: got {got}, need at least {needed} in chunk {chunk}")]
    InsufficientShards {
        got: usize,
        needed: usize,
        chunk: usize,
    },
    /// decoding succeeded algebraically but the checksum didn't match.
    #[error("corrupted shards: checksum mismatch after reconstruction")]
    CorruptedShards,
    /// shard metadata disagreed across the provided set, or a config value
    /// violated an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// matrix inversion hit a column with no non-zero pivot.
    #[error("math error: {0}")]
    MathError(String),
}

/// An error produced by the secret-sharing split or combine operation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SSSError {
    /// the secret was empty or exceeded `secret_max_size`.
    #[error("invalid secret: {0}")]
    InvalidSecret(String),
    /// a share's `x` was out of range, or metadata disagreed across shares.
    #[error("invalid share: {0}")]
    InvalidShare(String),
    /// fewer than `k` shares were provided to `combine`.
    #[error("insufficient shares: got {got}, need at least {needed}")]
    InsufficientShares { got: usize, needed: usize },
    /// a config value violated an invariant.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// reconstruction succeeded algebraically but the hash didn't match.
    #[error("corrupted share: secret hash mismatch after reconstruction")]
    CorruptedShare,
    /// Lagrange interpolation hit a division by zero (duplicate x-values).
    #[error("math error: {0}")]
    MathError(String),
}
