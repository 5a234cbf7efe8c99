//! Configuration types for the Reed-Solomon and secret-sharing engines.
//!
//! Both configs are constructed exclusively through a checked constructor,
//! so an `EncodingConfig` or `SSSConfig` in hand is always known to satisfy
//! its invariants — construction-time validation rather than a runtime
//! hazard, per the error design in [`crate::error`].
use crate::error::{ReconstructionError, SSSError};

/// The default shard size (in bytes) used by [`EncodingConfig::new_with_defaults`].
///
/// Preserved from the reference design for compatibility with existing shard
/// records; it is not itself a correctness concern.
pub const DEFAULT_SHARD_SIZE: usize = 8192;

/// Parameters of a Reed-Solomon `(k, m)` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingConfig {
    data_shards: u8,
    parity_shards: u8,
    shard_size: usize,
}

impl EncodingConfig {
    /// Builds a config, enforcing `k >= 1`, `m >= 1`, `k + m <= 256` and
    /// `s >= 1`.
    pub fn new(data_shards: u8, parity_shards: u8, shard_size: usize) -> Result<Self, ReconstructionError> {
        if data_shards == 0 {
            return Err(ReconstructionError::InvalidConfiguration(
                "data_shards must be at least 1".to_string(),
            ));
        }
        if parity_shards == 0 {
            return Err(ReconstructionError::InvalidConfiguration(
                "parity_shards must be at least 1".to_string(),
            ));
        }
        if (data_shards as u16) + (parity_shards as u16) > 256 {
            return Err(ReconstructionError::InvalidConfiguration(format!(
                "k + m must be at most 256, got k={data_shards}, m={parity_shards}"
            )));
        }
        if shard_size == 0 {
            return Err(ReconstructionError::InvalidConfiguration(
                "shard_size must be at least 1".to_string(),
            ));
        }

        Ok(EncodingConfig {
            data_shards,
            parity_shards,
            shard_size,
        })
    }

    /// Builds a config using [`DEFAULT_SHARD_SIZE`].
    pub fn new_with_defaults(data_shards: u8, parity_shards: u8) -> Result<Self, ReconstructionError> {
        Self::new(data_shards, parity_shards, DEFAULT_SHARD_SIZE)
    }

    /// Same config, with a different effective shard size. Used by the
    /// space-efficient single-chunk encoding variant, which must record the
    /// shrunk shard size in the emitted metadata.
    pub(crate) fn with_shard_size(self, shard_size: usize) -> Self {
        EncodingConfig {
            shard_size,
            ..self
        }
    }

    pub fn data_shards(&self) -> u8 {
        self.data_shards
    }

    pub fn parity_shards(&self) -> u8 {
        self.parity_shards
    }

    pub fn shard_size(&self) -> usize {
        self.shard_size
    }

    pub fn total_shards(&self) -> u16 {
        self.data_shards as u16 + self.parity_shards as u16
    }
}

/// Parameters of a `(k, n)` Shamir secret-sharing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SSSConfig {
    threshold: u8,
    total_shares: u8,
    use_secure_random: bool,
    secret_max_size: usize,
}

impl SSSConfig {
    /// The field this scheme operates over always has 256 elements.
    pub const FIELD_SIZE: u32 = 256;

    /// Builds a config, enforcing `1 <= k <= n <= 255`.
    pub fn new(
        threshold: u8,
        total_shares: u8,
        use_secure_random: bool,
        secret_max_size: usize,
    ) -> Result<Self, SSSError> {
        if threshold == 0 {
            return Err(SSSError::InvalidConfig(
                "threshold must be at least 1".to_string(),
            ));
        }
        if total_shares < threshold {
            return Err(SSSError::InvalidConfig(format!(
                "total_shares ({total_shares}) must be at least threshold ({threshold})"
            )));
        }

        Ok(SSSConfig {
            threshold,
            total_shares,
            use_secure_random,
            secret_max_size,
        })
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn total_shares(&self) -> u8 {
        self.total_shares
    }

    pub fn use_secure_random(&self) -> bool {
        self.use_secure_random
    }

    pub fn secret_max_size(&self) -> usize {
        self.secret_max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_config_succeeds() {
        assert!(EncodingConfig::new(200, 56, 1).is_ok());
    }

    #[test]
    fn over_budget_config_fails() {
        assert!(matches!(
            EncodingConfig::new(200, 57, 1),
            Err(ReconstructionError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_data_shards_rejected() {
        assert!(EncodingConfig::new(0, 1, 1).is_err());
    }

    #[test]
    fn zero_shard_size_rejected() {
        assert!(EncodingConfig::new(1, 1, 0).is_err());
    }

    #[test]
    fn sss_requires_n_at_least_k() {
        assert!(SSSConfig::new(5, 3, true, 1024).is_err());
        assert!(SSSConfig::new(3, 5, true, 1024).is_ok());
    }

    #[test]
    fn sss_zero_threshold_rejected() {
        assert!(SSSConfig::new(0, 5, true, 1024).is_err());
    }
}
