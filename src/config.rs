//! Engine configuration

use crate::traits::ConfigError;

/// Default k-mer length
pub const DEFAULT_KMER_SIZE: usize = 30;

/// Default number of k-mers in the summary
pub const DEFAULT_TOP_N: usize = 25;

/// Default fairness constant (recommended range 1.0 to 2.0)
pub const DEFAULT_FAIRNESS_CONST: f64 = 1.25;

/// Default table size that triggers the first eviction pass
pub const DEFAULT_CAPACITY_LIMIT: usize = 1_000;

/// What a stream driver does with a sequence shorter than the k-mer size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShortSequencePolicy {
    /// Stop ingesting and report the error
    #[default]
    Abort,
    /// Skip the line and keep going
    Skip,
}

/// Configuration of a [`KmerEngine`](crate::engine::KmerEngine)
///
/// # Example
///
/// ```
/// use kmerstream::config::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_kmer_size(21)
///     .with_fairness_const(1.5);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.top_n, 25);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Window length K
    pub k_mer_size: usize,
    /// Entries reported by the summary
    pub top_n: usize,
    /// Multiplier of the fair-mode baseline
    pub fairness_const: f64,
    /// Starting capacity limit
    pub initial_capacity_limit: usize,
    /// Handling of sequences shorter than K
    pub short_sequence_policy: ShortSequencePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            k_mer_size: DEFAULT_KMER_SIZE,
            top_n: DEFAULT_TOP_N,
            fairness_const: DEFAULT_FAIRNESS_CONST,
            initial_capacity_limit: DEFAULT_CAPACITY_LIMIT,
            short_sequence_policy: ShortSequencePolicy::Abort,
        }
    }
}

impl EngineConfig {
    /// Set the k-mer size
    pub fn with_kmer_size(mut self, k: usize) -> Self {
        self.k_mer_size = k;
        self
    }

    /// Set the summary length
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    /// Set the fairness constant
    pub fn with_fairness_const(mut self, fairness_const: f64) -> Self {
        self.fairness_const = fairness_const;
        self
    }

    /// Set the initial capacity limit
    pub fn with_initial_capacity_limit(mut self, limit: usize) -> Self {
        self.initial_capacity_limit = limit;
        self
    }

    /// Set the short-sequence policy
    pub fn with_short_sequence_policy(mut self, policy: ShortSequencePolicy) -> Self {
        self.short_sequence_policy = policy;
        self
    }

    /// Check the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k_mer_size == 0 {
            return Err(ConfigError::ZeroKmerSize);
        }
        if self.initial_capacity_limit == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !self.fairness_const.is_finite() || self.fairness_const <= 0.0 {
            return Err(ConfigError::InvalidFairness(self.fairness_const));
        }
        Ok(())
    }
}
