//! Core traits for k-mer counting
//!
//! The engine and its table implement the capability traits defined here,
//! and the error taxonomy shared by every module lives next to them.

use crate::ranking::{KmerCount, Ranking};
use thiserror::Error;

/// Error raised while feeding sequence lines to a counter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// A non-empty sequence cannot hold a single window of length `k`
    #[error("sequence of length {length} is shorter than k-mer size {k}")]
    SequenceTooShort {
        length: usize,
        k: usize,
    },
}

/// Error raised when an engine configuration is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `k_mer_size` must be at least 1
    #[error("k-mer size must be at least 1")]
    ZeroKmerSize,
    /// `initial_capacity_limit` must be at least 1
    #[error("initial capacity limit must be at least 1")]
    ZeroCapacity,
    /// `fairness_const` must be finite and positive
    #[error("fairness constant must be finite and positive, got {0}")]
    InvalidFairness(f64),
}

/// Streaming counter fed one sequence line at a time
pub trait KmerCounter {
    /// Per-line result returned on success
    type Outcome;

    /// Count every window of a sequence line
    fn ingest_line(&mut self, line: &[u8]) -> Result<Self::Outcome, IngestError>;

    /// Number of distinct k-mers currently tracked
    fn tracked(&self) -> usize;

    /// Reset to the freshly constructed state
    fn clear(&mut self);

    /// Approximate memory usage in bytes
    fn size_bytes(&self) -> usize;

    /// Check if nothing is tracked
    fn is_empty(&self) -> bool {
        self.tracked() == 0
    }
}

/// Heavy hitters / Top-K capability
pub trait HeavyHitters {
    /// All tracked k-mers, most frequent first
    fn rank(&self) -> Ranking;

    /// Get top-k most frequent k-mers
    fn top_k(&self, k: usize) -> Vec<KmerCount> {
        self.rank().top(k).to_vec()
    }

    /// K-mers whose count is at least `min_count`
    fn heavy_hitters(&self, min_count: u64) -> Vec<KmerCount> {
        self.rank()
            .iter()
            .take_while(|entry| entry.count >= min_count)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = IngestError::SequenceTooShort { length: 10, k: 30 };
        assert_eq!(
            err.to_string(),
            "sequence of length 10 is shorter than k-mer size 30"
        );

        let err = ConfigError::InvalidFairness(-1.0);
        assert!(err.to_string().contains("-1"));
    }
}
