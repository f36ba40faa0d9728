//! Streaming k-mer counting engine
//!
//! The engine owns the frequency table and all run state. Each sequence line
//! is split into windows, every window is hashed with the rolling hash and
//! counted, and an eviction pass runs whenever the table reaches the current
//! capacity limit. [`KmerEngine::finish`] runs one last pass and ranks what
//! survived.
//!
//! The engine never logs. Eviction passes are reported back to the caller in
//! each [`LineOutcome`].

use crate::config::{EngineConfig, ShortSequencePolicy};
use crate::eviction::{EvictionController, EvictionMode, EvictionReport};
use crate::ranking::{self, Ranking};
use crate::rolling::Windows;
use crate::table::FrequencyTable;
use crate::traits::{ConfigError, HeavyHitters, IngestError, KmerCounter};

/// Upper bound on the table slots reserved up front
const PREALLOCATE_LIMIT: usize = 1 << 16;

/// Result of ingesting one line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineOutcome {
    /// Windows counted from the line (0 for an empty line)
    pub windows: usize,
    /// Eviction pass triggered after the line, if any
    pub eviction: Option<EvictionReport>,
}

/// Totals for a stream driven through [`KmerEngine::ingest`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IngestSummary {
    /// Lines whose windows were counted
    pub lines: u64,
    /// Empty lines passed over
    pub empty: u64,
    /// Too-short lines passed over under [`ShortSequencePolicy::Skip`]
    pub skipped: u64,
    /// Windows counted
    pub windows: u64,
    /// Eviction passes triggered
    pub evictions: u64,
}

/// Snapshot of the run state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineStats {
    /// Window-bearing lines ingested
    pub lines_seen: u64,
    /// Highest count ever reached by any entry (never decreases)
    pub running_max_count: u64,
    /// Current capacity limit
    pub capacity_limit: usize,
    /// Current eviction heuristic
    pub mode: EvictionMode,
    /// Entries currently in the table
    pub tracked: usize,
    /// Eviction passes run so far
    pub evictions: u64,
}

/// Memory-bounded k-mer frequency counter
///
/// # Example
///
/// ```
/// use kmerstream::config::EngineConfig;
/// use kmerstream::engine::KmerEngine;
/// use kmerstream::traits::HeavyHitters;
///
/// let mut engine = KmerEngine::new(EngineConfig::default().with_kmer_size(4)).unwrap();
/// engine.ingest(["ACGTACGT", "ACGTTT"]).unwrap();
///
/// let ranking = engine.rank();
/// assert_eq!(ranking.top(1)[0].text, "ACGT");
/// assert_eq!(ranking.top(1)[0].count, 3);
/// ```
#[derive(Clone, Debug)]
pub struct KmerEngine {
    config: EngineConfig,
    table: FrequencyTable,
    controller: EvictionController,
    lines_seen: u64,
    running_max_count: u64,
}

impl KmerEngine {
    /// Create an engine from a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let controller =
            EvictionController::new(config.initial_capacity_limit, config.fairness_const);
        Ok(Self {
            table: FrequencyTable::with_capacity(
                config.initial_capacity_limit.min(PREALLOCATE_LIMIT),
            ),
            controller,
            config,
            lines_seen: 0,
            running_max_count: 0,
        })
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live frequency table
    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }

    /// Window-bearing lines ingested so far
    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }

    /// Highest count ever observed, including evicted entries
    pub fn running_max_count(&self) -> u64 {
        self.running_max_count
    }

    /// Current capacity limit
    pub fn capacity_limit(&self) -> usize {
        self.controller.capacity_limit()
    }

    /// Current eviction heuristic
    pub fn mode(&self) -> EvictionMode {
        self.controller.mode()
    }

    /// Snapshot of the run state
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            lines_seen: self.lines_seen,
            running_max_count: self.running_max_count,
            capacity_limit: self.controller.capacity_limit(),
            mode: self.controller.mode(),
            tracked: self.table.len(),
            evictions: self.controller.passes(),
        }
    }

    /// Count every window of one sequence line
    ///
    /// An empty line counts nothing. A line shorter than the k-mer size is
    /// rejected with [`IngestError::SequenceTooShort`] and leaves the engine
    /// untouched.
    pub fn ingest_line(&mut self, line: &[u8]) -> Result<LineOutcome, IngestError> {
        if line.is_empty() {
            return Ok(LineOutcome {
                windows: 0,
                eviction: self.maybe_evict(),
            });
        }

        let k = self.config.k_mer_size;
        if line.len() < k {
            return Err(IngestError::SequenceTooShort {
                length: line.len(),
                k,
            });
        }

        let mut windows = 0;
        for (window, hash) in Windows::new(line, k) {
            let count = self.table.increment(window, hash.signature);
            if count > self.running_max_count {
                self.running_max_count = count;
            }
            windows += 1;
        }
        self.lines_seen += 1;

        Ok(LineOutcome {
            windows,
            eviction: self.maybe_evict(),
        })
    }

    /// Ingest a whole stream of sequence lines
    ///
    /// Under [`ShortSequencePolicy::Abort`] the first too-short line stops
    /// ingestion and its error is returned; everything counted before it is
    /// kept. Under [`ShortSequencePolicy::Skip`] such lines are tallied in
    /// [`IngestSummary::skipped`].
    pub fn ingest<I, L>(&mut self, lines: I) -> Result<IngestSummary, IngestError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut summary = IngestSummary::default();

        for line in lines {
            let outcome = match self.ingest_line(line.as_ref()) {
                Ok(outcome) => outcome,
                Err(IngestError::SequenceTooShort { .. })
                    if self.config.short_sequence_policy == ShortSequencePolicy::Skip =>
                {
                    summary.skipped += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };

            if outcome.windows == 0 {
                summary.empty += 1;
            } else {
                summary.lines += 1;
                summary.windows += outcome.windows as u64;
            }
            if outcome.eviction.is_some() {
                summary.evictions += 1;
            }
        }

        Ok(summary)
    }

    /// Run an eviction pass regardless of the table size
    pub fn evict_now(&mut self) -> EvictionReport {
        self.controller
            .run(&mut self.table, self.running_max_count, self.lines_seen)
    }

    /// Run the final eviction pass and rank the survivors
    pub fn finish(self) -> Ranking {
        self.finish_with_report().0
    }

    /// Like [`finish`](Self::finish), also returning the final pass report
    pub fn finish_with_report(mut self) -> (Ranking, EvictionReport) {
        let report = self.evict_now();
        (ranking::rank(&self.table), report)
    }

    fn maybe_evict(&mut self) -> Option<EvictionReport> {
        if self.controller.should_run(self.table.len()) {
            Some(self.evict_now())
        } else {
            None
        }
    }
}

impl KmerCounter for KmerEngine {
    type Outcome = LineOutcome;

    fn ingest_line(&mut self, line: &[u8]) -> Result<LineOutcome, IngestError> {
        KmerEngine::ingest_line(self, line)
    }

    fn tracked(&self) -> usize {
        self.table.len()
    }

    fn clear(&mut self) {
        self.table.clear();
        self.controller.reset();
        self.lines_seen = 0;
        self.running_max_count = 0;
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>() + self.table.size_bytes()
    }
}

impl HeavyHitters for KmerEngine {
    /// Ranks the table as it stands, without a final eviction pass
    fn rank(&self) -> Ranking {
        ranking::rank(&self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(k: usize) -> KmerEngine {
        KmerEngine::new(EngineConfig::default().with_kmer_size(k)).unwrap()
    }

    #[test]
    fn test_basic_counting() {
        let mut e = engine(3);

        let outcome = e.ingest_line(b"AAAAA").unwrap();

        assert_eq!(outcome.windows, 3);
        assert_eq!(outcome.eviction, None);
        assert_eq!(e.lines_seen(), 1);
        assert_eq!(e.running_max_count(), 3);
        assert_eq!(e.tracked(), 1);
    }

    #[test]
    fn test_empty_line_skipped() {
        let mut e = engine(3);

        let outcome = e.ingest_line(b"").unwrap();

        assert_eq!(outcome.windows, 0);
        assert_eq!(e.lines_seen(), 0);
        assert!(e.is_empty());
    }

    #[test]
    fn test_short_line_rejected() {
        let mut e = engine(30);
        e.ingest_line(b"ACGTACGTACGTACGTACGTACGTACGTAA").unwrap();

        let err = e.ingest_line(b"ACGTACGTAC").unwrap_err();

        assert_eq!(err, IngestError::SequenceTooShort { length: 10, k: 30 });
        assert_eq!(e.lines_seen(), 1);
        assert_eq!(e.tracked(), 1);
    }

    #[test]
    fn test_ingest_abort() {
        let mut e = engine(4);

        let result = e.ingest(["ACGTA", "AC", "GGGGG"]);

        assert!(matches!(
            result,
            Err(IngestError::SequenceTooShort { length: 2, k: 4 })
        ));
        // Lines after the failure are not read
        assert_eq!(e.lines_seen(), 1);
    }

    #[test]
    fn test_ingest_skip() {
        let config = EngineConfig::default()
            .with_kmer_size(4)
            .with_short_sequence_policy(ShortSequencePolicy::Skip);
        let mut e = KmerEngine::new(config).unwrap();

        let summary = e.ingest(["ACGTA", "AC", "", "GGGGG"]).unwrap();

        assert_eq!(summary.lines, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.windows, 4);
        assert_eq!(e.lines_seen(), 2);
    }

    #[test]
    fn test_invalid_config() {
        assert_eq!(
            KmerEngine::new(EngineConfig::default().with_kmer_size(0)).unwrap_err(),
            ConfigError::ZeroKmerSize
        );
    }

    #[test]
    fn test_eviction_triggered_at_capacity() {
        let config = EngineConfig::default()
            .with_kmer_size(4)
            .with_initial_capacity_limit(3);
        let mut e = KmerEngine::new(config).unwrap();

        // 5 distinct windows, all count 1, one line
        let outcome = e.ingest_line(b"ACGTTGCA").unwrap();

        let report = outcome.eviction.expect("eviction should run");
        assert_eq!(report.before, 5);
        // floor(1 / 1) * 1.25 < x = 3 / 1 for every entry
        assert_eq!(report.removed, 5);
        assert!(!report.capacity_raised);
        assert_eq!(e.capacity_limit(), 3);
        assert!(e.is_empty());
        assert_eq!(e.stats().evictions, 1);
    }

    #[test]
    fn test_running_max_survives_eviction() {
        let mut e = engine(2);
        // AC:3, CA:2
        e.ingest_line(b"ACACAC").unwrap();
        assert_eq!(e.running_max_count(), 3);

        // floor(1 / 3) * 1.25 = 0, below every x-factor
        let report = e.evict_now();
        assert_eq!(report.mode, EvictionMode::Fair);
        assert_eq!(report.removed, 2);
        assert!(e.is_empty());
        assert_eq!(e.running_max_count(), 3);
    }

    #[test]
    fn test_summary_uses_configured_top_n() {
        let config = EngineConfig::default().with_kmer_size(2).with_top_n(2);
        let mut e = KmerEngine::new(config).unwrap();
        e.ingest(["AAAA", "ACGT"]).unwrap();

        let (top_n, k) = (e.config().top_n, e.config().k_mer_size);
        let ranking = e.rank();
        let mut out = Vec::new();
        ranking.write_summary(&mut out, top_n, k).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2 most frequent 2-mers are:\nAA | 3\nAC | 1\n"
        );
    }

    #[test]
    fn test_clear() {
        let mut e = engine(2);
        e.ingest(["ACGT", "ACGT"]).unwrap();

        KmerCounter::clear(&mut e);

        assert!(e.is_empty());
        assert_eq!(e.stats().lines_seen, 0);
        assert_eq!(e.capacity_limit(), 1000);
        assert_eq!(e.mode(), EvictionMode::Fair);
    }

    #[test]
    fn test_heavy_hitters() {
        let mut e = engine(2);
        e.ingest(["AAAA", "ACAC"]).unwrap();

        // AA:3, AC:2, CA:1
        let heavy = e.heavy_hitters(2);
        assert_eq!(heavy.len(), 2);
        assert_eq!(heavy[0].text, "AA");
        assert_eq!(e.top_k(1)[0].count, 3);
    }
}
