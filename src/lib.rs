//! # Kmerstream
//!
//! Memory-bounded streaming k-mer frequency counting.
//!
//! Kmerstream reads a stream of sequence lines and reports the most frequent
//! fixed-length substrings (k-mers) without ever holding every k-mer of the
//! input in memory. The frequency table is kept bounded by an adaptive
//! eviction controller that discards entries judged to be rare and raises its
//! own capacity limit when eviction stops paying off.
//!
//! ## Components
//!
//! - **Rolling hash** ([`rolling`]): O(1) per-window key derivation
//! - **Frequency table** ([`table`]): counts keyed by (signature hash, text)
//! - **Eviction** ([`eviction`]): fair and harsh heuristics, adaptive limit
//! - **Ranking** ([`ranking`]): deterministic top-K extraction
//! - **Engine** ([`engine`]): drives the stream through all of the above
//!
//! Results are approximate: a k-mer evicted early loses the occurrences
//! counted before its eviction.
//!
//! ## Quick Start
//!
//! ```rust
//! use kmerstream::prelude::*;
//!
//! let config = EngineConfig::default().with_kmer_size(30);
//! let mut engine = KmerEngine::new(config).unwrap();
//!
//! engine
//!     .ingest([
//!         "ACGTACGTACGTACGTACGTACGTACGTAA",
//!         "ACGTACGTACGTACGTACGTACGTACGTAA",
//!     ])
//!     .unwrap();
//!
//! // Ranks the table as it stands; `finish` runs the final eviction pass first
//! let ranking = engine.rank();
//! assert_eq!(ranking.top(1), &[KmerCount::new("ACGTACGTACGTACGTACGTACGTACGTAA", 2)]);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): the `kmer-top` command-line tool
//! - `serde`: serialization of configuration, reports and rankings
//! - `full`: everything

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod engine;
pub mod eviction;
pub mod ranking;
pub mod rolling;
pub mod source;
pub mod table;
pub mod traits;

pub mod prelude {
    pub use crate::config::{EngineConfig, ShortSequencePolicy};
    pub use crate::engine::{EngineStats, IngestSummary, KmerEngine, LineOutcome};
    pub use crate::eviction::{EvictionMode, EvictionReport};
    pub use crate::ranking::{KmerCount, Ranking};
    pub use crate::source::{SequenceFormat, SequenceReader};
    pub use crate::traits::*;
}

pub use config::EngineConfig;
pub use engine::KmerEngine;
pub use ranking::{KmerCount, Ranking};
