//! Top-K extraction
//!
//! Ranks every surviving table entry by count, most frequent first. Equal
//! counts are ordered by k-mer text, ascending, so a ranking is fully
//! deterministic for a given table.

use crate::table::FrequencyTable;
use crate::traits::HeavyHitters;
use core::cmp::Ordering;
use core::fmt;
use std::io::{self, Write};

/// A k-mer and its occurrence count
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KmerCount {
    /// K-mer text
    pub text: String,
    /// Occurrences counted while the k-mer was tracked
    pub count: u64,
}

impl KmerCount {
    /// Create a new entry
    pub fn new(text: impl Into<String>, count: u64) -> Self {
        Self {
            text: text.into(),
            count,
        }
    }

    fn rank_order(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl fmt::Display for KmerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.text, self.count)
    }
}

impl<S: Into<String>> From<(S, u64)> for KmerCount {
    fn from((text, count): (S, u64)) -> Self {
        Self::new(text, count)
    }
}

/// Entries sorted by count descending, then text ascending
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ranking {
    entries: Vec<KmerCount>,
}

impl Ranking {
    /// Sort arbitrary entries into a ranking
    pub fn from_entries(mut entries: Vec<KmerCount>) -> Self {
        entries.sort_unstable_by(KmerCount::rank_order);
        Self { entries }
    }

    /// The first `min(n, len)` entries
    pub fn top(&self, n: usize) -> &[KmerCount] {
        top(&self.entries, n)
    }

    /// All entries in rank order
    pub fn as_slice(&self) -> &[KmerCount] {
        &self.entries
    }

    /// Iterate in rank order
    pub fn iter(&self) -> core::slice::Iter<'_, KmerCount> {
        self.entries.iter()
    }

    /// Number of ranked entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ranking is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume into the sorted vector
    pub fn into_vec(self) -> Vec<KmerCount> {
        self.entries
    }

    /// Write one `text | count` record per line
    pub fn write_records<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()
    }

    /// Write the `N most frequent K-mers are:` header and the top records
    pub fn write_summary<W: Write>(&self, mut writer: W, n: usize, k: usize) -> io::Result<()> {
        let shown = self.top(n);
        writeln!(writer, "{} most frequent {}-mers are:", shown.len(), k)?;
        for entry in shown {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()
    }
}

impl<'a> IntoIterator for &'a Ranking {
    type Item = &'a KmerCount;
    type IntoIter = core::slice::Iter<'a, KmerCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Ranking {
    type Item = KmerCount;
    type IntoIter = std::vec::IntoIter<KmerCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Rank every entry of a table
///
/// K-mer bytes are converted to text lossily. Input is expected to be ASCII;
/// two distinct invalid UTF-8 k-mers may then render as the same text, and
/// their relative order is unspecified.
pub fn rank(table: &FrequencyTable) -> Ranking {
    let entries = table
        .entries()
        .map(|(text, count)| KmerCount::new(String::from_utf8_lossy(text), count))
        .collect();
    Ranking::from_entries(entries)
}

impl HeavyHitters for FrequencyTable {
    fn rank(&self) -> Ranking {
        rank(self)
    }
}

/// The first `min(n, ranked.len())` entries of a ranking
pub fn top(ranked: &[KmerCount], n: usize) -> &[KmerCount] {
    &ranked[..n.min(ranked.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rolling::RollingHash;

    fn table_of(items: &[(&str, u64)]) -> FrequencyTable {
        let mut table = FrequencyTable::new();
        for &(text, count) in items {
            let sig = RollingHash::from_scratch(text.as_bytes()).signature;
            for _ in 0..count {
                table.increment(text.as_bytes(), sig);
            }
        }
        table
    }

    #[test]
    fn test_rank_order() {
        let table = table_of(&[("CC", 2), ("AA", 5), ("TT", 2), ("GG", 1)]);
        let ranked = rank(&table);

        let got: Vec<_> = ranked.iter().map(|e| (e.text.as_str(), e.count)).collect();
        assert_eq!(got, vec![("AA", 5), ("CC", 2), ("TT", 2), ("GG", 1)]);
    }

    #[test]
    fn test_top_clamps() {
        let table = table_of(&[("AA", 3), ("CC", 1)]);
        let ranked = rank(&table);

        assert_eq!(ranked.top(1), &[KmerCount::new("AA", 3)]);
        assert_eq!(ranked.top(10).len(), 2);
        assert!(ranked.top(0).is_empty());
        assert!(top(&[], 5).is_empty());
    }

    #[test]
    fn test_rank_is_repeatable() {
        let table = table_of(&[("AC", 4), ("CA", 4), ("GT", 4), ("TG", 1)]);
        assert_eq!(rank(&table), rank(&table));
        assert_eq!(rank(&table).top(2), rank(&table).top(2));
    }

    #[test]
    fn test_non_utf8_kmers_stay_separate() {
        let mut table = FrequencyTable::new();
        table.increment(&[0xFE], 0xFE * 4);
        table.increment(&[0xFF], 0xFF * 4);
        table.increment(&[0xFF], 0xFF * 4);

        let ranked = rank(&table);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked.as_slice()[0], KmerCount::new("\u{FFFD}", 2));
        assert_eq!(ranked.as_slice()[1], KmerCount::new("\u{FFFD}", 1));
    }

    #[test]
    fn test_table_heavy_hitters() {
        let table = table_of(&[("AA", 3), ("CC", 2), ("GG", 1)]);

        assert_eq!(table.top_k(1), vec![KmerCount::new("AA", 3)]);
        assert_eq!(table.heavy_hitters(2).len(), 2);
    }

    #[test]
    fn test_write_records() {
        let ranking =
            Ranking::from_entries(vec![KmerCount::new("CC", 1), KmerCount::new("AA", 2)]);
        let mut out = Vec::new();
        ranking.write_records(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "AA | 2\nCC | 1\n");
    }

    #[test]
    fn test_write_summary() {
        let ranking =
            Ranking::from_entries(vec![KmerCount::new("CC", 1), KmerCount::new("AA", 2)]);
        let mut out = Vec::new();
        ranking.write_summary(&mut out, 25, 2).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2 most frequent 2-mers are:\nAA | 2\nCC | 1\n"
        );
    }
}
