//! Frequency table keyed by (signature hash, k-mer text)
//!
//! The signature is compared first and the text only when signatures match,
//! so distinct k-mers with colliding signatures never share a counter.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use xxhash_rust::xxh3::Xxh3;

type KeyHasher = BuildHasherDefault<Xxh3>;

/// Composite key owned by the table
#[derive(Clone, Debug)]
struct KmerKey {
    signature: u64,
    text: Box<[u8]>,
}

/// Borrowed view of a key, so lookups do not allocate
trait KeyView {
    fn signature(&self) -> u64;
    fn text(&self) -> &[u8];
}

impl KeyView for KmerKey {
    fn signature(&self) -> u64 {
        self.signature
    }

    fn text(&self) -> &[u8] {
        &self.text
    }
}

impl KeyView for (u64, &[u8]) {
    fn signature(&self) -> u64 {
        self.0
    }

    fn text(&self) -> &[u8] {
        self.1
    }
}

fn hash_view<H: Hasher>(view: &dyn KeyView, state: &mut H) {
    state.write_u64(view.signature());
    state.write(view.text());
}

fn views_eq(a: &dyn KeyView, b: &dyn KeyView) -> bool {
    a.signature() == b.signature() && a.text() == b.text()
}

impl Hash for dyn KeyView + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_view(self, state);
    }
}

impl PartialEq for dyn KeyView + '_ {
    fn eq(&self, other: &Self) -> bool {
        views_eq(self, other)
    }
}

impl Eq for dyn KeyView + '_ {}

impl Hash for KmerKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_view(self, state);
    }
}

impl PartialEq for KmerKey {
    fn eq(&self, other: &Self) -> bool {
        views_eq(self, other)
    }
}

impl Eq for KmerKey {}

impl<'a> Borrow<dyn KeyView + 'a> for KmerKey {
    fn borrow(&self) -> &(dyn KeyView + 'a) {
        self
    }
}

/// Hash table of k-mer occurrence counts
///
/// Every stored count is at least 1.
///
/// # Example
///
/// ```
/// use kmerstream::table::FrequencyTable;
///
/// let mut table = FrequencyTable::new();
/// assert_eq!(table.increment(b"ACGT", 7), 1);
/// assert_eq!(table.increment(b"ACGT", 7), 2);
/// // Same text, different signature: a separate entry
/// assert_eq!(table.increment(b"ACGT", 8), 1);
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FrequencyTable {
    counts: HashMap<KmerKey, u64, KeyHasher>,
}

impl FrequencyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            counts: HashMap::with_capacity_and_hasher(capacity, KeyHasher::default()),
        }
    }

    /// Increment the count of a k-mer, inserting it at 1 if absent
    ///
    /// Returns the new count.
    #[inline]
    pub fn increment(&mut self, text: &[u8], signature: u64) -> u64 {
        let lookup = (signature, text);
        if let Some(count) = self.counts.get_mut(&lookup as &dyn KeyView) {
            *count += 1;
            return *count;
        }

        self.counts.insert(
            KmerKey {
                signature,
                text: text.into(),
            },
            1,
        );
        1
    }

    /// Current count of a k-mer, if tracked
    pub fn get(&self, text: &[u8], signature: u64) -> Option<u64> {
        let lookup = (signature, text);
        self.counts.get(&lookup as &dyn KeyView).copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All `(text, count)` pairs in unspecified order
    ///
    /// Calling this again restarts the traversal.
    pub fn entries(&self) -> impl Iterator<Item = (&[u8], u64)> + '_ {
        self.counts.iter().map(|(key, &count)| (&*key.text, count))
    }

    /// Largest count currently stored
    pub fn max_count(&self) -> Option<u64> {
        self.counts.values().copied().max()
    }

    /// Keep only entries whose count satisfies `keep`
    ///
    /// Returns the number of removed entries.
    pub fn retain_counts<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(u64) -> bool,
    {
        let before = self.counts.len();
        self.counts.retain(|_, count| keep(*count));
        before - self.counts.len()
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Approximate memory usage in bytes
    pub fn size_bytes(&self) -> usize {
        let slots = self.counts.capacity()
            * (core::mem::size_of::<KmerKey>() + core::mem::size_of::<u64>());
        let text: usize = self.counts.keys().map(|key| key.text.len()).sum();
        core::mem::size_of::<Self>() + slots + text
    }
}
