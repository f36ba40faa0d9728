//! Rolling hash over fixed-length windows
//!
//! Every window gets two values:
//!
//! - `raw`: the sum of the byte codes in the window. Sliding the window by
//!   one position updates it in O(1) from the previous window's value.
//! - `signature`: `raw` plus the codes of the first, last and middle bytes.
//!   It is the cheap pre-filter stored with each table key. Collisions are
//!   expected; the table resolves them by comparing the window text.

/// Raw and signature hash of one window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HashPair {
    /// Sum of byte codes, carried to the next window
    pub raw: u64,
    /// Disambiguating hash stored in the table key
    pub signature: u64,
}

/// State carried from one window to the next on the same line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Carry {
    /// Raw hash of the previous window
    pub raw: u64,
    /// First byte of the previous window (the one leaving)
    pub leaving: u8,
}

/// Stateless rolling hash generator
///
/// # Example
///
/// ```
/// use kmerstream::rolling::{Carry, RollingHash};
///
/// let line = b"ACGTT";
/// let first = RollingHash::from_scratch(&line[0..4]);
/// let carry = Carry { raw: first.raw, leaving: line[0] };
/// let second = RollingHash::next(&line[1..5], Some(carry));
///
/// assert_eq!(second, RollingHash::from_scratch(&line[1..5]));
/// ```
pub struct RollingHash;

impl RollingHash {
    /// Hash a window without any previous state
    ///
    /// # Panics
    ///
    /// Panics if `window` is empty.
    pub fn from_scratch(window: &[u8]) -> HashPair {
        let raw: u64 = window.iter().map(|&b| u64::from(b)).sum();
        HashPair {
            raw,
            signature: signature_of(window, raw),
        }
    }

    /// Hash `window`, reusing the previous window's raw hash when available
    ///
    /// With `prev` present, `window` must be the previous window shifted by
    /// exactly one position.
    #[inline]
    pub fn next(window: &[u8], prev: Option<Carry>) -> HashPair {
        match prev {
            None => Self::from_scratch(window),
            Some(carry) => {
                let entering = window[window.len() - 1];
                let raw = carry.raw + u64::from(entering) - u64::from(carry.leaving);
                HashPair {
                    raw,
                    signature: signature_of(window, raw),
                }
            }
        }
    }
}

/// Signature hash of a window whose raw hash is already known
#[inline]
pub fn signature_of(window: &[u8], raw: u64) -> u64 {
    let first = window[0];
    let last = window[window.len() - 1];
    let middle = window[window.len() / 2];
    raw + u64::from(first) + u64::from(last) + u64::from(middle)
}

/// Iterator over all windows of length `k` in a line, with their hashes
///
/// The first window is hashed from scratch, every later one incrementally.
#[derive(Clone, Debug)]
pub struct Windows<'a> {
    line: &'a [u8],
    k: usize,
    pos: usize,
    carry: Option<Carry>,
}

impl<'a> Windows<'a> {
    /// Create a window iterator
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(line: &'a [u8], k: usize) -> Self {
        assert!(k > 0, "window length must be positive");
        Self {
            line,
            k,
            pos: 0,
            carry: None,
        }
    }

    /// Number of windows left to yield
    pub fn remaining(&self) -> usize {
        (self.line.len() + 1).saturating_sub(self.pos + self.k)
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = (&'a [u8], HashPair);

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.pos + self.k;
        if end > self.line.len() {
            return None;
        }

        let window = &self.line[self.pos..end];
        let hash = RollingHash::next(window, self.carry);
        self.carry = Some(Carry {
            raw: hash.raw,
            leaving: window[0],
        });
        self.pos += 1;

        Some((window, hash))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Windows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scratch() {
        // A=65 C=67 G=71 T=84
        let h = RollingHash::from_scratch(b"ACGT");
        assert_eq!(h.raw, 65 + 67 + 71 + 84);
        // first A, last T, middle index 2 = G
        assert_eq!(h.signature, h.raw + 65 + 84 + 71);
    }

    #[test]
    fn test_single_byte_window() {
        let h = RollingHash::from_scratch(b"G");
        assert_eq!(h.raw, 71);
        assert_eq!(h.signature, 71 * 4);
    }

    #[test]
    fn test_incremental_matches_scratch() {
        let line = b"ACGTTGCAAGGCTTAACCGGTTAACGTACGATCG";
        let k = 7;

        for (i, (window, hash)) in Windows::new(line, k).enumerate() {
            assert_eq!(window, &line[i..i + k]);
            assert_eq!(hash, RollingHash::from_scratch(window), "window {}", i);
        }
    }

    #[test]
    fn test_window_count() {
        let line = b"ACGTACGTAC";
        assert_eq!(Windows::new(line, 3).count(), 8);
        assert_eq!(Windows::new(line, 10).count(), 1);
        assert_eq!(Windows::new(line, 11).count(), 0);
        assert_eq!(Windows::new(line, 3).len(), 8);
    }

    #[test]
    fn test_signature_separates_rotations() {
        // Same byte multiset, so same raw hash
        let a = RollingHash::from_scratch(b"AACC");
        let b = RollingHash::from_scratch(b"CCAA");
        assert_eq!(a.raw, b.raw);
        assert_ne!(a.signature, b.signature);
    }
}
