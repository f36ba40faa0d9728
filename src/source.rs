//! Sequence sources
//!
//! Turns a text stream into a lazy sequence of raw sequence lines for the
//! engine. FASTQ records span four lines and only the second holds the
//! sequence; plain input carries one sequence per line. Only the first
//! whitespace-delimited token of a sequence line is kept.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Layout of the input text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceFormat {
    /// Four-line FASTQ records, sequence on the second line
    #[default]
    Fastq,
    /// One sequence per line
    Lines,
}

impl SequenceFormat {
    /// Whether the 1-based physical line `line_no` holds a sequence
    #[inline]
    pub fn is_sequence_line(&self, line_no: u64) -> bool {
        match self {
            Self::Fastq => line_no % 4 == 2,
            Self::Lines => true,
        }
    }
}

/// Iterator over the sequence lines of a reader
///
/// # Example
///
/// ```
/// use kmerstream::source::{SequenceFormat, SequenceReader};
///
/// let fastq = "@r1\nACGT extra\n+\nIIII\n@r2\nGGCC\n+\nIIII\n";
/// let seqs: Vec<_> = SequenceReader::new(fastq.as_bytes(), SequenceFormat::Fastq)
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(seqs, vec![b"ACGT".to_vec(), b"GGCC".to_vec()]);
/// ```
#[derive(Debug)]
pub struct SequenceReader<R> {
    reader: R,
    format: SequenceFormat,
    buf: Vec<u8>,
    lines_read: u64,
}

impl<R: BufRead> SequenceReader<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R, format: SequenceFormat) -> Self {
        Self {
            reader,
            format,
            buf: Vec::new(),
            lines_read: 0,
        }
    }

    /// Physical lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Input layout
    pub fn format(&self) -> SequenceFormat {
        self.format
    }
}

impl SequenceReader<BufReader<File>> {
    /// Open a file
    pub fn open<P: AsRef<Path>>(path: P, format: SequenceFormat) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), format))
    }
}

fn first_token(line: &[u8]) -> &[u8] {
    line.split(|b| b.is_ascii_whitespace())
        .find(|token| !token.is_empty())
        .unwrap_or_default()
}

impl<R: BufRead> Iterator for SequenceReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.lines_read += 1;
                    if self.format.is_sequence_line(self.lines_read) {
                        return Some(Ok(first_token(&self.buf).to_vec()));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fastq_selects_second_line() {
        let input = "@a\nAAAA\n+\n!!!!\n@b\nCCCC\n+\n!!!!\n@c\n";
        let mut reader = SequenceReader::new(input.as_bytes(), SequenceFormat::Fastq);

        assert_eq!(reader.next().unwrap().unwrap(), b"AAAA");
        assert_eq!(reader.next().unwrap().unwrap(), b"CCCC");
        assert!(reader.next().is_none());
        assert_eq!(reader.lines_read(), 9);
    }

    #[test]
    fn test_plain_lines() {
        let input = "ACGT\n\n  TTGG  \r\nCC";
        let seqs: Vec<_> = SequenceReader::new(input.as_bytes(), SequenceFormat::Lines)
            .map(Result::unwrap)
            .collect();

        assert_eq!(
            seqs,
            vec![b"ACGT".to_vec(), Vec::new(), b"TTGG".to_vec(), b"CC".to_vec()]
        );
    }

    #[test]
    fn test_first_token() {
        assert_eq!(first_token(b"ACGT length=4\n"), b"ACGT");
        assert_eq!(first_token(b"\n"), b"");
        assert_eq!(first_token(b"\tGG\n"), b"GG");
    }

    #[test]
    fn test_open_missing_file() {
        let result = SequenceReader::open("/nonexistent/reads.fastq", SequenceFormat::Fastq);
        assert!(result.is_err());
    }
}
