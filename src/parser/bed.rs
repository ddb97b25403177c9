//! BED reader for STR loci, with gzip support.
//!
//! Expected columns: `chrom start end [name [motif ...]]`, zero-based
//! half-open. Extra columns are ignored.

use anyhow::{Context, Result};
use log::debug;
use std::io::BufRead;
use std::path::Path;

use crate::coords::{Convention, RawInterval};
use crate::parser::util::open_input;
use crate::records::RawStrLocus;

/// Streaming BED reader for chunked processing.
pub struct BedReader {
    reader: Box<dyn BufRead + Send>,
    line_number: usize,
    skipped_lines: usize,
}

impl BedReader {
    /// Create a new BedReader from a file path (supports .gz).
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self::from_reader(open_input(path)?))
    }

    pub fn from_reader(reader: Box<dyn BufRead + Send>) -> Self {
        BedReader {
            reader,
            line_number: 0,
            skipped_lines: 0,
        }
    }

    /// Non-empty lines that were not loci (headers, comments, short rows).
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Read the next chunk of loci, in file order.
    ///
    /// Returns `None` at EOF.
    pub fn read_chunk(&mut self, size: usize) -> Result<Option<Vec<RawStrLocus>>> {
        let mut loci = Vec::with_capacity(size);
        let mut line = String::new();

        while loci.len() < size {
            line.clear();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .with_context(|| format!("Failed to read BED line {}", self.line_number + 1))?;

            if bytes_read == 0 {
                break;
            }
            self.line_number += 1;

            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }

            match parse_line(trimmed) {
                Some(locus) => loci.push(locus),
                None => {
                    debug!("Skipping BED line {}: {}", self.line_number, trimmed);
                    self.skipped_lines += 1;
                }
            }
        }

        if loci.is_empty() {
            Ok(None)
        } else {
            Ok(Some(loci))
        }
    }
}

/// Parse a single BED line. Headers, `track`/`browser` lines, comments and
/// rows whose coordinates are not integers yield `None`.
fn parse_line(line: &str) -> Option<RawStrLocus> {
    if line.starts_with('#') || line.starts_with("track") || line.starts_with("browser") {
        return None;
    }

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 3 {
        return None;
    }

    let start: i64 = fields[1].trim().parse().ok()?;
    let end: i64 = fields[2].trim().parse().ok()?;

    let optional = |idx: usize| {
        fields
            .get(idx)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && *s != ".")
            .map(|s| s.to_string())
    };

    Some(RawStrLocus {
        interval: RawInterval::new(fields[0], start, end, Convention::ZeroBasedHalfOpen),
        name: optional(3),
        motif: optional(4),
    })
}

/// Read every locus of a BED file.
pub fn parse_bed(path: &Path) -> Result<Vec<RawStrLocus>> {
    read_all(BedReader::new(path)?)
}

fn read_all(mut reader: BedReader) -> Result<Vec<RawStrLocus>> {
    let mut loci = Vec::new();
    while let Some(chunk) = reader.read_chunk(100_000)? {
        loci.extend(chunk);
    }
    if reader.skipped_lines() > 0 {
        debug!("Skipped {} non-locus BED lines", reader.skipped_lines());
    }
    Ok(loci)
}
