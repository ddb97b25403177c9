//! Coordinate conventions and normalization.
//!
//! Readers tag every raw interval with the convention of its source. The
//! tag is dropped by [`normalize`]: past this point everything is zero-based
//! half-open and the internal types carry no convention at all.

use std::fmt;
use std::str::FromStr;

use crate::error::InvalidIntervalError;
use crate::types::{GenomicInterval, Strand};

/// Coordinate convention of a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    /// `[start, end)`, first base is 0 (BED).
    ZeroBasedHalfOpen,
    /// `[start, end]`, first base is 1 (GTF/GFF).
    OneBasedInclusive,
}

/// Error type for parsing a convention from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConventionError;

impl fmt::Display for ParseConventionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid coordinate convention: expected 'zero_based_half_open' or 'one_based_inclusive'"
        )
    }
}

impl std::error::Error for ParseConventionError {}

impl FromStr for Convention {
    type Err = ParseConventionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero_based_half_open" | "bed" => Ok(Convention::ZeroBasedHalfOpen),
            "one_based_inclusive" | "gtf" => Ok(Convention::OneBasedInclusive),
            _ => Err(ParseConventionError),
        }
    }
}

impl Convention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Convention::ZeroBasedHalfOpen => "zero_based_half_open",
            Convention::OneBasedInclusive => "one_based_inclusive",
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An interval as found in a source file, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInterval {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub convention: Convention,
}

impl RawInterval {
    pub fn new(chrom: impl Into<String>, start: i64, end: i64, convention: Convention) -> Self {
        RawInterval {
            chrom: chrom.into(),
            start,
            end,
            strand: Strand::Unknown,
            convention,
        }
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }
}

/// Convert a raw interval to the internal zero-based half-open form.
///
/// `one_based_inclusive(s, e)` becomes `[s - 1, e)`; zero-based input is
/// taken as is. The result must have `0 <= start < end`.
pub fn normalize(raw: &RawInterval) -> Result<GenomicInterval, InvalidIntervalError> {
    let negative_start = |start: i64| InvalidIntervalError::NegativeStart {
        chrom: raw.chrom.clone(),
        start,
    };
    let start = match raw.convention {
        Convention::ZeroBasedHalfOpen => raw.start,
        Convention::OneBasedInclusive => raw
            .start
            .checked_sub(1)
            .ok_or_else(|| negative_start(raw.start))?,
    };
    let end = raw.end;

    if start < 0 {
        return Err(negative_start(start));
    }
    if start >= end {
        return Err(InvalidIntervalError::EmptyOrInverted {
            chrom: raw.chrom.clone(),
            start,
            end,
        });
    }

    GenomicInterval::new(raw.chrom.clone(), start as u64, end as u64, raw.strand)
}
