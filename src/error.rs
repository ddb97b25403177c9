//! Error types for interval normalization, gene construction and STR indexing.
//!
//! Per-record and per-gene errors are values that callers collect; only
//! [`StrIndexError`] is meant to stop a whole run.

use thiserror::Error;

use crate::coords::Convention;

/// A raw interval that cannot be expressed as a non-empty half-open interval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidIntervalError {
    #[error("negative start {start} on {chrom}")]
    NegativeStart { chrom: String, start: i64 },

    #[error("empty or inverted interval {chrom}:{start}-{end} (start must be < end)")]
    EmptyOrInverted { chrom: String, start: i64, end: i64 },
}

/// A gene model that violates the gene/transcript/exon invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedGeneError {
    #[error("gene has no transcripts")]
    NoTranscripts,

    #[error("transcript {0} has no exons")]
    EmptyTranscript(String),

    #[error("exon {exon} of transcript {transcript} is on {found}, gene is on {expected}")]
    ChromosomeMismatch {
        transcript: String,
        exon: String,
        expected: String,
        found: String,
    },

    #[error("exon {exon} of transcript {transcript} is on strand {found}, gene is on {expected}")]
    StrandMismatch {
        transcript: String,
        exon: String,
        expected: String,
        found: String,
    },

    #[error("declared gene span {declared} does not match transcript span {derived}")]
    DeclaredSpanMismatch { declared: String, derived: String },
}

/// Reason a single gene could not be aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneError {
    #[error("invalid coordinates: {0}")]
    InvalidInterval(#[from] InvalidIntervalError),

    #[error("malformed gene: {0}")]
    Malformed(#[from] MalformedGeneError),
}

impl GeneError {
    /// Short label used to group failures in the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneError::InvalidInterval(_) => "invalid_interval",
            GeneError::Malformed(MalformedGeneError::NoTranscripts) => "no_transcripts",
            GeneError::Malformed(MalformedGeneError::EmptyTranscript(_)) => "empty_transcript",
            GeneError::Malformed(MalformedGeneError::ChromosomeMismatch { .. }) => {
                "chromosome_mismatch"
            }
            GeneError::Malformed(MalformedGeneError::StrandMismatch { .. }) => "strand_mismatch",
            GeneError::Malformed(MalformedGeneError::DeclaredSpanMismatch { .. }) => {
                "declared_span_mismatch"
            }
        }
    }
}

/// Failure of the shared STR index. Every gene depends on it, so it is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrIndexError {
    #[error(
        "STR record {record} uses {found} coordinates but the stream started with {expected}"
    )]
    MixedConventions {
        record: usize,
        expected: Convention,
        found: Convention,
    },
}
