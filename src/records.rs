//! Raw records as produced by the readers.
//!
//! Coordinates here are still in the source's convention. Nothing outside
//! ingestion (the STR index build and [`crate::types::Gene::from_record`])
//! should look at them.

use crate::coords::RawInterval;
use crate::types::Strand;

/// An STR locus straight from a BED-like source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStrLocus {
    pub interval: RawInterval,
    pub name: Option<String>,
    pub motif: Option<String>,
}

impl RawStrLocus {
    pub fn new(interval: RawInterval) -> Self {
        RawStrLocus {
            interval,
            name: None,
            motif: None,
        }
    }

    pub fn with_motif(mut self, motif: impl Into<String>) -> Self {
        self.motif = Some(motif.into());
        self
    }
}

/// A transcript and its exons, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRecord {
    pub transcript_id: String,
    pub exons: Vec<RawInterval>,
}

impl TranscriptRecord {
    pub fn new(transcript_id: impl Into<String>, exons: Vec<RawInterval>) -> Self {
        TranscriptRecord {
            transcript_id: transcript_id.into(),
            exons,
        }
    }
}

/// A gene with its transcripts, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    pub gene_id: String,
    pub gene_name: String,
    pub chrom: String,
    pub strand: Strand,
    /// Declared gene span (a GTF `gene` line), if the source had one.
    pub span: Option<RawInterval>,
    pub transcripts: Vec<TranscriptRecord>,
}

impl GeneRecord {
    pub fn new(
        gene_id: impl Into<String>,
        gene_name: impl Into<String>,
        chrom: impl Into<String>,
        strand: Strand,
    ) -> Self {
        GeneRecord {
            gene_id: gene_id.into(),
            gene_name: gene_name.into(),
            chrom: chrom.into(),
            strand,
            span: None,
            transcripts: Vec::new(),
        }
    }
}
