//! Core data structures for strdensity.
//!
//! This module contains the validated value types the engine works on. All
//! of them are built once, at ingestion, from the raw records in
//! [`crate::records`], and are zero-based half-open throughout.

use std::fmt;
use std::str::FromStr;

use crate::coords::normalize;
use crate::error::{GeneError, InvalidIntervalError, MalformedGeneError};
use crate::interval_set::Span;
use crate::records::GeneRecord;

/// Strand orientation for genomic features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Positive,
    Negative,
    Unknown,
}

/// Error type for parsing strand from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrandError;

impl fmt::Display for ParseStrandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid strand: expected '+', '-' or '.'")
    }
}

impl std::error::Error for ParseStrandError {}

impl FromStr for Strand {
    type Err = ParseStrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            "." | "?" => Ok(Strand::Unknown),
            _ => Err(ParseStrandError),
        }
    }
}

impl Strand {
    /// Convert strand to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
            Strand::Unknown => ".",
        }
    }

    /// Two strands conflict only when both are known and differ.
    pub fn is_compatible(&self, other: Strand) -> bool {
        *self == Strand::Unknown || other == Strand::Unknown || *self == other
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Region of a gene that STR overlap is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionType {
    Body,
    Exonic,
    Intronic,
}

/// Every region type, in report order.
pub const ALL_REGION_TYPES: [RegionType; 3] =
    [RegionType::Body, RegionType::Exonic, RegionType::Intronic];

/// Error type for parsing region type from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRegionTypeError;

impl fmt::Display for ParseRegionTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid region type: expected 'body', 'exonic' or 'intronic'"
        )
    }
}

impl std::error::Error for ParseRegionTypeError {}

impl FromStr for RegionType {
    type Err = ParseRegionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "body" => Ok(RegionType::Body),
            "exonic" => Ok(RegionType::Exonic),
            "intronic" => Ok(RegionType::Intronic),
            _ => Err(ParseRegionTypeError),
        }
    }
}

impl RegionType {
    /// Convert region type to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionType::Body => "body",
            RegionType::Exonic => "exonic",
            RegionType::Intronic => "intronic",
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Layout of the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One row per gene and region type.
    Long,
    /// One row per gene, all region types side by side.
    Wide,
}

/// Error type for parsing output format from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutputFormatError;

impl fmt::Display for ParseOutputFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid output format: expected 'long' or 'wide'")
    }
}

impl std::error::Error for ParseOutputFormatError {}

impl FromStr for OutputFormat {
    type Err = ParseOutputFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" => Ok(OutputFormat::Long),
            "wide" => Ok(OutputFormat::Wide),
            _ => Err(ParseOutputFormatError),
        }
    }
}

/// A non-empty zero-based half-open interval on one chromosome.
///
/// Fields are private: the only ways in are [`GenomicInterval::new`] and
/// [`crate::coords::normalize`], both of which enforce `start < end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicInterval {
    chrom: String,
    start: u64,
    end: u64,
    strand: Strand,
}

impl GenomicInterval {
    pub fn new(
        chrom: impl Into<String>,
        start: u64,
        end: u64,
        strand: Strand,
    ) -> Result<Self, InvalidIntervalError> {
        let chrom = chrom.into();
        if start >= end {
            return Err(InvalidIntervalError::EmptyOrInverted {
                chrom,
                start: start as i64,
                end: end as i64,
            });
        }
        Ok(GenomicInterval {
            chrom,
            start,
            end,
            strand,
        })
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Length in bp (`end - start`).
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always false; kept for the `len`/`is_empty` pair.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// `chrom:start-end` in zero-based half-open notation.
    pub fn label(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.label(), self.strand)
    }
}

/// A short tandem repeat locus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrLocus {
    pub interval: GenomicInterval,
    /// Repeat motif as given by the source.
    pub motif: Option<String>,
}

impl StrLocus {
    pub fn new(interval: GenomicInterval, motif: Option<String>) -> Self {
        StrLocus { interval, motif }
    }
}

/// A transcript and its exons, sorted by start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub transcript_id: String,
    pub gene_id: String,
    pub exons: Vec<GenomicInterval>,
}

impl Transcript {
    /// Span from the first exon start to the last exon end.
    pub fn span(&self) -> Option<Span> {
        let start = self.exons.iter().map(|e| e.start()).min()?;
        let end = self.exons.iter().map(|e| e.end()).max()?;
        Some(Span::new(start, end))
    }
}

/// A validated gene model.
///
/// Invariants: at least one transcript, every transcript has at least one
/// exon, every exon is inside `body` and on the gene's chromosome and strand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    pub gene_id: String,
    pub gene_name: String,
    pub chrom: String,
    pub strand: Strand,
    pub body: GenomicInterval,
    pub transcripts: Vec<Transcript>,
}

impl Gene {
    /// Normalize and validate a raw gene record.
    ///
    /// The body always runs from the smallest transcript start to the
    /// largest transcript end. A declared gene span must match it exactly.
    pub fn from_record(record: &GeneRecord) -> Result<Gene, GeneError> {
        if record.transcripts.is_empty() {
            return Err(MalformedGeneError::NoTranscripts.into());
        }

        let mut transcripts = Vec::with_capacity(record.transcripts.len());
        for raw_transcript in &record.transcripts {
            if raw_transcript.exons.is_empty() {
                return Err(
                    MalformedGeneError::EmptyTranscript(raw_transcript.transcript_id.clone())
                        .into(),
                );
            }

            let mut exons = Vec::with_capacity(raw_transcript.exons.len());
            for raw_exon in &raw_transcript.exons {
                let exon = normalize(raw_exon)?;
                if exon.chrom() != record.chrom {
                    return Err(MalformedGeneError::ChromosomeMismatch {
                        transcript: raw_transcript.transcript_id.clone(),
                        exon: exon.label(),
                        expected: record.chrom.clone(),
                        found: exon.chrom().to_string(),
                    }
                    .into());
                }
                if !exon.strand().is_compatible(record.strand) {
                    return Err(MalformedGeneError::StrandMismatch {
                        transcript: raw_transcript.transcript_id.clone(),
                        exon: exon.label(),
                        expected: record.strand.to_string(),
                        found: exon.strand().to_string(),
                    }
                    .into());
                }
                exons.push(exon);
            }
            exons.sort_by_key(|e| (e.start(), e.end()));

            transcripts.push(Transcript {
                transcript_id: raw_transcript.transcript_id.clone(),
                gene_id: record.gene_id.clone(),
                exons,
            });
        }

        // Non-empty transcripts guarantee a span
        let start = transcripts
            .iter()
            .filter_map(|t| t.span())
            .map(|s| s.start)
            .min()
            .unwrap_or(0);
        let end = transcripts
            .iter()
            .filter_map(|t| t.span())
            .map(|s| s.end)
            .max()
            .unwrap_or(0);
        let body = GenomicInterval::new(record.chrom.clone(), start, end, record.strand)?;

        // A declared span only confirms the body, it never widens it
        if let Some(raw_span) = &record.span {
            let declared = normalize(raw_span)?;
            if declared.chrom() != body.chrom() || declared.span() != body.span() {
                return Err(MalformedGeneError::DeclaredSpanMismatch {
                    declared: declared.label(),
                    derived: body.label(),
                }
                .into());
            }
        }

        Ok(Gene {
            gene_id: record.gene_id.clone(),
            gene_name: record.gene_name.clone(),
            chrom: record.chrom.clone(),
            strand: record.strand,
            body,
            transcripts,
        })
    }

    /// Every exon of every transcript.
    pub fn exons(&self) -> impl Iterator<Item = &GenomicInterval> {
        self.transcripts.iter().flat_map(|t| t.exons.iter())
    }
}

/// STR overlap statistics for one region type of one gene.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapResult {
    pub gene_id: String,
    pub gene_name: String,
    pub region_type: RegionType,
    /// Base pairs of the region covered by at least one STR locus.
    pub overlap_bp: u64,
    pub region_length_bp: u64,
    /// Number of input STR records touching the region.
    pub str_loci_count: usize,
    /// `overlap_bp / region_length_bp`; `None` for an empty region.
    pub density: Option<f64>,
}

impl OverlapResult {
    /// Create a new result; density is derived from the two lengths.
    pub fn new(
        gene_id: String,
        gene_name: String,
        region_type: RegionType,
        overlap_bp: u64,
        region_length_bp: u64,
        str_loci_count: usize,
    ) -> Self {
        OverlapResult {
            gene_id,
            gene_name,
            region_type,
            overlap_bp,
            region_length_bp,
            str_loci_count,
            density: density(overlap_bp, region_length_bp),
        }
    }
}

/// Coverage fraction, undefined for an empty region.
pub fn density(overlap_bp: u64, region_length_bp: u64) -> Option<f64> {
    if region_length_bp == 0 {
        None
    } else {
        Some(overlap_bp as f64 / region_length_bp as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Convention, RawInterval};
    use crate::records::TranscriptRecord;

    fn gtf_exon(start: i64, end: i64) -> RawInterval {
        RawInterval::new("chr1", start, end, Convention::OneBasedInclusive)
            .with_strand(Strand::Positive)
    }

    fn record(transcripts: Vec<TranscriptRecord>) -> GeneRecord {
        let mut rec = GeneRecord::new("G1", "Gene1", "chr1", Strand::Positive);
        rec.transcripts = transcripts;
        rec
    }

    #[test]
    fn test_strand_parsing() {
        assert_eq!("+".parse::<Strand>(), Ok(Strand::Positive));
        assert_eq!("-".parse::<Strand>(), Ok(Strand::Negative));
        assert_eq!(".".parse::<Strand>(), Ok(Strand::Unknown));
        assert!("x".parse::<Strand>().is_err());
    }

    #[test]
    fn test_strand_compatibility() {
        assert!(Strand::Positive.is_compatible(Strand::Positive));
        assert!(Strand::Positive.is_compatible(Strand::Unknown));
        assert!(!Strand::Positive.is_compatible(Strand::Negative));
    }

    #[test]
    fn test_region_type_parsing() {
        assert_eq!("body".parse::<RegionType>(), Ok(RegionType::Body));
        assert_eq!("intronic".parse::<RegionType>(), Ok(RegionType::Intronic));
        assert!("Exonic".parse::<RegionType>().is_err());
        assert_eq!(RegionType::Exonic.to_string(), "exonic");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("long".parse::<OutputFormat>(), Ok(OutputFormat::Long));
        assert_eq!("WIDE".parse::<OutputFormat>(), Ok(OutputFormat::Wide));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_genomic_interval_rejects_empty() {
        assert!(GenomicInterval::new("chr1", 10, 10, Strand::Unknown).is_err());
        assert!(GenomicInterval::new("chr1", 11, 10, Strand::Unknown).is_err());
        let iv = GenomicInterval::new("chr1", 10, 11, Strand::Unknown).unwrap();
        assert_eq!(iv.len(), 1);
        assert_eq!(iv.label(), "chr1:10-11");
    }

    #[test]
    fn test_gene_body_derived_from_exons() {
        let rec = record(vec![
            TranscriptRecord::new("T1", vec![gtf_exon(300, 400), gtf_exon(100, 200)]),
            TranscriptRecord::new("T2", vec![gtf_exon(150, 500)]),
        ]);
        let gene = Gene::from_record(&rec).unwrap();
        assert_eq!((gene.body.start(), gene.body.end()), (99, 500));
        // exons sorted by start after construction
        assert_eq!(gene.transcripts[0].exons[0].start(), 99);
        assert_eq!(gene.transcripts[0].gene_id, "G1");
        assert_eq!(gene.exons().count(), 3);
    }

    #[test]
    fn test_gene_without_transcripts_is_malformed() {
        let rec = record(vec![]);
        assert_eq!(
            Gene::from_record(&rec),
            Err(GeneError::Malformed(MalformedGeneError::NoTranscripts))
        );
    }

    #[test]
    fn test_transcript_without_exons_is_malformed() {
        let rec = record(vec![TranscriptRecord::new("T1", vec![])]);
        assert!(matches!(
            Gene::from_record(&rec),
            Err(GeneError::Malformed(MalformedGeneError::EmptyTranscript(id))) if id == "T1"
        ));
    }

    #[test]
    fn test_declared_span_matching_transcripts_is_accepted() {
        let mut rec = record(vec![TranscriptRecord::new(
            "T1",
            vec![gtf_exon(100, 200), gtf_exon(900, 1000)],
        )]);
        rec.span = Some(gtf_exon(100, 1000));
        let gene = Gene::from_record(&rec).unwrap();
        assert_eq!((gene.body.start(), gene.body.end()), (99, 1000));
    }

    #[test]
    fn test_declared_span_wider_than_transcripts_is_malformed() {
        let mut rec = record(vec![TranscriptRecord::new("T1", vec![gtf_exon(100, 200)])]);
        rec.span = Some(gtf_exon(1, 1000));
        assert_eq!(
            Gene::from_record(&rec),
            Err(GeneError::Malformed(MalformedGeneError::DeclaredSpanMismatch {
                declared: "chr1:0-1000".to_string(),
                derived: "chr1:99-200".to_string(),
            }))
        );
    }

    #[test]
    fn test_declared_span_on_other_chromosome_is_malformed() {
        let mut rec = record(vec![TranscriptRecord::new("T1", vec![gtf_exon(100, 200)])]);
        let mut span = gtf_exon(100, 200);
        span.chrom = "chr2".to_string();
        rec.span = Some(span);
        assert!(matches!(
            Gene::from_record(&rec),
            Err(GeneError::Malformed(MalformedGeneError::DeclaredSpanMismatch { .. }))
        ));
    }

    #[test]
    fn test_exon_on_other_strand_or_chrom() {
        let rec = record(vec![TranscriptRecord::new(
            "T1",
            vec![gtf_exon(100, 200).with_strand(Strand::Negative)],
        )]);
        assert!(matches!(
            Gene::from_record(&rec),
            Err(GeneError::Malformed(MalformedGeneError::StrandMismatch { .. }))
        ));

        let mut other_chrom = gtf_exon(100, 200);
        other_chrom.chrom = "chr2".to_string();
        let rec = record(vec![TranscriptRecord::new("T1", vec![other_chrom])]);
        assert!(matches!(
            Gene::from_record(&rec),
            Err(GeneError::Malformed(MalformedGeneError::ChromosomeMismatch { .. }))
        ));
    }

    #[test]
    fn test_invalid_exon_coordinates() {
        let rec = record(vec![TranscriptRecord::new("T1", vec![gtf_exon(200, 100)])]);
        assert!(matches!(
            Gene::from_record(&rec),
            Err(GeneError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_density_undefined_for_empty_region() {
        let res = OverlapResult::new(
            "G1".to_string(),
            "Gene1".to_string(),
            RegionType::Intronic,
            0,
            0,
            0,
        );
        assert_eq!(res.density, None);
        assert_eq!(density(25, 100), Some(0.25));
        assert_eq!(density(0, 100), Some(0.0));
    }
}
