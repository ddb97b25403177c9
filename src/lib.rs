//! strdensity - STR density over gene regions.
//!
//! This library measures how much of each gene is covered by short tandem
//! repeat (STR) loci. For every gene it builds three region sets (gene body,
//! exon union, introns) and reports base-pair overlap, region length, the
//! number of loci touching the region and the resulting density.
//!
//! # Features
//!
//! - Parse GTF and BED files (with gzip support)
//! - Normalize 0-based half-open and 1-based inclusive coordinates
//! - Merge overlapping exons across transcripts into disjoint region sets
//! - Count overlap without double counting nested or overlapping loci
//! - Process genes in parallel with per-gene failure isolation
//!
//! # Example
//!
//! ```ignore
//! use strdensity::config::Config;
//! use strdensity::engine::{aggregate_genes, StrIndex};
//! use strdensity::parser::{parse_bed, parse_gtf};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let gtf_data = parse_gtf(Path::new("annotations.gtf"), &config)?;
//! let index = StrIndex::build(parse_bed(Path::new("strs.bed"))?)?;
//!
//! let batch = aggregate_genes(&gtf_data.genes_by_chrom, &index, &config);
//! for result in batch.results() {
//!     // Process results...
//! }
//! batch.summary().log();
//! ```

pub mod config;
pub mod coords;
pub mod engine;
pub mod error;
pub mod interval_set;
pub mod output;
pub mod parser;
pub mod records;
pub mod types;

pub use config::Config;
pub use coords::{normalize, Convention, RawInterval};
pub use engine::{aggregate_genes, BatchOutcome, GeneReport, StrIndex};
pub use error::{GeneError, InvalidIntervalError, MalformedGeneError, StrIndexError};
pub use interval_set::{IntervalSet, Span};
pub use parser::{BedReader, GtfData};
pub use records::{GeneRecord, RawStrLocus, TranscriptRecord};
pub use types::{Gene, GenomicInterval, OutputFormat, OverlapResult, RegionType, Strand};
