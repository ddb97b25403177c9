//! STR overlap engine: region sets, sweeps, indexing and per-gene aggregation.

pub mod aggregate;
pub mod index;
pub mod overlap;
pub mod regions;

pub use aggregate::{
    aggregate_gene, aggregate_genes, aggregate_record, BatchOutcome, BatchSummary, GeneReport,
};
pub use index::{ChromStrs, RejectedLocus, StrIndex};
pub use overlap::{intersection, overlap_length, overlapping_loci, overlapping_loci_count};
pub use regions::GeneRegions;
