//! Readers for STR loci (BED) and gene models (GTF).
//!
//! Readers only split and tag records with their coordinate convention;
//! normalization and validation happen in the engine.

pub mod bed;
pub mod gtf;
pub mod util;

pub use bed::{parse_bed, BedReader};
pub use gtf::{parse_gtf, GtfData};
