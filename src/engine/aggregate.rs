//! Per-gene aggregation of STR overlap.
//!
//! Each gene is handled on its own: build its region sets, sweep them
//! against the STR loci of its chromosome, return a [`GeneReport`]. There is
//! no shared mutable state, so genes can run on any number of threads.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::Config;
use crate::engine::index::{ChromStrs, StrIndex};
use crate::engine::overlap::{overlap_length, overlapping_loci, overlapping_loci_count};
use crate::engine::regions::GeneRegions;
use crate::error::GeneError;
use crate::interval_set::Span;
use crate::records::GeneRecord;
use crate::types::{Gene, OverlapResult, RegionType};

/// Everything computed for one gene.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneReport {
    pub gene_id: String,
    pub gene_name: String,
    /// One result per requested region type, in request order.
    pub results: Vec<OverlapResult>,
    /// `"<motif length>-mer"` -> number of loci touching the gene body.
    pub motif_classes: BTreeMap<String, usize>,
}

impl GeneReport {
    pub fn result(&self, region_type: RegionType) -> Option<&OverlapResult> {
        self.results.iter().find(|r| r.region_type == region_type)
    }
}

/// Compute overlap results for one validated gene.
///
/// `strs` is the STR set of the gene's chromosome, looked up once by the
/// caller; `None` means the chromosome has no loci.
pub fn aggregate_gene(
    gene: &Gene,
    strs: Option<&ChromStrs>,
    region_types: &[RegionType],
) -> GeneReport {
    let regions = GeneRegions::build(gene);
    let (start, end) = (gene.body.start(), gene.body.end());

    // Every region lies inside the body, so only STR spans near it matter
    let (merged, offset, loci): (&[Span], usize, &[Span]) = match strs {
        Some(chrom_strs) => {
            let (offset, loci) = chrom_strs.loci_window(start, end);
            (chrom_strs.merged().window(start, end), offset, loci)
        }
        None => (&[], 0, &[]),
    };

    let results = region_types
        .iter()
        .map(|&region_type| {
            let set = regions.get(region_type);
            OverlapResult::new(
                gene.gene_id.clone(),
                gene.gene_name.clone(),
                region_type,
                overlap_length(merged, set.spans()),
                set.total_length(),
                overlapping_loci_count(loci, set.spans()),
            )
        })
        .collect();

    let mut motif_classes = BTreeMap::new();
    if let Some(chrom_strs) = strs {
        for idx in overlapping_loci(loci, regions.body.spans()) {
            if let Some(motif) = chrom_strs.motif(offset + idx) {
                *motif_classes
                    .entry(format!("{}-mer", motif.len()))
                    .or_insert(0) += 1;
            }
        }
    }

    GeneReport {
        gene_id: gene.gene_id.clone(),
        gene_name: gene.gene_name.clone(),
        results,
        motif_classes,
    }
}

/// Validate a raw gene record and aggregate it.
pub fn aggregate_record(
    record: &GeneRecord,
    strs: Option<&ChromStrs>,
    region_types: &[RegionType],
) -> Result<GeneReport, GeneError> {
    let gene = Gene::from_record(record)?;
    Ok(aggregate_gene(&gene, strs, region_types))
}

/// Successful reports and per-gene failures of a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub reports: Vec<GeneReport>,
    pub failures: IndexMap<String, GeneError>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// File one gene's outcome.
    pub fn push(&mut self, gene_id: &str, outcome: Result<GeneReport, GeneError>) {
        match outcome {
            Ok(report) => self.reports.push(report),
            Err(err) => {
                debug!("Gene {} failed: {}", gene_id, err);
                self.failures.insert(gene_id.to_string(), err);
            }
        }
    }

    /// All overlap results, gene by gene.
    pub fn results(&self) -> impl Iterator<Item = &OverlapResult> {
        self.reports.iter().flat_map(|r| r.results.iter())
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            succeeded: self.reports.len(),
            ..BatchSummary::default()
        };
        for err in self.failures.values() {
            summary.record_failure(err);
        }
        summary
    }
}

/// Success/failure counts of a run, failures grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub failures_by_kind: BTreeMap<&'static str, usize>,
}

impl BatchSummary {
    pub fn record_failure(&mut self, err: &GeneError) {
        self.failed += 1;
        *self.failures_by_kind.entry(err.kind()).or_insert(0) += 1;
    }

    /// Add the counts of another batch.
    pub fn merge(&mut self, other: &BatchSummary) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        for (kind, count) in &other.failures_by_kind {
            *self.failures_by_kind.entry(*kind).or_insert(0) += count;
        }
    }

    /// Write the summary to the log, one warning per failure kind.
    pub fn log(&self) {
        info!("{}", self);
        for (kind, count) in &self.failures_by_kind {
            warn!("{} genes failed: {}", count, kind);
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} genes succeeded, {} failed",
            self.succeeded, self.failed
        )
    }
}

/// Aggregate every gene of every chromosome in parallel.
///
/// The STR set is looked up once per chromosome. Results keep input order;
/// a failing gene lands in [`BatchOutcome::failures`] and the rest go on.
/// This keeps all reports in memory; the binary streams one
/// [`BatchOutcome`] per work item instead.
pub fn aggregate_genes(
    genes_by_chrom: &IndexMap<String, Vec<GeneRecord>>,
    index: &StrIndex,
    config: &Config,
) -> BatchOutcome {
    let work: Vec<(Option<&ChromStrs>, &GeneRecord)> = genes_by_chrom
        .iter()
        .flat_map(|(chrom, records)| {
            let strs = index.chromosome(chrom);
            records.iter().map(move |record| (strs, record))
        })
        .collect();

    let outcomes: Vec<(&str, Result<GeneReport, GeneError>)> = work
        .par_iter()
        .map(|(strs, record)| {
            (
                record.gene_id.as_str(),
                aggregate_record(record, *strs, &config.regions),
            )
        })
        .collect();

    let mut batch = BatchOutcome::new();
    for (gene_id, outcome) in outcomes {
        batch.push(gene_id, outcome);
    }
    batch
}
