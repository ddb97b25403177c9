//! Genome-wide STR index, partitioned by chromosome.
//!
//! Built once per run and then shared read-only by every gene worker.

use ahash::AHashMap;
use log::{debug, info};
use rayon::prelude::*;

use crate::coords::{normalize, Convention};
use crate::error::{InvalidIntervalError, StrIndexError};
use crate::interval_set::{IntervalSet, Span};
use crate::records::RawStrLocus;
use crate::types::StrLocus;

/// STR loci of one chromosome.
#[derive(Debug, Clone, Default)]
pub struct ChromStrs {
    /// Union of all loci, for base-pair overlap.
    merged: IntervalSet,
    /// Original loci sorted by start, for locus counts.
    loci: Vec<Span>,
    /// Motif of each entry in `loci`.
    motifs: Vec<Option<String>>,
    /// Longest single locus; bounds how far back a locus can start and still reach a region.
    max_locus_len: u64,
}

impl ChromStrs {
    fn from_staged(chrom: String, mut staged: Vec<(Span, Option<String>)>) -> Self {
        staged.sort_by_key(|(span, _)| *span);

        let max_locus_len = staged.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
        let (loci, motifs): (Vec<Span>, Vec<Option<String>>) = staged.into_iter().unzip();
        let merged = IntervalSet::from_spans(chrom, loci.iter().copied());

        ChromStrs {
            merged,
            loci,
            motifs,
            max_locus_len,
        }
    }

    pub fn chrom(&self) -> &str {
        self.merged.chrom()
    }

    pub fn merged(&self) -> &IntervalSet {
        &self.merged
    }

    pub fn loci(&self) -> &[Span] {
        &self.loci
    }

    pub fn motif(&self, idx: usize) -> Option<&str> {
        self.motifs.get(idx).and_then(|m| m.as_deref())
    }

    pub fn max_locus_len(&self) -> u64 {
        self.max_locus_len
    }

    /// Loci that can intersect `[start, end)`, with the offset of the first
    /// one in [`ChromStrs::loci`].
    pub fn loci_window(&self, start: u64, end: u64) -> (usize, &[Span]) {
        let lo = self
            .loci
            .partition_point(|l| l.start.saturating_add(self.max_locus_len) <= start);
        let hi = self.loci.partition_point(|l| l.start < end);
        (lo, &self.loci[lo..hi.max(lo)])
    }
}

/// A locus dropped at normalization, with its position in the input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLocus {
    pub record: usize,
    /// BED name column, if the record had one.
    pub name: Option<String>,
    pub error: InvalidIntervalError,
}

/// All STR loci of a run.
#[derive(Debug, Clone, Default)]
pub struct StrIndex {
    by_chrom: AHashMap<String, ChromStrs>,
    rejected: Vec<RejectedLocus>,
    total_loci: usize,
}

impl StrIndex {
    /// Normalize raw loci and index them.
    ///
    /// Records with invalid coordinates are set aside in
    /// [`StrIndex::rejected`]. A stream that switches coordinate convention
    /// part way is an error for the whole index.
    pub fn build<I>(records: I) -> Result<StrIndex, StrIndexError>
    where
        I: IntoIterator<Item = RawStrLocus>,
    {
        let mut convention: Option<Convention> = None;
        let mut staged: AHashMap<String, Vec<(Span, Option<String>)>> = AHashMap::new();
        let mut rejected = Vec::new();

        for (record, raw) in records.into_iter().enumerate() {
            match convention {
                None => convention = Some(raw.interval.convention),
                Some(expected) if expected != raw.interval.convention => {
                    return Err(StrIndexError::MixedConventions {
                        record,
                        expected,
                        found: raw.interval.convention,
                    });
                }
                Some(_) => {}
            }

            match normalize(&raw.interval) {
                Ok(interval) => {
                    let locus = StrLocus::new(interval, raw.motif);
                    stage(&mut staged, locus);
                }
                Err(error) => {
                    debug!(
                        "Rejected STR record {} ({}): {}",
                        record,
                        raw.name.as_deref().unwrap_or("unnamed"),
                        error
                    );
                    rejected.push(RejectedLocus {
                        record,
                        name: raw.name,
                        error,
                    });
                }
            }
        }

        Ok(Self::finish(staged, rejected))
    }

    fn finish(
        staged: AHashMap<String, Vec<(Span, Option<String>)>>,
        rejected: Vec<RejectedLocus>,
    ) -> StrIndex {
        let total_loci = staged.values().map(|v| v.len()).sum();

        let by_chrom: AHashMap<String, ChromStrs> = staged
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(chrom, loci)| (chrom.clone(), ChromStrs::from_staged(chrom, loci)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        info!(
            "Indexed {} STR loci on {} chromosomes ({} rejected)",
            total_loci,
            by_chrom.len(),
            rejected.len()
        );

        StrIndex {
            by_chrom,
            rejected,
            total_loci,
        }
    }

    /// The loci of one chromosome, if it has any.
    pub fn chromosome(&self, chrom: &str) -> Option<&ChromStrs> {
        self.by_chrom.get(chrom)
    }

    /// Number of indexed (accepted) loci.
    pub fn len(&self) -> usize {
        self.total_loci
    }

    pub fn is_empty(&self) -> bool {
        self.total_loci == 0
    }

    pub fn rejected(&self) -> &[RejectedLocus] {
        &self.rejected
    }
}

fn stage(staged: &mut AHashMap<String, Vec<(Span, Option<String>)>>, locus: StrLocus) {
    let span = locus.interval.span();
    let chrom = locus.interval.chrom().to_string();
    staged.entry(chrom).or_default().push((span, locus.motif));
}
