//! Per-gene region sets: body, exonic union and intronic complement.

use crate::interval_set::IntervalSet;
use crate::types::{Gene, RegionType};

/// The three region sets of one gene. Built on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRegions {
    pub body: IntervalSet,
    pub exonic: IntervalSet,
    pub intronic: IntervalSet,
}

impl GeneRegions {
    /// Merge every exon of every transcript into the exonic set and take
    /// the rest of the body as intronic.
    ///
    /// Transcript order does not matter. A body fully covered by exons
    /// gives an empty intronic set.
    pub fn build(gene: &Gene) -> Self {
        let body = IntervalSet::from_interval(&gene.body);
        let exonic = IntervalSet::from_intervals(gene.chrom.as_str(), gene.exons());
        let intronic = body.subtract(&exonic);

        GeneRegions {
            body,
            exonic,
            intronic,
        }
    }

    pub fn get(&self, region_type: RegionType) -> &IntervalSet {
        match region_type {
            RegionType::Body => &self.body,
            RegionType::Exonic => &self.exonic,
            RegionType::Intronic => &self.intronic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Convention, RawInterval};
    use crate::interval_set::Span;
    use crate::records::{GeneRecord, TranscriptRecord};
    use crate::types::Strand;

    fn exon(start: i64, end: i64) -> RawInterval {
        RawInterval::new("chr1", start, end, Convention::ZeroBasedHalfOpen)
    }

    fn gene(transcripts: Vec<TranscriptRecord>) -> Gene {
        let mut rec = GeneRecord::new("G1", "G1", "chr1", Strand::Positive);
        rec.transcripts = transcripts;
        Gene::from_record(&rec).unwrap()
    }

    #[test]
    fn test_exonic_union_and_introns() {
        let g = gene(vec![
            TranscriptRecord::new("T1", vec![exon(0, 10), exon(30, 40), exon(60, 100)]),
            TranscriptRecord::new("T2", vec![exon(5, 15), exon(40, 45), exon(80, 90)]),
        ]);
        let regions = GeneRegions::build(&g);

        assert_eq!(regions.body.spans(), &[Span::new(0, 100)]);
        assert_eq!(
            regions.exonic.spans(),
            &[Span::new(0, 15), Span::new(30, 45), Span::new(60, 100)]
        );
        assert_eq!(
            regions.intronic.spans(),
            &[Span::new(15, 30), Span::new(45, 60)]
        );
        assert_eq!(
            regions.exonic.total_length() + regions.intronic.total_length(),
            regions.body.total_length()
        );
    }

    #[test]
    fn test_fully_exonic_gene_has_empty_introns() {
        let g = gene(vec![
            TranscriptRecord::new("T1", vec![exon(0, 50)]),
            TranscriptRecord::new("T2", vec![exon(50, 100)]),
        ]);
        let regions = GeneRegions::build(&g);
        assert!(regions.get(RegionType::Intronic).is_empty());
        assert_eq!(regions.get(RegionType::Exonic).total_length(), 100);
    }
}
