//! Cross-module tests for strdensity.
//!
//! These cover properties that hold across the interval set, the overlap
//! sweeps and the per-gene aggregation, plus the SAMD11 regression case.

use indexmap::IndexMap;
use rstest::rstest;

use strdensity::config::Config;
use strdensity::coords::{normalize, Convention, RawInterval};
use strdensity::engine::{
    aggregate_genes, aggregate_record, overlap_length, overlapping_loci_count, GeneRegions,
    StrIndex,
};
use strdensity::error::{GeneError, InvalidIntervalError, MalformedGeneError, StrIndexError};
use strdensity::interval_set::{IntervalSet, Span};
use strdensity::records::{GeneRecord, RawStrLocus, TranscriptRecord};
use strdensity::types::{Gene, RegionType, Strand};

// -------------------------------------------------------------------------
// Helper functions
// -------------------------------------------------------------------------

/// Small deterministic generator so property tests are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn span(&mut self, max_start: u64, max_len: u64) -> Span {
        let start = self.next() % max_start;
        let len = self.next() % max_len;
        Span::new(start, start + len)
    }
}

fn gtf_exon(start: i64, end: i64) -> RawInterval {
    RawInterval::new("chr1", start, end, Convention::OneBasedInclusive).with_strand(Strand::Positive)
}

fn bed_locus(chrom: &str, start: i64, end: i64) -> RawStrLocus {
    RawStrLocus::new(RawInterval::new(
        chrom,
        start,
        end,
        Convention::ZeroBasedHalfOpen,
    ))
}

/// Covered positions, one by one. Slow but obviously correct.
fn positions(spans: &[Span]) -> Vec<u64> {
    let mut out: Vec<u64> = spans.iter().flat_map(|s| s.start..s.end).collect();
    out.sort_unstable();
    out.dedup();
    out
}

fn assert_disjoint_sorted(set: &IntervalSet) {
    for pair in set.spans().windows(2) {
        assert!(
            pair[0].end < pair[1].start,
            "spans {:?} and {:?} overlap or touch",
            pair[0],
            pair[1]
        );
    }
    for span in set.spans() {
        assert!(span.start < span.end, "empty span {:?}", span);
    }
}

fn samd11_record() -> GeneRecord {
    let mut rec = GeneRecord::new("ENSG00000187634", "SAMD11", "chr1", Strand::Positive);
    rec.span = Some(gtf_exon(923923, 944575));
    rec.transcripts = vec![
        TranscriptRecord::new(
            "ENST00000342066",
            vec![
                gtf_exon(925922, 926013),
                gtf_exon(930155, 930336),
                gtf_exon(931039, 931089),
                gtf_exon(939272, 939460),
                gtf_exon(941144, 941306),
                gtf_exon(943698, 944575),
            ],
        ),
        TranscriptRecord::new(
            "ENST00000616016",
            vec![
                gtf_exon(923923, 924948),
                gtf_exon(925922, 926013),
                gtf_exon(939275, 939460),
                gtf_exon(941307, 941400),
                gtf_exon(943698, 944575),
            ],
        ),
    ];
    rec
}

fn samd11_loci() -> Vec<RawStrLocus> {
    vec![
        bed_locus("chr1", 900000, 900030),
        bed_locus("chr1", 923900, 923930).with_motif("AC"),
        bed_locus("chr1", 926005, 926020).with_motif("AAAG"),
        bed_locus("chr1", 926010, 926020).with_motif("AG"),
        bed_locus("chr1", 935000, 935012).with_motif("CAG"),
        bed_locus("chr1", 939460, 939470).with_motif("AC"),
        bed_locus("chr1", 941397, 941415).with_motif("TTTA"),
        bed_locus("chr1", 941400, 941410).with_motif("AT"),
        bed_locus("chr1", 944570, 944590),
        bed_locus("chr1", 950000, 950012),
        bed_locus("chr2", 930000, 930050),
    ]
}

// -------------------------------------------------------------------------
// 1. Interval set properties
// -------------------------------------------------------------------------

mod test_interval_set_properties {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_is_idempotent() {
        let mut rng = Lcg(7);
        let spans: Vec<Span> = (0..200).map(|_| rng.span(10_000, 300)).collect();

        let once = IntervalSet::from_spans("chr1", spans.iter().copied());
        let twice = IntervalSet::from_spans("chr1", once.spans().iter().copied());
        assert_eq!(once, twice);

        let mut reinserted = once.clone();
        for span in once.spans() {
            reinserted.insert(*span);
        }
        assert_eq!(reinserted, once);
    }

    #[test]
    fn test_disjoint_after_arbitrary_inserts() {
        let mut rng = Lcg(42);
        let mut set = IntervalSet::new("chr1");
        let mut inserted = Vec::new();

        for _ in 0..500 {
            let span = rng.span(5_000, 120);
            set.insert(span);
            inserted.push(span);
            assert_disjoint_sorted(&set);
        }

        assert_eq!(positions(set.spans()), positions(&inserted));
        assert_eq!(set.total_length() as usize, positions(&inserted).len());
    }

    #[test]
    fn test_insert_agrees_with_bulk_construction() {
        let mut rng = Lcg(3);
        let spans: Vec<Span> = (0..300).map(|_| rng.span(2_000, 50)).collect();

        let mut incremental = IntervalSet::new("chr1");
        for span in &spans {
            incremental.insert(*span);
        }
        assert_eq!(incremental, IntervalSet::from_spans("chr1", spans));
    }

    #[rstest]
    #[case(vec![(10, 20), (20, 30)], vec![(10, 30)])]
    #[case(vec![(10, 20), (21, 30)], vec![(10, 20), (21, 30)])]
    #[case(vec![(0, 100), (10, 20), (50, 60)], vec![(0, 100)])]
    #[case(vec![(5, 5), (7, 9)], vec![(7, 9)])]
    fn test_touching_and_nested_spans(
        #[case] input: Vec<(u64, u64)>,
        #[case] expected: Vec<(u64, u64)>,
    ) {
        let set = IntervalSet::from_spans("chr1", input.into_iter().map(|(s, e)| Span::new(s, e)));
        let expected: Vec<Span> = expected.into_iter().map(|(s, e)| Span::new(s, e)).collect();
        assert_eq!(set.spans(), expected.as_slice());
    }
}

// -------------------------------------------------------------------------
// 2. Overlap properties
// -------------------------------------------------------------------------

mod test_overlap_properties {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overlap_is_symmetric() {
        let mut rng = Lcg(11);
        for _ in 0..50 {
            let a = IntervalSet::from_spans("chr1", (0..40).map(|_| rng.span(3_000, 80)));
            let b = IntervalSet::from_spans("chr1", (0..40).map(|_| rng.span(3_000, 80)));
            assert_eq!(
                overlap_length(a.spans(), b.spans()),
                overlap_length(b.spans(), a.spans())
            );
            assert_eq!(a.overlap_length(&b), b.overlap_length(&a));
        }
    }

    #[test]
    fn test_overlap_matches_position_count() {
        let mut rng = Lcg(19);
        for _ in 0..50 {
            let a = IntervalSet::from_spans("chr1", (0..30).map(|_| rng.span(2_000, 60)));
            let b = IntervalSet::from_spans("chr1", (0..30).map(|_| rng.span(2_000, 60)));
            let pa = positions(a.spans());
            let pb = positions(b.spans());
            let shared = pa.iter().filter(|p| pb.binary_search(p).is_ok()).count();
            assert_eq!(a.overlap_length(&b) as usize, shared);
            assert_eq!(a.intersection(&b).total_length() as usize, shared);
        }
    }

    #[test]
    fn test_no_double_counting_of_nested_loci() {
        let index = StrIndex::build(vec![
            bed_locus("chr1", 100, 200),
            bed_locus("chr1", 120, 140),
            bed_locus("chr1", 150, 250),
        ])
        .unwrap();
        let strs = index.chromosome("chr1").unwrap();
        let region = [Span::new(0, 1_000)];

        // union is [100, 250)
        assert_eq!(overlap_length(strs.merged().spans(), &region), 150);
        assert_eq!(overlapping_loci_count(strs.loci(), &region), 3);
    }

    #[test]
    fn test_different_chromosomes_share_nothing() {
        let a = IntervalSet::from_spans("chr1", vec![Span::new(0, 100)]);
        let b = IntervalSet::from_spans("chr2", vec![Span::new(0, 100)]);
        assert_eq!(a.overlap_length(&b), 0);
        assert_eq!(a.subtract(&b), a);
    }
}

// -------------------------------------------------------------------------
// 3. Gene region properties
// -------------------------------------------------------------------------

mod test_gene_regions {
    use super::*;
    use pretty_assertions::assert_eq;

    fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let first = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, first.clone());
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_exon_union_is_order_independent() {
        let transcripts = vec![
            TranscriptRecord::new("T1", vec![gtf_exon(101, 200), gtf_exon(401, 500)]),
            TranscriptRecord::new("T2", vec![gtf_exon(450, 600), gtf_exon(150, 260)]),
            TranscriptRecord::new("T3", vec![gtf_exon(601, 650)]),
            TranscriptRecord::new("T4", vec![gtf_exon(801, 900), gtf_exon(120, 130)]),
        ];

        let mut reference: Option<GeneRegions> = None;
        for order in permutations(&transcripts) {
            let mut rec = GeneRecord::new("G1", "G1", "chr1", Strand::Positive);
            rec.transcripts = order;
            let regions = GeneRegions::build(&Gene::from_record(&rec).unwrap());
            match &reference {
                None => reference = Some(regions),
                Some(expected) => assert_eq!(&regions, expected),
            }
        }

        let regions = reference.unwrap();
        assert_eq!(
            regions.exonic.spans(),
            &[Span::new(100, 260), Span::new(400, 650), Span::new(800, 900)]
        );
    }

    #[test]
    fn test_partition_identity() {
        let gene = Gene::from_record(&samd11_record()).unwrap();
        let regions = GeneRegions::build(&gene);

        assert_eq!(
            regions.exonic.total_length() + regions.intronic.total_length(),
            regions.body.total_length()
        );
        assert_eq!(regions.exonic.overlap_length(&regions.intronic), 0);
    }

    #[test]
    fn test_partition_identity_for_str_overlap() {
        let gene = Gene::from_record(&samd11_record()).unwrap();
        let regions = GeneRegions::build(&gene);
        let index = StrIndex::build(samd11_loci()).unwrap();
        let merged = index.chromosome("chr1").unwrap().merged();

        assert_eq!(
            merged.overlap_length(&regions.exonic) + merged.overlap_length(&regions.intronic),
            merged.overlap_length(&regions.body)
        );
    }

    #[test]
    fn test_body_comes_from_transcripts_not_gene_line() {
        let mut rec = GeneRecord::new("G1", "G1", "chr1", Strand::Positive);
        rec.transcripts = vec![TranscriptRecord::new("T1", vec![gtf_exon(100, 200)])];

        let report = aggregate_record(&rec, None, &[RegionType::Body, RegionType::Intronic]).unwrap();
        assert_eq!(report.result(RegionType::Body).unwrap().region_length_bp, 101);
        assert_eq!(report.result(RegionType::Intronic).unwrap().region_length_bp, 0);

        // a wider gene line must not stretch the body
        rec.span = Some(gtf_exon(1, 1000));
        let err = aggregate_record(&rec, None, &[RegionType::Body]).unwrap_err();
        assert!(matches!(
            err,
            GeneError::Malformed(MalformedGeneError::DeclaredSpanMismatch { .. })
        ));
        assert_eq!(err.kind(), "declared_span_mismatch");
    }
}

// -------------------------------------------------------------------------
// 4. Coordinate conventions
// -------------------------------------------------------------------------

mod test_conventions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_same_locus_in_both_conventions() {
        let bed = normalize(&RawInterval::new("chr1", 99, 200, Convention::ZeroBasedHalfOpen))
            .unwrap();
        let gtf = normalize(&RawInterval::new("chr1", 100, 200, Convention::OneBasedInclusive))
            .unwrap();
        assert_eq!(bed, gtf);
        assert_eq!(bed.len(), 101);
    }

    #[test]
    fn test_mixed_conventions_fail_the_index() {
        let result = StrIndex::build(vec![
            bed_locus("chr1", 10, 20),
            RawStrLocus::new(RawInterval::new("chr1", 30, 40, Convention::OneBasedInclusive)),
        ]);
        assert_eq!(
            result.unwrap_err(),
            StrIndexError::MixedConventions {
                record: 1,
                expected: Convention::ZeroBasedHalfOpen,
                found: Convention::OneBasedInclusive,
            }
        );
    }

    #[test]
    fn test_extreme_gtf_start_fails_only_its_gene() {
        let mut rec = GeneRecord::new("G1", "G1", "chr1", Strand::Positive);
        rec.transcripts = vec![TranscriptRecord::new("T1", vec![gtf_exon(i64::MIN, 10)])];

        let err = aggregate_record(&rec, None, &[RegionType::Body]).unwrap_err();
        assert_eq!(
            err,
            GeneError::InvalidInterval(InvalidIntervalError::NegativeStart {
                chrom: "chr1".to_string(),
                start: i64::MIN,
            })
        );
        assert_eq!(err.kind(), "invalid_interval");
    }
}

// -------------------------------------------------------------------------
// 5. SAMD11 regression
// -------------------------------------------------------------------------

mod test_samd11_regression {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_samd11_overlap() {
        let index = StrIndex::build(samd11_loci()).unwrap();
        let report = aggregate_record(
            &samd11_record(),
            index.chromosome("chr1"),
            &[RegionType::Body, RegionType::Exonic, RegionType::Intronic],
        )
        .unwrap();

        let body = report.result(RegionType::Body).unwrap();
        assert_eq!(body.overlap_bp, 68);
        assert_eq!(body.region_length_bp, 20653);
        assert_eq!(body.str_loci_count, 8);

        let exonic = report.result(RegionType::Exonic).unwrap();
        assert_eq!(exonic.overlap_bp, 24);
        assert_eq!(exonic.region_length_bp, 2675);
        assert_eq!(exonic.str_loci_count, 5);

        let intronic = report.result(RegionType::Intronic).unwrap();
        assert_eq!(intronic.overlap_bp, 44);
        assert_eq!(intronic.region_length_bp, 17978);
        assert_eq!(intronic.str_loci_count, 6);

        assert_eq!(report.motif_classes.get("2-mer"), Some(&4));
        assert_eq!(report.motif_classes.get("3-mer"), Some(&1));
        assert_eq!(report.motif_classes.get("4-mer"), Some(&2));
    }

    #[test]
    fn test_samd11_through_batch() {
        let mut genes_by_chrom = IndexMap::new();
        genes_by_chrom.insert("chr1".to_string(), vec![samd11_record()]);
        let index = StrIndex::build(samd11_loci()).unwrap();

        let batch = aggregate_genes(&genes_by_chrom, &index, &Config::default());
        assert!(batch.failures.is_empty());

        let overlaps: Vec<(RegionType, u64)> = batch
            .results()
            .map(|r| (r.region_type, r.overlap_bp))
            .collect();
        assert_eq!(
            overlaps,
            vec![
                (RegionType::Body, 68),
                (RegionType::Exonic, 24),
                (RegionType::Intronic, 44),
            ]
        );
    }

    #[test]
    fn test_zero_length_intronic_region_has_no_density() {
        let mut rec = GeneRecord::new("G1", "G1", "chr1", Strand::Positive);
        rec.transcripts = vec![TranscriptRecord::new("T1", vec![gtf_exon(1001, 1100)])];
        let index = StrIndex::build(vec![bed_locus("chr1", 1050, 1060)]).unwrap();

        let report =
            aggregate_record(&rec, index.chromosome("chr1"), &[RegionType::Intronic]).unwrap();
        let intronic = &report.results[0];
        assert_eq!(intronic.region_length_bp, 0);
        assert_eq!(intronic.overlap_bp, 0);
        assert_eq!(intronic.density, None);
    }
}
