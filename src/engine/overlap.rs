//! Two-pointer sweeps over sorted span lists.
//!
//! `overlap_length` and `intersection` require both sides to be disjoint and
//! sorted, i.e. the spans of an [`IntervalSet`](crate::interval_set::IntervalSet).
//! Raw STR loci that overlap each other must be merged first, otherwise
//! shared positions are counted once per locus.
//!
//! `overlapping_loci` works on the unmerged loci instead, which may overlap,
//! and only needs them sorted by start.

use crate::interval_set::Span;

/// Base pairs where any span of `a` meets any span of `b`.
///
/// Symmetric in its arguments; O(|a| + |b|).
pub fn overlap_length(a: &[Span], b: &[Span]) -> u64 {
    let mut total = 0u64;
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        total += end.saturating_sub(start);

        if a[i].end <= b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    total
}

/// The overlapping sub-intervals of `a` and `b`, sorted and disjoint.
pub fn intersection(a: &[Span], b: &[Span]) -> Vec<Span> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            out.push(Span::new(start, end));
        }

        if a[i].end <= b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    out
}

/// Indices into `loci` of every locus sharing at least one base with `region`.
///
/// `loci` must be sorted by start (overlaps among loci are fine); `region`
/// must be disjoint and sorted. Because loci starts only grow, a region span
/// that ends before one locus starts can never meet a later locus, so the
/// region cursor only moves forward.
pub fn overlapping_loci<'a>(
    loci: &'a [Span],
    region: &'a [Span],
) -> impl Iterator<Item = usize> + 'a {
    let mut cursor = 0;
    loci.iter().enumerate().filter_map(move |(idx, locus)| {
        while cursor < region.len() && region[cursor].end <= locus.start {
            cursor += 1;
        }
        match region.get(cursor) {
            Some(r) if r.intersects(locus) => Some(idx),
            _ => None,
        }
    })
}

/// Number of distinct loci touching `region`; see [`overlapping_loci`].
pub fn overlapping_loci_count(loci: &[Span], region: &[Span]) -> usize {
    overlapping_loci(loci, region).count()
}
