//! Disjoint interval sets on a single chromosome.
//!
//! An [`IntervalSet`] keeps its spans sorted by start with a gap between any
//! two neighbours (`a.end < b.start`). Overlapping or touching spans are
//! merged on every mutation, so the set is always the canonical form of the
//! positions it covers.

use crate::engine::overlap;
use crate::types::GenomicInterval;

/// A chromosome-free half-open range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    pub fn new(start: u64, end: u64) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Overlapping or touching (`[1,5)` and `[5,9)` merge into `[1,9)`).
    pub fn merges_with(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// At least one shared base.
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Sorted, disjoint, non-adjacent spans on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntervalSet {
    chrom: String,
    spans: Vec<Span>,
}

impl IntervalSet {
    /// Create an empty set on `chrom`.
    pub fn new(chrom: impl Into<String>) -> Self {
        IntervalSet {
            chrom: chrom.into(),
            spans: Vec::new(),
        }
    }

    /// Bulk construction: sort once, then merge in a single pass.
    ///
    /// Empty spans are skipped; they cover no positions.
    pub fn from_spans<I>(chrom: impl Into<String>, spans: I) -> Self
    where
        I: IntoIterator<Item = Span>,
    {
        let mut sorted: Vec<Span> = spans.into_iter().filter(|s| !s.is_empty()).collect();
        sorted.sort_unstable();

        let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
        for span in sorted {
            match merged.last_mut() {
                Some(last) if last.merges_with(&span) => {
                    last.end = last.end.max(span.end);
                }
                _ => merged.push(span),
            }
        }

        IntervalSet {
            chrom: chrom.into(),
            spans: merged,
        }
    }

    /// Bulk construction from intervals that all lie on `chrom`.
    pub fn from_intervals<'a, I>(chrom: impl Into<String>, intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a GenomicInterval>,
    {
        Self::from_spans(chrom, intervals.into_iter().map(|iv| iv.span()))
    }

    /// Set holding one interval.
    pub fn from_interval(interval: &GenomicInterval) -> Self {
        IntervalSet {
            chrom: interval.chrom().to_string(),
            spans: vec![interval.span()],
        }
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    /// Number of disjoint spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Insert one span, merging with every span it overlaps or touches.
    pub fn insert(&mut self, span: Span) {
        if span.is_empty() {
            return;
        }

        // first span that ends at or after span.start
        let lo = self.spans.partition_point(|s| s.end < span.start);
        // one past the last span that starts at or before span.end
        let hi = lo + self.spans[lo..].partition_point(|s| s.start <= span.end);

        if lo == hi {
            self.spans.insert(lo, span);
            return;
        }

        let merged = Span::new(
            span.start.min(self.spans[lo].start),
            span.end.max(self.spans[hi - 1].end),
        );
        self.spans.splice(lo..hi, std::iter::once(merged));
    }

    /// Sum of span lengths.
    pub fn total_length(&self) -> u64 {
        self.spans.iter().map(|s| s.len()).sum()
    }

    /// The contiguous run of spans that can intersect `[start, end)`.
    pub fn window(&self, start: u64, end: u64) -> &[Span] {
        let lo = self.spans.partition_point(|s| s.end <= start);
        let hi = self.spans.partition_point(|s| s.start < end);
        &self.spans[lo..hi.max(lo)]
    }

    /// Positions of `self` not covered by `other`.
    ///
    /// Sets on different chromosomes share nothing, so the result is a copy
    /// of `self`.
    pub fn subtract(&self, other: &IntervalSet) -> IntervalSet {
        if self.chrom != other.chrom || other.is_empty() {
            return self.clone();
        }

        let cut = &other.spans;
        let mut out = Vec::with_capacity(self.spans.len());
        let mut j = 0;

        for span in &self.spans {
            while j < cut.len() && cut[j].end <= span.start {
                j += 1;
            }

            let mut cursor = span.start;
            let mut k = j;
            while k < cut.len() && cut[k].start < span.end {
                if cut[k].start > cursor {
                    out.push(Span::new(cursor, cut[k].start));
                }
                cursor = cursor.max(cut[k].end);
                if cursor >= span.end {
                    // cut[k] may reach into the next span
                    break;
                }
                k += 1;
            }
            if cursor < span.end {
                out.push(Span::new(cursor, span.end));
            }
            j = k;
        }

        IntervalSet {
            chrom: self.chrom.clone(),
            spans: out,
        }
    }

    /// Base pairs covered by both sets.
    pub fn overlap_length(&self, other: &IntervalSet) -> u64 {
        if self.chrom != other.chrom {
            return 0;
        }
        overlap::overlap_length(&self.spans, &other.spans)
    }

    /// The sub-intervals covered by both sets.
    pub fn intersection(&self, other: &IntervalSet) -> IntervalSet {
        let spans = if self.chrom == other.chrom {
            overlap::intersection(&self.spans, &other.spans)
        } else {
            Vec::new()
        };
        IntervalSet {
            chrom: self.chrom.clone(),
            spans,
        }
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}
