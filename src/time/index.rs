//! Sorted, non-overlapping interval store with payloads.
//!
//! The store behind composite properties and entity availability.
//! Intervals are kept sorted ascending by start time and never overlap;
//! merging a new interval clips or replaces whatever it covers.

use super::{TimeInterval, TimeStamp};

/// One interval plus its associated payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval<P> {
    pub span: TimeInterval,
    pub data: P,
}

/// A sorted collection of non-overlapping intervals, each carrying a
/// payload, with binary-search point lookup and a clipping merge.
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalIndex<P> {
    intervals: Vec<Interval<P>>,
}

impl<P> IntervalIndex<P> {
    pub fn new() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Interval<P>> {
        self.intervals.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval<P>> {
        self.intervals.iter()
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
    }

    /// Earliest covered time, if any intervals exist.
    pub fn start(&self) -> Option<TimeStamp> {
        self.intervals.first().map(|iv| iv.span.start())
    }

    /// Latest covered time, if any intervals exist.
    pub fn stop(&self) -> Option<TimeStamp> {
        self.intervals.last().map(|iv| iv.span.stop())
    }

    /// Find the unique interval containing `time`.
    pub fn find(&self, time: TimeStamp) -> Option<&Interval<P>> {
        // First interval whose stop is not before `time`; boundary
        // inclusivity is settled by the contains check, which may fall
        // through to the next interval when `time` sits on an excluded
        // stop endpoint.
        let idx = self
            .intervals
            .partition_point(|iv| iv.span.stop() < time);
        self.intervals[idx..]
            .iter()
            .take_while(|iv| iv.span.start() <= time)
            .find(|iv| iv.span.contains(time))
    }

    /// Whether any interval contains `time`.
    pub fn contains(&self, time: TimeStamp) -> bool {
        self.find(time).is_some()
    }

    /// Mutable payload access for the interval whose span is exactly
    /// `span` (all four fields equal).
    pub fn find_exact_mut(&mut self, span: &TimeInterval) -> Option<&mut P> {
        let idx = self
            .intervals
            .partition_point(|iv| iv.span.stop() < span.stop());
        self.intervals[idx..]
            .iter_mut()
            .take_while(|iv| iv.span.start() <= span.start())
            .find(|iv| iv.span == *span)
            .map(|iv| &mut iv.data)
    }

    /// Invariant check used by tests: sorted by start, no two intervals
    /// share a point.
    pub fn assert_no_overlap(&self) {
        for pair in self.intervals.windows(2) {
            assert!(
                pair[0].span.start() <= pair[1].span.start(),
                "intervals out of order: {} then {}",
                pair[0].span,
                pair[1].span
            );
            assert!(
                !pair[0].span.intersects(&pair[1].span),
                "overlapping intervals: {} and {}",
                pair[0].span,
                pair[1].span
            );
        }
    }
}

impl<P: Clone + PartialEq> IntervalIndex<P> {
    /// Insert `span` → `data`, clipping or removing whatever it covers.
    ///
    /// Existing intervals fully covered by `span` are removed; partial
    /// overlaps are clipped so their own payload survives on the
    /// non-overlapping remainder; afterwards, adjacent intervals with
    /// equal payloads are coalesced. Merging the same span and payload
    /// twice leaves the index unchanged the second time.
    pub fn merge(&mut self, span: TimeInterval, data: P) {
        if span.is_empty() {
            return;
        }

        // Locate the run of intervals that actually share points with
        // the new span. Stops are strictly increasing, so everything
        // before the partition point ends before the new span starts.
        let mut lo = self
            .intervals
            .partition_point(|iv| iv.span.stop() < span.start());
        // A predecessor may merely touch the new span at an excluded
        // boundary point; it is not clipped.
        while lo < self.intervals.len()
            && self.intervals[lo].span.stop() == span.start()
            && !self.intervals[lo].span.intersects(&span)
        {
            lo += 1;
        }
        let mut hi = lo;
        while hi < self.intervals.len()
            && self.intervals[hi].span.start() <= span.stop()
            && self.intervals[hi].span.intersects(&span)
        {
            hi += 1;
        }

        // Clip the overlapped run down to its non-overlapping remains.
        let mut replacement: Vec<Interval<P>> = Vec::with_capacity(3);
        if lo < hi {
            let first = &self.intervals[lo];
            let left = TimeInterval::raw(
                first.span.start(),
                span.start(),
                first.span.is_start_included(),
                !span.is_start_included(),
            );
            if !left.is_empty() {
                replacement.push(Interval {
                    span: left,
                    data: first.data.clone(),
                });
            }
        }
        replacement.push(Interval {
            span,
            data,
        });
        if lo < hi {
            let last = &self.intervals[hi - 1];
            let right = TimeInterval::raw(
                span.stop(),
                last.span.stop(),
                !span.is_stop_included(),
                last.span.is_stop_included(),
            );
            if !right.is_empty() {
                replacement.push(Interval {
                    span: right,
                    data: last.data.clone(),
                });
            }
        }

        let inserted = replacement.len();
        self.intervals.splice(lo..hi, replacement);

        // Coalesce across the spliced region and its outer neighbors.
        self.coalesce_range(lo.saturating_sub(1), lo + inserted);

        #[cfg(debug_assertions)]
        self.assert_no_overlap();
    }

    /// Join each pair of adjacent intervals in `[first, last]` whose
    /// payloads are equal and whose spans touch.
    fn coalesce_range(&mut self, first: usize, last: usize) {
        let mut i = first;
        let mut last = last.min(self.intervals.len().saturating_sub(1));
        while i < last {
            let (a, b) = (&self.intervals[i], &self.intervals[i + 1]);
            let touching = a.span.stop() == b.span.start()
                && (a.span.is_stop_included() || b.span.is_start_included());
            if touching && a.data == b.data {
                let joined = TimeInterval::raw(
                    a.span.start(),
                    b.span.stop(),
                    a.span.is_start_included(),
                    b.span.is_stop_included(),
                );
                self.intervals[i].span = joined;
                self.intervals.remove(i + 1);
                last -= 1;
            } else {
                i += 1;
            }
        }
    }
}

impl<P> Default for IntervalIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// A plain set of time intervals (no payloads), used for availability.
pub type IntervalSet = IntervalIndex<()>;

impl IntervalSet {
    /// Add an interval to the set, unioning with whatever it touches.
    pub fn add(&mut self, span: TimeInterval) {
        self.merge(span, ());
    }

    /// The set covering all of time.
    pub fn unbounded() -> Self {
        let mut set = Self::new();
        set.add(TimeInterval::always());
        set
    }

    /// Union every interval of `other` into `self`.
    pub fn union_with(&mut self, other: &IntervalSet) {
        for iv in other.iter() {
            self.add(iv.span);
        }
    }

    /// Whether the set reaches infinitely far in either direction.
    pub fn is_unbounded(&self) -> bool {
        self.start().is_some_and(|t| !t.is_finite())
            || self.stop().is_some_and(|t| !t.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> TimeStamp {
        TimeStamp::from_iso8601(s).unwrap()
    }

    fn closed(a: &str, b: &str) -> TimeInterval {
        TimeInterval::closed(ts(a), ts(b)).unwrap()
    }

    #[test]
    fn test_merge_disjoint_sorted() {
        let mut idx = IntervalIndex::new();
        idx.merge(closed("2014", "2015"), "b");
        idx.merge(closed("2012", "2013"), "a");

        assert_eq!(idx.len(), 2);
        assert_eq!(idx.get(0).unwrap().data, "a");
        assert_eq!(idx.get(1).unwrap().data, "b");
        idx.assert_no_overlap();
    }

    #[test]
    fn test_merge_covers_existing() {
        let mut idx = IntervalIndex::new();
        idx.merge(closed("2012-03", "2012-04"), 1);
        idx.merge(closed("2012-05", "2012-06"), 2);
        idx.merge(closed("2012-01", "2013-01"), 3);

        assert_eq!(idx.len(), 1);
        assert_eq!(idx.get(0).unwrap().data, 3);
    }

    #[test]
    fn test_merge_clips_overlap() {
        let mut idx = IntervalIndex::new();
        idx.merge(closed("2012-01-01", "2012-12-31"), "old");
        idx.merge(closed("2012-06-01", "2012-08-01"), "new");

        assert_eq!(idx.len(), 3);
        assert_eq!(idx.find(ts("2012-03-01")).unwrap().data, "old");
        assert_eq!(idx.find(ts("2012-07-01")).unwrap().data, "new");
        assert_eq!(idx.find(ts("2012-10-01")).unwrap().data, "old");
        idx.assert_no_overlap();

        // Clipped remainder does not re-include the new interval's
        // closed endpoints.
        assert_eq!(idx.find(ts("2012-06-01")).unwrap().data, "new");
        assert_eq!(idx.find(ts("2012-08-01")).unwrap().data, "new");
    }

    #[test]
    fn test_merge_idempotent() {
        let mut once = IntervalIndex::new();
        once.merge(closed("2012", "2014"), "x");
        once.merge(closed("2013", "2015"), "y");

        let mut twice = once.clone();
        twice.merge(closed("2013", "2015"), "y");

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_coalesces_equal_payloads() {
        let mut idx = IntervalIndex::new();
        idx.merge(
            TimeInterval::new(ts("2012"), ts("2013"), true, false).unwrap(),
            "same",
        );
        idx.merge(closed("2013", "2014"), "same");

        assert_eq!(idx.len(), 1);
        let only = idx.get(0).unwrap();
        assert_eq!(only.span.start(), ts("2012"));
        assert_eq!(only.span.stop(), ts("2014"));
    }

    #[test]
    fn test_merge_keeps_unequal_payloads_separate() {
        let mut idx = IntervalIndex::new();
        idx.merge(
            TimeInterval::new(ts("2012"), ts("2013"), true, false).unwrap(),
            "a",
        );
        idx.merge(closed("2013", "2014"), "b");
        assert_eq!(idx.len(), 2);
        idx.assert_no_overlap();
    }

    #[test]
    fn test_merge_into_middle_same_payload() {
        let mut idx = IntervalIndex::new();
        idx.merge(closed("2012", "2015"), 7);
        idx.merge(closed("2013", "2014"), 7);

        assert_eq!(idx.len(), 1);
        let only = idx.get(0).unwrap();
        assert_eq!(only.span, closed("2012", "2015"));
    }

    #[test]
    fn test_touching_open_closed_not_clipped() {
        let mut idx = IntervalIndex::new();
        idx.merge(
            TimeInterval::new(ts("2012"), ts("2013"), true, false).unwrap(),
            "a",
        );
        // Closed start touching the open stop above: no overlap, no clip
        idx.merge(closed("2013", "2014"), "b");

        assert_eq!(idx.find(ts("2012-06-01")).unwrap().data, "a");
        assert_eq!(idx.find(ts("2013")).unwrap().data, "b");
    }

    #[test]
    fn test_find_boundary_between_intervals() {
        let mut idx = IntervalIndex::new();
        idx.merge(
            TimeInterval::new(ts("2012"), ts("2013"), true, false).unwrap(),
            "first",
        );
        idx.merge(
            TimeInterval::new(ts("2013"), ts("2014"), true, true).unwrap(),
            "second",
        );

        // The shared instant belongs to whichever interval includes it
        assert_eq!(idx.find(ts("2013")).unwrap().data, "second");
        assert!(idx.find(ts("2011")).is_none());
        assert!(idx.find(ts("2015")).is_none());
    }

    #[test]
    fn test_merge_many_random_order_no_overlap() {
        let mut idx = IntervalIndex::new();
        let spans = [
            ("2012-01", "2012-05", 0),
            ("2012-03", "2012-09", 1),
            ("2011-06", "2012-02", 2),
            ("2012-08", "2012-12", 3),
            ("2011-01", "2013-01", 4),
            ("2012-04", "2012-06", 5),
        ];
        for (a, b, p) in spans {
            idx.merge(closed(a, b), p);
            idx.assert_no_overlap();
        }
        assert_eq!(idx.find(ts("2012-05-15")).unwrap().data, 5);
    }

    #[test]
    fn test_interval_set_union() {
        let mut set = IntervalSet::new();
        set.add(closed("2012", "2013"));
        set.add(closed("2012-06-01", "2014"));
        // Overlapping same-payload intervals collapse
        assert_eq!(set.len(), 1);
        assert_eq!(set.start(), Some(ts("2012")));
        assert_eq!(set.stop(), Some(ts("2014")));
        assert!(!set.is_unbounded());
        assert!(IntervalSet::unbounded().is_unbounded());
    }
}
