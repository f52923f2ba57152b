/*!
 * Interval Algebra (C1)
 *
 * Pure, total operations on half-open `[start, end)` datetime intervals.
 * Same-instant endpoints never overlap — this closed-open convention is
 * the single most important numeric contract in the booking core (§4.1).
 */

use chrono::{DateTime, Utc};

/// A half-open time interval `[start, end)`. `start` must be strictly
/// before `end`; constructors enforce this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Builds an interval, returning `None` if `start >= end` (a
    /// zero-length or inverted interval is not representable).
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Half-open overlap: `a` and `b` overlap iff `a.start < b.end && b.start < a.end`.
/// Touching endpoints ([9,10) vs [10,11)) do NOT overlap.
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.start < b.end && b.start < a.end
}

/// Whether `outer` fully contains `inner`.
pub fn contains(outer: &Interval, inner: &Interval) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// Merges a list of (possibly overlapping or adjacent) intervals into a
/// disjoint, sorted list. Adjacent intervals (a.end == b.start) are also
/// merged, since there is no gap between them.
pub fn merge(mut intervals: Vec<Interval>) -> Vec<Interval> {
    if intervals.is_empty() {
        return intervals;
    }
    intervals.sort_by_key(|i| i.start);

    let mut out: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match out.last_mut() {
            Some(last) if iv.start <= last.end => {
                if iv.end > last.end {
                    last.end = iv.end;
                }
            }
            _ => out.push(iv),
        }
    }
    out
}

/// Subtracts `cut` (assumed already merged/disjoint) from `base` (assumed
/// already merged/disjoint), returning a disjoint, sorted list.
pub fn subtract(base: &[Interval], cut: &[Interval]) -> Vec<Interval> {
    let mut result: Vec<Interval> = base.to_vec();

    for c in cut {
        let mut next = Vec::with_capacity(result.len());
        for b in result {
            if !overlaps(&b, c) {
                next.push(b);
                continue;
            }
            // Left remainder.
            if b.start < c.start {
                if let Some(left) = Interval::new(b.start, c.start) {
                    next.push(left);
                }
            }
            // Right remainder.
            if c.end < b.end {
                if let Some(right) = Interval::new(c.end, b.end) {
                    next.push(right);
                }
            }
        }
        result = next;
    }

    result.sort_by_key(|i| i.start);
    result
}

/// Clips each interval in `intervals` (assumed disjoint) to `window`,
/// dropping intervals that fall entirely outside it.
pub fn clip(intervals: &[Interval], window: &Interval) -> Vec<Interval> {
    intervals
        .iter()
        .filter_map(|iv| {
            let start = iv.start.max(window.start);
            let end = iv.end.min(window.end);
            Interval::new(start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn iv(h1: u32, m1: u32, h2: u32, m2: u32) -> Interval {
        Interval::new(dt(h1, m1), dt(h2, m2)).unwrap()
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        let a = iv(9, 0, 10, 0);
        let b = iv(10, 0, 11, 0);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn partially_overlapping_intervals_overlap() {
        let a = iv(9, 0, 10, 0);
        let b = iv(9, 30, 10, 30);
        assert!(overlaps(&a, &b));
    }

    #[test]
    fn contains_requires_full_coverage() {
        let outer = iv(9, 0, 12, 0);
        let inner = iv(9, 30, 10, 0);
        assert!(contains(&outer, &inner));
        assert!(!contains(&inner, &outer));
    }

    #[test]
    fn merge_joins_overlapping_and_adjacent_intervals() {
        let merged = merge(vec![iv(9, 0, 10, 0), iv(10, 0, 11, 0), iv(13, 0, 14, 0)]);
        assert_eq!(merged, vec![iv(9, 0, 11, 0), iv(13, 0, 14, 0)]);
    }

    #[test]
    fn merge_is_order_independent() {
        let a = merge(vec![iv(13, 0, 14, 0), iv(9, 0, 10, 30), iv(10, 0, 11, 0)]);
        let b = merge(vec![iv(9, 0, 10, 30), iv(10, 0, 11, 0), iv(13, 0, 14, 0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn subtract_splits_around_a_middle_cut() {
        let base = vec![iv(9, 0, 18, 0)];
        let cut = vec![iv(13, 0, 14, 0)];
        let result = subtract(&base, &cut);
        assert_eq!(result, vec![iv(9, 0, 13, 0), iv(14, 0, 18, 0)]);
    }

    #[test]
    fn subtract_at_the_boundary_leaves_no_gap() {
        let base = vec![iv(9, 0, 18, 0)];
        let cut = vec![iv(9, 0, 10, 0)];
        let result = subtract(&base, &cut);
        assert_eq!(result, vec![iv(10, 0, 18, 0)]);
    }

    #[test]
    fn subtract_covering_the_whole_base_empties_it() {
        let base = vec![iv(9, 0, 18, 0)];
        let cut = vec![iv(8, 0, 19, 0)];
        assert!(subtract(&base, &cut).is_empty());
    }

    #[test]
    fn subtract_non_overlapping_cut_is_a_no_op() {
        let base = vec![iv(9, 0, 12, 0)];
        let cut = vec![iv(13, 0, 14, 0)];
        assert_eq!(subtract(&base, &cut), base);
    }

    #[test]
    fn clip_truncates_to_window_and_drops_outliers() {
        let intervals = vec![iv(7, 0, 9, 30), iv(10, 0, 11, 0), iv(20, 0, 21, 0)];
        let window = iv(9, 0, 18, 0);
        let clipped = clip(&intervals, &window);
        assert_eq!(clipped, vec![iv(9, 0, 9, 30), iv(10, 0, 11, 0)]);
    }

    #[test]
    fn new_rejects_inverted_or_zero_length_intervals() {
        assert!(Interval::new(dt(10, 0), dt(10, 0)).is_none());
        assert!(Interval::new(dt(10, 0), dt(9, 0)).is_none());
    }
}
