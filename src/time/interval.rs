//! Ranges over the time axis.

use std::fmt;

use crate::util::{Error, Result};

use super::TimeStamp;

/// An immutable range of time with independently open or closed ends.
///
/// Invariants: `start <= stop`, and a degenerate interval
/// (`start == stop`) must include both ends — it represents an instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeInterval {
    start: TimeStamp,
    stop: TimeStamp,
    start_included: bool,
    stop_included: bool,
}

impl TimeInterval {
    /// Create an interval, validating the invariants.
    pub fn new(
        start: TimeStamp,
        stop: TimeStamp,
        start_included: bool,
        stop_included: bool,
    ) -> Result<Self> {
        if start > stop {
            return Err(Error::InvalidInterval(format!(
                "start {} is after stop {}",
                start, stop
            )));
        }
        if start == stop && !(start_included && stop_included) {
            return Err(Error::InvalidInterval(format!(
                "degenerate interval at {} must include both ends",
                start
            )));
        }
        Ok(Self {
            start,
            stop,
            start_included,
            stop_included,
        })
    }

    /// A closed interval `[start, stop]`. Panics are avoided by
    /// swapping nothing: `start` must not be after `stop`.
    pub fn closed(start: TimeStamp, stop: TimeStamp) -> Result<Self> {
        Self::new(start, stop, true, true)
    }

    /// The degenerate interval holding a single instant.
    pub fn at(instant: TimeStamp) -> Self {
        Self {
            start: instant,
            stop: instant,
            start_included: true,
            stop_included: true,
        }
    }

    /// The interval covering all of time.
    pub const fn always() -> Self {
        Self {
            start: TimeStamp::MIN,
            stop: TimeStamp::MAX,
            start_included: true,
            stop_included: true,
        }
    }

    /// Parse an ISO-8601 `start/stop` pair, e.g.
    /// `2012-03-15T10:00:00Z/2012-03-15T11:00:00Z` or `2012/2013`.
    /// Both ends are included.
    pub fn from_iso8601(s: &str) -> Result<Self> {
        let (start, stop) = s
            .split_once('/')
            .ok_or_else(|| Error::InvalidInterval(format!("missing '/' in '{}'", s)))?;
        Self::closed(
            TimeStamp::from_iso8601(start)?,
            TimeStamp::from_iso8601(stop)?,
        )
    }

    #[inline]
    pub fn start(&self) -> TimeStamp {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> TimeStamp {
        self.stop
    }

    #[inline]
    pub fn is_start_included(&self) -> bool {
        self.start_included
    }

    #[inline]
    pub fn is_stop_included(&self) -> bool {
        self.stop_included
    }

    /// True for the `(t, t)` shapes produced by [`intersection`]
    /// when two intervals merely touch at an excluded point.
    ///
    /// [`intersection`]: TimeInterval::intersection
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start > self.stop
            || (self.start == self.stop && !(self.start_included && self.stop_included))
    }

    /// Whether `time` lies within the interval, honoring end inclusivity.
    pub fn contains(&self, time: TimeStamp) -> bool {
        if time < self.start || time > self.stop {
            return false;
        }
        if time == self.start && !self.start_included {
            return false;
        }
        if time == self.stop && !self.stop_included {
            return false;
        }
        true
    }

    /// The overlapping portion of two intervals. The result may be
    /// empty (check [`is_empty`]); a closed endpoint touching an open
    /// endpoint at the same instant is not an overlap.
    ///
    /// [`is_empty`]: TimeInterval::is_empty
    pub fn intersection(&self, other: &Self) -> Self {
        let (start, start_included) = match self.start.cmp(&other.start) {
            std::cmp::Ordering::Greater => (self.start, self.start_included),
            std::cmp::Ordering::Less => (other.start, other.start_included),
            std::cmp::Ordering::Equal => (self.start, self.start_included && other.start_included),
        };
        let (stop, stop_included) = match self.stop.cmp(&other.stop) {
            std::cmp::Ordering::Less => (self.stop, self.stop_included),
            std::cmp::Ordering::Greater => (other.stop, other.stop_included),
            std::cmp::Ordering::Equal => (self.stop, self.stop_included && other.stop_included),
        };
        Self {
            start,
            stop,
            start_included,
            stop_included,
        }
    }

    /// Whether the two intervals share any point.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }

    pub(crate) const fn raw(
        start: TimeStamp,
        stop: TimeStamp,
        start_included: bool,
        stop_included: bool,
    ) -> Self {
        Self {
            start,
            stop,
            start_included,
            stop_included,
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}{}",
            if self.start_included { "[" } else { "(" },
            self.start,
            self.stop,
            if self.stop_included { "]" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> TimeStamp {
        TimeStamp::from_iso8601(s).unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(TimeInterval::closed(ts("2013"), ts("2012")).is_err());
        assert!(TimeInterval::new(ts("2012"), ts("2012"), true, false).is_err());
        assert!(TimeInterval::new(ts("2012"), ts("2012"), true, true).is_ok());
    }

    #[test]
    fn test_contains_inclusivity() {
        let i = TimeInterval::new(ts("2012"), ts("2013"), true, false).unwrap();
        assert!(i.contains(ts("2012")));
        assert!(i.contains(ts("2012-06-01")));
        assert!(!i.contains(ts("2013")));
        assert!(!i.contains(ts("2011-12-31")));
    }

    #[test]
    fn test_degenerate_instant() {
        let i = TimeInterval::at(ts("2012"));
        assert!(!i.is_empty());
        assert!(i.contains(ts("2012")));
        assert!(!i.contains(ts("2012-01-02")));
    }

    #[test]
    fn test_intersection() {
        let a = TimeInterval::closed(ts("2012"), ts("2014")).unwrap();
        let b = TimeInterval::closed(ts("2013"), ts("2015")).unwrap();
        let x = a.intersection(&b);
        assert_eq!(x.start(), ts("2013"));
        assert_eq!(x.stop(), ts("2014"));
        assert!(!x.is_empty());
    }

    #[test]
    fn test_touching_open_closed_is_not_overlap() {
        // [2012, 2013) then [2013, 2014] touch but do not overlap
        let a = TimeInterval::new(ts("2012"), ts("2013"), true, false).unwrap();
        let b = TimeInterval::closed(ts("2013"), ts("2014")).unwrap();
        assert!(!a.intersects(&b));

        // Both closed at the shared point: overlap at the instant
        let c = TimeInterval::closed(ts("2012"), ts("2013")).unwrap();
        assert!(c.intersects(&b));
    }

    #[test]
    fn test_from_iso8601() {
        let i = TimeInterval::from_iso8601("2012-03-15T10:00:00Z/2012-03-15T11:00:00Z").unwrap();
        assert!(i.contains(ts("2012-03-15T10:30:00Z")));
        assert!(TimeInterval::from_iso8601("2012-03-15").is_err());
    }

    #[test]
    fn test_equality_is_all_four_fields() {
        let a = TimeInterval::new(ts("2012"), ts("2013"), true, false).unwrap();
        let b = TimeInterval::new(ts("2012"), ts("2013"), true, true).unwrap();
        let c = TimeInterval::new(ts("2012"), ts("2013"), true, false).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
