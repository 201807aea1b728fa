//! A property composed from sub-properties over disjoint intervals.

use crate::event::Event;
use crate::time::{IntervalIndex, TimeInterval, TimeStamp};

use super::Property;

/// A property whose definition is an interval index of other
/// properties; evaluation delegates to the interval containing the
/// query time.
#[derive(Clone, Debug)]
pub struct CompositeProperty {
    intervals: IntervalIndex<Property>,
    definition_changed: Event,
}

impl CompositeProperty {
    pub fn new() -> Self {
        Self {
            intervals: IntervalIndex::new(),
            definition_changed: Event::new(),
        }
    }

    /// The underlying interval index.
    #[inline]
    pub fn intervals(&self) -> &IntervalIndex<Property> {
        &self.intervals
    }

    #[inline]
    pub fn definition_changed(&self) -> &Event {
        &self.definition_changed
    }

    /// Merge `property` over `span`, clipping whatever it covers.
    ///
    /// Raises definition-changed unless the merge was a no-op (the
    /// merge operation is idempotent, so re-applying an identical
    /// contribution notifies nobody). Returns whether the definition
    /// changed.
    pub fn merge_interval(&mut self, span: TimeInterval, property: Property) -> bool {
        let before = self.intervals.clone();
        self.intervals.merge(span, property);
        let changed = self.intervals != before;
        if changed {
            self.definition_changed.raise(&());
        }
        changed
    }

    /// The sub-property whose interval contains `time`, if any.
    pub fn property_at(&self, time: TimeStamp) -> Option<&Property> {
        self.intervals.find(time).map(|iv| &iv.data)
    }

    /// Mutable access to the sub-property stored for exactly `span`.
    pub fn property_for_span_mut(&mut self, span: &TimeInterval) -> Option<&mut Property> {
        self.intervals.find_exact_mut(span)
    }

    /// An empty composite is vacuously constant (always undefined).
    pub fn is_vacuous(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl Default for CompositeProperty {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CompositeProperty {
    fn eq(&self, other: &Self) -> bool {
        self.intervals == other.intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{ConstantProperty, Value};

    fn span(s: &str) -> TimeInterval {
        TimeInterval::from_iso8601(s).unwrap()
    }

    fn number(n: f64) -> Property {
        Property::Constant(ConstantProperty::new(Value::Number(n)))
    }

    #[test]
    fn test_merge_and_find() {
        let mut c = CompositeProperty::new();
        c.merge_interval(span("2012/2013"), number(1.0));
        c.merge_interval(span("2013-06-01/2014"), number(2.0));

        let t = TimeStamp::from_iso8601("2012-06-01").unwrap();
        assert_eq!(c.property_at(t), Some(&number(1.0)));
        let outside = TimeStamp::from_iso8601("2013-03-01").unwrap();
        assert!(c.property_at(outside).is_none());
    }

    #[test]
    fn test_noop_merge_raises_nothing() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut c = CompositeProperty::new();
        c.merge_interval(span("2012/2013"), number(1.0));

        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        c.definition_changed().subscribe(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

        c.merge_interval(span("2012/2013"), number(1.0));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        c.merge_interval(span("2012/2013"), number(9.0));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mutate_subproperty_for_exact_span() {
        use crate::property::{SampledProperty, ValueKind};

        let mut c = CompositeProperty::new();
        let sampled = SampledProperty::new(ValueKind::Number).unwrap();
        c.merge_interval(span("2012/2013"), Property::Sampled(sampled));

        // A feed appending samples into an interval it created earlier
        let slot = c
            .property_for_span_mut(&span("2012/2013"))
            .expect("exact span present");
        let Property::Sampled(sampled) = slot else {
            panic!("expected the sampled sub-property");
        };
        sampled
            .add_sample(
                TimeStamp::from_iso8601("2012-06-01").unwrap(),
                Value::Number(4.0),
            )
            .unwrap();

        assert!(c.property_for_span_mut(&span("2011/2013")).is_none());
        let t = TimeStamp::from_iso8601("2012-06-01").unwrap();
        let Some(Property::Sampled(read_back)) = c.property_at(t) else {
            panic!("expected the sampled sub-property");
        };
        assert_eq!(read_back.get_value(t), Some(Value::Number(4.0)));
    }
}
