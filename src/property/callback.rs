//! Properties evaluated by an externally supplied function.
//!
//! Bridges computed values into the property graph — a live
//! vehicle-tracking adapter can expose its own position solution as an
//! ordinary property without copying samples in.

use std::fmt;
use std::sync::Arc;

use crate::event::Event;
use crate::time::TimeStamp;

use super::Value;

/// The evaluator signature: a pure function of time.
pub type CallbackFn = Arc<dyn Fn(TimeStamp) -> Option<Value> + Send + Sync>;

/// A property whose value comes from a caller-provided function.
#[derive(Clone)]
pub struct CallbackProperty {
    callback: CallbackFn,
    constant: bool,
    definition_changed: Event,
}

impl CallbackProperty {
    /// Wrap an evaluator. `constant` tells consumers whether repeated
    /// evaluation may be cached.
    pub fn new(
        constant: bool,
        callback: impl Fn(TimeStamp) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            callback: Arc::new(callback),
            constant,
            definition_changed: Event::new(),
        }
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    #[inline]
    pub fn definition_changed(&self) -> &Event {
        &self.definition_changed
    }

    pub fn get_value(&self, time: TimeStamp) -> Option<Value> {
        (self.callback)(time)
    }

    /// Swap the evaluator. Raises definition-changed unless handed the
    /// very same function and flag.
    pub fn set_callback(&mut self, callback: CallbackFn, constant: bool) {
        if Arc::ptr_eq(&self.callback, &callback) && self.constant == constant {
            return;
        }
        self.callback = callback;
        self.constant = constant;
        self.definition_changed.raise(&());
    }
}

impl PartialEq for CallbackProperty {
    fn eq(&self, other: &Self) -> bool {
        // Function identity; two distinct closures never compare equal
        Arc::ptr_eq(&self.callback, &other.callback) && self.constant == other.constant
    }
}

impl fmt::Debug for CallbackProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackProperty")
            .field("constant", &self.constant)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_evaluates() {
        let p = CallbackProperty::new(false, |t| Some(Value::Number(t.seconds() * 2.0)));
        assert_eq!(
            p.get_value(TimeStamp::from_seconds(21.0)),
            Some(Value::Number(42.0))
        );
        assert!(!p.is_constant());
    }

    #[test]
    fn test_equality_is_identity() {
        let a = CallbackProperty::new(true, |_| None);
        let b = CallbackProperty::new(true, |_| None);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_set_callback_raises() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut p = CallbackProperty::new(true, |_| None);
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        p.definition_changed().subscribe(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

        let same = p.callback.clone();
        p.set_callback(same, true);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        p.set_callback(Arc::new(|_| Some(Value::Number(1.0))), true);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
