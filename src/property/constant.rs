//! A property holding one immutable value, valid for all time.

use crate::event::Event;

use super::Value;

/// The simplest property: one value, every time.
#[derive(Clone, Debug)]
pub struct ConstantProperty {
    value: Value,
    definition_changed: Event,
}

impl ConstantProperty {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            definition_changed: Event::new(),
        }
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replace the held value. Raises the definition-changed event only
    /// if the new value actually differs.
    pub fn set_value(&mut self, value: Value) {
        if self.value != value {
            self.value = value;
            self.definition_changed.raise(&());
        }
    }

    #[inline]
    pub fn definition_changed(&self) -> &Event {
        &self.definition_changed
    }
}

impl PartialEq for ConstantProperty {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_raises_once() {
        let mut p = ConstantProperty::new(Value::Number(1.0));
        let fired = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let f = fired.clone();
        p.definition_changed().subscribe(move |_| {
            f.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        p.set_value(Value::Number(1.0)); // no-op
        assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 0);

        p.set_value(Value::Number(2.0));
        assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(p.value(), &Value::Number(2.0));
    }
}
