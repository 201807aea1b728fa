//! The time-dynamic property abstraction.
//!
//! A [`Property`] answers one question: what is this attribute's value
//! at time T? The answer may be a constant, interpolated from samples,
//! delegated to a sub-property owning the containing interval, aliased
//! to another entity's attribute, or computed by a caller-supplied
//! function. Evaluation is a pure function of time for a fixed
//! definition; every definition change raises the variant's
//! definition-changed event exactly once.

mod callback;
mod composite;
mod constant;
mod reference;
mod sampled;
mod value;

pub use callback::*;
pub use composite::*;
pub use constant::*;
pub use reference::*;
pub use sampled::*;
pub use value::*;

use tracing::warn;

use crate::collection::EntityCollection;
use crate::event::Event;
use crate::time::TimeStamp;
use crate::util::{Error, Result};

/// Maximum number of reference indirections followed during one
/// evaluation before the chain is declared cyclic.
pub const MAX_REFERENCE_DEPTH: u32 = 16;

/// A time-dynamic attribute definition.
///
/// Evaluation takes the owning [`EntityCollection`] explicitly so that
/// reference properties can resolve lazily against live data; variants
/// that never look anything up simply ignore it.
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    Constant(ConstantProperty),
    Sampled(SampledProperty),
    Composite(CompositeProperty),
    Reference(ReferenceProperty),
    Callback(CallbackProperty),
}

impl Property {
    /// Shorthand for a constant property.
    pub fn constant(value: Value) -> Self {
        Self::Constant(ConstantProperty::new(value))
    }

    /// Evaluate at `time`. Undefined values — no containing interval,
    /// unresolved reference target, extrapolation policy `None` — are
    /// `None`. A reference cycle logs a warning and is also `None`; use
    /// [`try_value`] to observe it as an error.
    ///
    /// [`try_value`]: Property::try_value
    pub fn get_value(&self, time: TimeStamp, entities: &EntityCollection) -> Option<Value> {
        match self.try_value(time, entities) {
            Ok(value) => value,
            Err(err) => {
                warn!("property evaluation failed: {err}");
                None
            }
        }
    }

    /// Evaluate at `time`, surfacing reference cycles as
    /// [`Error::ReferenceCycle`].
    pub fn try_value(
        &self,
        time: TimeStamp,
        entities: &EntityCollection,
    ) -> Result<Option<Value>> {
        self.value_at_depth(time, entities, MAX_REFERENCE_DEPTH)
    }

    pub(crate) fn value_at_depth(
        &self,
        time: TimeStamp,
        entities: &EntityCollection,
        depth: u32,
    ) -> Result<Option<Value>> {
        match self {
            Self::Constant(p) => Ok(Some(p.value().clone())),
            Self::Sampled(p) => Ok(p.get_value(time)),
            Self::Callback(p) => Ok(p.get_value(time)),
            Self::Composite(p) => match p.property_at(time) {
                Some(sub) => sub.value_at_depth(time, entities, depth),
                None => Ok(None),
            },
            Self::Reference(r) => {
                if depth == 0 {
                    return Err(Error::ReferenceCycle(r.reference_string()));
                }
                let Some(target) = entities.get_by_id(r.target_id()) else {
                    return Ok(None);
                };
                match target.find_property(r.path()) {
                    Some(resolved) => resolved.value_at_depth(time, entities, depth - 1),
                    None => Ok(None),
                }
            }
        }
    }

    /// Whether `get_value` returns the same result for every time under
    /// the current definition.
    pub fn is_constant(&self, entities: &EntityCollection) -> bool {
        self.is_constant_at_depth(entities, MAX_REFERENCE_DEPTH)
    }

    fn is_constant_at_depth(&self, entities: &EntityCollection, depth: u32) -> bool {
        match self {
            Self::Constant(_) => true,
            Self::Sampled(p) => p.is_empty(),
            Self::Callback(p) => p.is_constant(),
            Self::Composite(p) => p.is_vacuous(),
            Self::Reference(r) => {
                if depth == 0 {
                    return false;
                }
                entities
                    .get_by_id(r.target_id())
                    .and_then(|e| e.find_property(r.path()))
                    .is_some_and(|p| p.is_constant_at_depth(entities, depth - 1))
            }
        }
    }

    /// The event raised when this property's definition changes.
    pub fn definition_changed(&self) -> &Event {
        match self {
            Self::Constant(p) => p.definition_changed(),
            Self::Sampled(p) => p.definition_changed(),
            Self::Composite(p) => p.definition_changed(),
            Self::Reference(p) => p.definition_changed(),
            Self::Callback(p) => p.definition_changed(),
        }
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Self::constant(value)
    }
}
