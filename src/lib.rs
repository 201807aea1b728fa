//! # Chronoscene
//!
//! Time-dynamic entity and property engine for 3D geospatial viewers.
//!
//! Heterogeneous time-stamped feeds (scene-description packets, vehicle
//! tracking, geographic markup) are ingested into a unified graph of
//! entities whose visual attributes vary over time. Any attribute can
//! be a constant, an interpolated sample series, a composite of
//! interval-scoped contributions from many packets, a reference to
//! another entity's attribute, or an external callback — with
//! out-of-order arrival, incremental updates, and id-indexed lookup.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (errors, colors, ordered id store)
//! - [`time`] - Time stamps, intervals, and the interval index
//! - [`event`] - Subscribe/unsubscribe change notification
//! - [`property`] - The property variants and evaluation
//! - [`entity`] - Entities and their graphics packs
//! - [`collection`] - The id-indexed entity store
//! - [`packet`] - Packet decoding and the ingestion policy
//!
//! ## Example
//!
//! ```ignore
//! use chronoscene::prelude::*;
//!
//! let mut document = Document::new();
//! document.load_str(r#"[
//!     {"id": "sat", "position": {"cartesian": [1.0, 2.0, 3.0]}}
//! ]"#)?;
//!
//! let time = TimeStamp::from_iso8601("2012-03-15T10:00:00Z")?;
//! let sat = document.entities().get_by_id("sat").unwrap();
//! let position = sat.position().unwrap().get_value(time, document.entities());
//! ```

pub mod collection;
pub mod entity;
pub mod event;
pub mod packet;
pub mod property;
pub mod time;
pub mod util;

// Re-export commonly used types
pub use collection::{CollectionChanged, EntityCollection};
pub use entity::Entity;
pub use packet::{Document, DocumentClock, LoadStats};
pub use property::{Property, Value};
pub use time::{TimeInterval, TimeStamp};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collection::{CollectionChanged, EntityCollection};
    pub use crate::entity::Entity;
    pub use crate::event::Event;
    pub use crate::packet::{ClockPolicy, Document, DocumentClock, LoadStats};
    pub use crate::property::{
        CallbackProperty, CompositeProperty, ConstantProperty, Property, ReferenceProperty,
        SampledProperty, Value, ValueKind,
    };
    pub use crate::time::{IntervalIndex, IntervalSet, TimeInterval, TimeStamp};
    pub use crate::util::{Color, Error, Result};
}
