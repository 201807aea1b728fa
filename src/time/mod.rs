//! Time types for chronoscene.
//!
//! Feeds describe attribute values along a continuous time axis. This
//! module provides the axis itself ([`TimeStamp`]), ranges over it
//! ([`TimeInterval`]), and the sorted non-overlapping interval store
//! with payloads ([`IntervalIndex`]) that composite properties and
//! entity availability are built on.

mod index;
mod interval;
mod stamp;

pub use index::*;
pub use interval::*;
pub use stamp::*;
