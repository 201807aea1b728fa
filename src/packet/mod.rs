//! Packet ingestion policy.
//!
//! A [`Document`] owns an entity collection and applies incoming
//! packets to it: create-on-first-mention, attribute replacement or
//! interval-scoped merging, delete directives, and the special
//! `document` packet carrying feed metadata and an explicit clock.
//! Batches are applied under suspended events so downstream consumers
//! see exactly one aggregated notification per ingestion call.

mod clock;
mod decode;

pub use clock::*;

use std::path::Path;

use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::collection::EntityCollection;
use crate::event::Event;
use crate::util::{Error, Result};

use decode::{decode_packet, PacketUpdate, SlotPath};

/// The reserved id of the packet that describes the feed itself.
pub const DOCUMENT_PACKET_ID: &str = "document";

/// Outcome of an ingestion call: how many packets applied and the
/// structured errors of any that were skipped.
#[derive(Debug, Default)]
pub struct LoadStats {
    pub processed: usize,
    pub errors: Vec<Error>,
}

impl LoadStats {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A generation token for sequencing overlapping loads; see
/// [`Document::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// A feed document: an entity collection plus feed-level metadata.
#[derive(Debug)]
pub struct Document {
    entities: EntityCollection,
    name: Option<String>,
    clock: Option<DocumentClock>,
    clock_policy: ClockPolicy,
    changed: Event,
    next_generated_id: u64,
    load_generation: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::with_policy(ClockPolicy::default())
    }

    pub fn with_policy(clock_policy: ClockPolicy) -> Self {
        Self {
            entities: EntityCollection::new(),
            name: None,
            clock: None,
            clock_policy,
            changed: Event::new(),
            next_generated_id: 0,
            load_generation: 0,
        }
    }

    #[inline]
    pub fn entities(&self) -> &EntityCollection {
        &self.entities
    }

    /// Direct mutable access for hosts that build entities in code
    /// rather than from packets.
    #[inline]
    pub fn entities_mut(&mut self) -> &mut EntityCollection {
        &mut self.entities
    }

    /// The document name, as set by the feed's document packet.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Raised when document-level metadata (name, clock) changes.
    pub fn changed(&self) -> &Event {
        &self.changed
    }

    /// The clock declared by the feed, if any.
    pub fn explicit_clock(&self) -> Option<DocumentClock> {
        self.clock
    }

    /// The effective clock: the feed's explicit clock, or one derived
    /// from the data's availability bounds. None when the data is
    /// unbounded and the feed declared nothing.
    pub fn clock(&self) -> Option<DocumentClock> {
        self.clock
            .or_else(|| self.clock_policy.derive(&self.entities.compute_availability()))
    }

    /// Apply one packet or an array of packets on top of current state.
    ///
    /// The whole call is one event batch: however many packets it
    /// holds, at most one collection-changed notification is raised.
    /// Malformed packets are skipped and reported in the returned
    /// stats; the rest of the batch still applies.
    pub fn process(&mut self, json: &Json) -> Result<LoadStats> {
        self.process_batch(json, false)
    }

    /// Replace current state: clear the collection, then process all
    /// packets, all inside one event batch.
    pub fn load(&mut self, json: &Json) -> Result<LoadStats> {
        self.load_generation += 1;
        self.process_batch(json, true)
    }

    /// Parse and process a JSON string.
    pub fn process_str(&mut self, json: &str) -> Result<LoadStats> {
        let parsed: Json = serde_json::from_str(json)?;
        self.process(&parsed)
    }

    /// Parse and load a JSON string.
    pub fn load_str(&mut self, json: &str) -> Result<LoadStats> {
        let parsed: Json = serde_json::from_str(json)?;
        self.load(&parsed)
    }

    /// Convenience for tools: read a JSON packet file and load it.
    /// I/O or parse failure leaves the collection untouched.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<LoadStats> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        self.load_str(&text)
    }

    /// Start a load whose packets will arrive later (a fetch in
    /// flight). A newer `begin_load`, `load`, or `load_file` supersedes
    /// the ticket; finishing a superseded ticket is rejected and leaves
    /// the collection untouched, so the last-started load is always the
    /// last to apply.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket(self.load_generation)
    }

    /// Complete a load started with [`begin_load`].
    ///
    /// [`begin_load`]: Document::begin_load
    pub fn finish_load(&mut self, ticket: LoadTicket, json: &Json) -> Result<LoadStats> {
        if ticket.0 != self.load_generation {
            return Err(Error::StaleLoad {
                ticket: ticket.0,
                current: self.load_generation,
            });
        }
        self.process_batch(json, true)
    }

    fn process_batch(&mut self, json: &Json, clear_first: bool) -> Result<LoadStats> {
        let packets: Vec<&Json> = match json {
            Json::Array(items) => items.iter().collect(),
            Json::Object(_) => vec![json],
            _ => {
                return Err(Error::other(
                    "expected a packet object or an array of packets",
                ))
            }
        };

        let mut stats = LoadStats::default();
        self.entities.suspend_events();
        if clear_first {
            self.entities.clear();
        }
        for packet in packets {
            match self.process_one(packet) {
                Ok(()) => stats.processed += 1,
                Err(err) => {
                    warn!("skipping packet: {err}");
                    stats.errors.push(err);
                }
            }
        }
        self.entities.resume_events();
        Ok(stats)
    }

    /// Decode and apply one packet. Decoding is all-or-nothing: a
    /// malformed attribute rejects the packet before any state changes.
    fn process_one(&mut self, json: &Json) -> Result<()> {
        let fallback = format!("entity-{}", self.next_generated_id + 1);
        let update = decode_packet(json, &fallback)?;
        if update.generated_id {
            self.next_generated_id += 1;
        }

        if update.id == DOCUMENT_PACKET_ID {
            return self.apply_document_packet(update);
        }
        if update.clock.is_some() {
            warn!(
                id = update.id.as_str(),
                "ignoring clock outside the document packet"
            );
        }

        if update.delete {
            if self.entities.remove_by_id(&update.id).is_none() {
                debug!(id = update.id.as_str(), "delete for unknown entity");
            }
            return Ok(());
        }

        self.apply_entity_update(update)
    }

    /// The document packet carries feed metadata, never entity data.
    fn apply_document_packet(&mut self, update: PacketUpdate) -> Result<()> {
        if let Some(version) = &update.version {
            if !version.starts_with("1.") {
                return Err(Error::UnsupportedVersion(version.clone()));
            }
        }
        let mut changed = false;
        if update.name.is_some() && update.name != self.name {
            self.name = update.name;
            changed = true;
        }
        if let Some(clock) = update.clock {
            if self.clock != Some(clock) {
                self.clock = Some(clock);
                changed = true;
            }
        }
        if changed {
            self.changed.raise(&());
        }
        Ok(())
    }

    fn apply_entity_update(&mut self, update: PacketUpdate) -> Result<()> {
        let mut entity = self.entities.get_or_create(&update.id);

        if let Some(name) = update.name {
            entity.set_name(Some(name));
        }
        if let Some(parent) = update.parent {
            entity.set_parent_id(Some(parent))?;
        }
        if let Some(availability) = update.availability {
            entity.set_availability(Some(availability));
        }

        for target in update.slots {
            let path = target.path;
            for (interval, property) in target.contributions {
                let slot = match path {
                    SlotPath::Top(name) => entity.slot_mut(name),
                    SlotPath::Pack { pack, field } => match pack {
                        "billboard" => entity.billboard_mut().field_mut(field),
                        "label" => entity.label_mut().field_mut(field),
                        "point" => entity.point_mut().field_mut(field),
                        "path" => entity.path_mut().field_mut(field),
                        "polyline" => entity.polyline_mut().field_mut(field),
                        "polygon" => entity.polygon_mut().field_mut(field),
                        _ => None,
                    },
                };
                let Some(mut slot) = slot else {
                    // Decode tables and entity slots are the same set
                    debug_assert!(false, "decoded slot has no entity counterpart");
                    continue;
                };
                match interval {
                    Some(span) => slot.merge_scoped(span, property),
                    None => slot.replace(property),
                }
            }
        }

        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
