//! Entities: named bags of time-dynamic attribute slots.

mod graphics;

pub use graphics::*;

use crate::event::Event;
use crate::property::Property;
use crate::time::{IntervalSet, TimeStamp};
use crate::util::{Error, Result};

/// One object in the scene graph.
///
/// An entity's identity is its immutable id, unique within the owning
/// collection. Every attribute slot is optional; an unset slot is
/// undefined at every time. Availability is separate from attribute
/// definition: an entity can exist while none of its visuals are
/// defined, and vice versa.
#[derive(Clone, Debug)]
pub struct Entity {
    id: String,
    name: Option<String>,
    availability: Option<IntervalSet>,
    parent: Option<String>,
    description: Option<Property>,
    position: Option<Property>,
    orientation: Option<Property>,
    view_from: Option<Property>,
    billboard: Option<BillboardGraphics>,
    label: Option<LabelGraphics>,
    point: Option<PointGraphics>,
    path: Option<PathGraphics>,
    polyline: Option<PolylineGraphics>,
    polygon: Option<PolygonGraphics>,
    definition_changed: Event<&'static str>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            availability: None,
            parent: None,
            description: None,
            position: None,
            orientation: None,
            view_from: None,
            billboard: None,
            label: None,
            point: None,
            path: None,
            polyline: None,
            polygon: None,
            definition_changed: Event::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        if self.name != name {
            self.name = name;
            self.definition_changed.raise(&"name");
        }
    }

    /// Raised with the attribute name whenever any slot's definition
    /// changes.
    pub fn definition_changed(&self) -> &Event<&'static str> {
        &self.definition_changed
    }

    // ------------------------------------------------------------------
    // Availability and parent
    // ------------------------------------------------------------------

    /// The intervals during which this entity exists, or None for
    /// "always".
    pub fn availability(&self) -> Option<&IntervalSet> {
        self.availability.as_ref()
    }

    pub fn set_availability(&mut self, availability: Option<IntervalSet>) {
        if self.availability != availability {
            self.availability = availability;
            self.definition_changed.raise(&"availability");
        }
    }

    /// Whether the entity exists at `time`.
    pub fn is_available(&self, time: TimeStamp) -> bool {
        self.availability.as_ref().is_none_or(|a| a.contains(time))
    }

    /// The parent entity's id, if any. Resolution goes through the
    /// owning collection so a parent may be named before it is loaded.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Set the parent by id. An entity cannot be its own parent.
    pub fn set_parent_id(&mut self, parent: Option<String>) -> Result<()> {
        if parent.as_deref() == Some(self.id.as_str()) {
            return Err(Error::other(format!(
                "entity '{}' cannot be its own parent",
                self.id
            )));
        }
        if self.parent != parent {
            self.parent = parent;
            self.definition_changed.raise(&"parent");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Property slots
    // ------------------------------------------------------------------

    pub fn position(&self) -> Option<&Property> {
        self.position.as_ref()
    }

    pub fn orientation(&self) -> Option<&Property> {
        self.orientation.as_ref()
    }

    pub fn view_from(&self) -> Option<&Property> {
        self.view_from.as_ref()
    }

    pub fn description(&self) -> Option<&Property> {
        self.description.as_ref()
    }

    pub fn set_position(&mut self, property: Property) {
        if let Some(mut slot) = self.slot_mut("position") {
            slot.replace(property);
        }
    }

    pub fn set_orientation(&mut self, property: Property) {
        if let Some(mut slot) = self.slot_mut("orientation") {
            slot.replace(property);
        }
    }

    pub fn set_view_from(&mut self, property: Property) {
        if let Some(mut slot) = self.slot_mut("viewFrom") {
            slot.replace(property);
        }
    }

    pub fn set_description(&mut self, property: Property) {
        if let Some(mut slot) = self.slot_mut("description") {
            slot.replace(property);
        }
    }

    /// Mutable access to a top-level property slot by packet name.
    pub(crate) fn slot_mut(&mut self, name: &str) -> Option<FieldSlot<'_>> {
        let (slot, tag): (&mut Option<Property>, &'static str) = match name {
            "position" => (&mut self.position, "position"),
            "orientation" => (&mut self.orientation, "orientation"),
            "viewFrom" => (&mut self.view_from, "viewFrom"),
            "description" => (&mut self.description, "description"),
            _ => return None,
        };
        Some(FieldSlot::new(slot, &self.definition_changed, tag))
    }

    // ------------------------------------------------------------------
    // Graphics packs
    // ------------------------------------------------------------------

    pub fn billboard(&self) -> Option<&BillboardGraphics> {
        self.billboard.as_ref()
    }

    pub fn label(&self) -> Option<&LabelGraphics> {
        self.label.as_ref()
    }

    pub fn point(&self) -> Option<&PointGraphics> {
        self.point.as_ref()
    }

    pub fn path(&self) -> Option<&PathGraphics> {
        self.path.as_ref()
    }

    pub fn polyline(&self) -> Option<&PolylineGraphics> {
        self.polyline.as_ref()
    }

    pub fn polygon(&self) -> Option<&PolygonGraphics> {
        self.polygon.as_ref()
    }

    pub fn billboard_mut(&mut self) -> &mut BillboardGraphics {
        self.billboard.get_or_insert_with(BillboardGraphics::new)
    }

    pub fn label_mut(&mut self) -> &mut LabelGraphics {
        self.label.get_or_insert_with(LabelGraphics::new)
    }

    pub fn point_mut(&mut self) -> &mut PointGraphics {
        self.point.get_or_insert_with(PointGraphics::new)
    }

    pub fn path_mut(&mut self) -> &mut PathGraphics {
        self.path.get_or_insert_with(PathGraphics::new)
    }

    pub fn polyline_mut(&mut self) -> &mut PolylineGraphics {
        self.polyline.get_or_insert_with(PolylineGraphics::new)
    }

    pub fn polygon_mut(&mut self) -> &mut PolygonGraphics {
        self.polygon.get_or_insert_with(PolygonGraphics::new)
    }

    // ------------------------------------------------------------------
    // Attribute path lookup
    // ------------------------------------------------------------------

    /// Walk an attribute path (`["position"]`, `["point", "pixelSize"]`)
    /// to the property it names, if set. Used by reference resolution.
    pub fn find_property(&self, path: &[String]) -> Option<&Property> {
        match path {
            [single] => match single.as_str() {
                "position" => self.position.as_ref(),
                "orientation" => self.orientation.as_ref(),
                "viewFrom" => self.view_from.as_ref(),
                "description" => self.description.as_ref(),
                _ => None,
            },
            [pack, field] => match pack.as_str() {
                "billboard" => self.billboard.as_ref()?.field(field),
                "label" => self.label.as_ref()?.field(field),
                "point" => self.point.as_ref()?.field(field),
                "path" => self.path.as_ref()?.field(field),
                "polyline" => self.polyline.as_ref()?.field(field),
                "polygon" => self.polygon.as_ref()?.field(field),
                _ => None,
            },
            _ => None,
        }
    }
}
