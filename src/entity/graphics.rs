//! Visual attribute packs.
//!
//! Each pack is a bag of optional time-dynamic properties for one kind
//! of visual: billboards, labels, points, paths, polylines, and
//! polygons. Fields are addressed by their packet names (`pixelSize`,
//! `outlineColor`, …) so reference paths and packet decoding share one
//! lookup.

use crate::event::Event;
use crate::property::{CompositeProperty, Property};

/// Mutable access to one named property slot plus the event to raise
/// when the mutation actually changed the definition.
pub(crate) struct FieldSlot<'a> {
    pub slot: &'a mut Option<Property>,
    event: &'a Event<&'static str>,
    name: &'static str,
}

impl<'a> FieldSlot<'a> {
    pub(crate) fn new(
        slot: &'a mut Option<Property>,
        event: &'a Event<&'static str>,
        name: &'static str,
    ) -> Self {
        Self { slot, event, name }
    }

    /// Raise the owning object's definition-changed event for this field.
    pub(crate) fn notify(&self) {
        self.event.raise(&self.name);
    }

    /// Replace the slot's property, notifying only on actual change.
    pub(crate) fn replace(&mut self, property: Property) {
        if self.slot.as_ref() != Some(&property) {
            *self.slot = Some(property);
            self.notify();
        }
    }

    /// Merge an interval-scoped contribution into the slot's composite
    /// property, replacing any non-composite definition with a fresh
    /// composite first. Notifies only when the definition changed.
    pub(crate) fn merge_scoped(&mut self, span: crate::time::TimeInterval, property: Property) {
        let mut changed = false;
        if !matches!(self.slot, Some(Property::Composite(_))) {
            *self.slot = Some(Property::Composite(CompositeProperty::new()));
            changed = true;
        }
        if let Some(Property::Composite(composite)) = self.slot.as_mut() {
            changed |= composite.merge_interval(span, property);
        }
        if changed {
            self.notify();
        }
    }
}

macro_rules! graphics_pack {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($field:ident => $json:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default)]
        pub struct $name {
            $($field: Option<Property>,)+
            definition_changed: Event<&'static str>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            $(
                pub fn $field(&self) -> Option<&Property> {
                    self.$field.as_ref()
                }
            )+

            /// Look up a field by its packet name.
            pub fn field(&self, name: &str) -> Option<&Property> {
                match name {
                    $($json => self.$field.as_ref(),)+
                    _ => None,
                }
            }

            /// Replace a field by its packet name. Returns false for an
            /// unknown field name; notifies only on actual change.
            pub fn set_field(&mut self, name: &str, property: Property) -> bool {
                match self.field_mut(name) {
                    Some(mut slot) => {
                        slot.replace(property);
                        true
                    }
                    None => false,
                }
            }

            pub(crate) fn field_mut(&mut self, name: &str) -> Option<FieldSlot<'_>> {
                match name {
                    $($json => Some(FieldSlot::new(
                        &mut self.$field,
                        &self.definition_changed,
                        $json,
                    )),)+
                    _ => None,
                }
            }

            /// Raised with the field name whenever a field's definition
            /// changes.
            pub fn definition_changed(&self) -> &Event<&'static str> {
                &self.definition_changed
            }

            /// Packet names of all fields this pack understands.
            pub fn field_names() -> &'static [&'static str] {
                &[$($json),+]
            }

            /// The fields currently set, with their packet names.
            pub fn fields(&self) -> Vec<(&'static str, &Property)> {
                let mut out = Vec::new();
                $(
                    if let Some(property) = self.$field.as_ref() {
                        out.push(($json, property));
                    }
                )+
                out
            }
        }
    };
}

graphics_pack! {
    /// A screen-aligned image anchored at the entity's position.
    BillboardGraphics {
        image => "image",
        scale => "scale",
        color => "color",
        pixel_offset => "pixelOffset",
        rotation => "rotation",
        show => "show",
    }
}

graphics_pack! {
    /// Text drawn at the entity's position.
    LabelGraphics {
        text => "text",
        font => "font",
        scale => "scale",
        fill_color => "fillColor",
        outline_color => "outlineColor",
        outline_width => "outlineWidth",
        pixel_offset => "pixelOffset",
        show => "show",
    }
}

graphics_pack! {
    /// A viewport-sized dot at the entity's position.
    PointGraphics {
        color => "color",
        pixel_size => "pixelSize",
        outline_color => "outlineColor",
        outline_width => "outlineWidth",
        show => "show",
    }
}

graphics_pack! {
    /// The entity's trail: its position history drawn as a line.
    PathGraphics {
        color => "color",
        width => "width",
        lead_time => "leadTime",
        trail_time => "trailTime",
        resolution => "resolution",
        show => "show",
    }
}

graphics_pack! {
    /// A line through a fixed list of positions.
    PolylineGraphics {
        positions => "positions",
        color => "color",
        width => "width",
        show => "show",
    }
}

graphics_pack! {
    /// A filled region bounded by a fixed list of positions.
    PolygonGraphics {
        positions => "positions",
        color => "color",
        height => "height",
        extruded_height => "extrudedHeight",
        fill => "fill",
        outline => "outline",
        outline_color => "outlineColor",
        show => "show",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Value;

    #[test]
    fn test_field_lookup_by_packet_name() {
        let mut point = PointGraphics::new();
        assert!(point.field("pixelSize").is_none());

        assert!(point.set_field("pixelSize", Property::constant(Value::Number(4.0))));
        assert!(point.field("pixelSize").is_some());
        assert!(point.pixel_size().is_some());

        assert!(!point.set_field("noSuchField", Property::constant(Value::Number(0.0))));
    }

    #[test]
    fn test_set_field_notifies_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut billboard = BillboardGraphics::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        billboard.definition_changed().subscribe(move |name| {
            assert_eq!(*name, "scale");
            f.fetch_add(1, Ordering::SeqCst);
        });

        let p = Property::constant(Value::Number(2.0));
        billboard.set_field("scale", p.clone());
        billboard.set_field("scale", p);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
