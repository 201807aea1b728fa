//! Two-phase JSON decoding of feed packets.
//!
//! A packet is decoded completely into a [`PacketUpdate`] before
//! anything is applied to the entity collection, so a malformed
//! attribute fails the whole packet and leaves prior state untouched.
//!
//! Payload shapes are format-agnostic JSON: literal scalars, typed
//! envelopes (`{"number": …}`, `{"cartesian": […]}`, `{"rgbaf": […]}`),
//! interleaved `[time, components…]` sampled arrays with an optional
//! `epoch`, `{"reference": "id#path"}` aliases, and arrays of
//! interval-scoped envelopes.

use serde_json::Value as Json;

use crate::property::{
    ExtrapolationKind, ExtrapolationPolicy, InterpolationAlgorithm, InterpolationOptions,
    Property, ReferenceProperty, SampledProperty, Value, ValueKind,
};
use crate::time::{IntervalSet, TimeInterval, TimeStamp};
use crate::util::{Color, DQuat, DVec2, DVec3, Error, Result};

use super::clock::DocumentClock;

/// Fully decoded, not-yet-applied packet.
#[derive(Debug)]
pub(crate) struct PacketUpdate {
    pub id: String,
    pub generated_id: bool,
    pub delete: bool,
    pub name: Option<String>,
    pub parent: Option<String>,
    pub availability: Option<IntervalSet>,
    pub clock: Option<DocumentClock>,
    pub version: Option<String>,
    pub slots: Vec<SlotTarget>,
}

/// Where a decoded attribute update lands on the entity.
#[derive(Clone, Copy, Debug)]
pub(crate) enum SlotPath {
    /// A top-level property slot (`position`, `orientation`, …).
    Top(&'static str),
    /// A field inside a graphics pack (`point.pixelSize`, …).
    Pack {
        pack: &'static str,
        field: &'static str,
    },
}

/// One attribute's contributions, in packet order. A contribution
/// without an interval replaces the slot; one with an interval merges
/// into the slot's composite.
#[derive(Debug)]
pub(crate) struct SlotTarget {
    pub path: SlotPath,
    pub contributions: Vec<(Option<TimeInterval>, Property)>,
}

const TOP_SLOTS: &[(&str, ValueKind)] = &[
    ("position", ValueKind::Vec3),
    ("orientation", ValueKind::Quat),
    ("viewFrom", ValueKind::Vec3),
    ("description", ValueKind::String),
];

const PACKS: &[(&str, &[(&str, ValueKind)])] = &[
    (
        "billboard",
        &[
            ("image", ValueKind::String),
            ("scale", ValueKind::Number),
            ("color", ValueKind::Color),
            ("pixelOffset", ValueKind::Vec2),
            ("rotation", ValueKind::Number),
            ("show", ValueKind::Boolean),
        ],
    ),
    (
        "label",
        &[
            ("text", ValueKind::String),
            ("font", ValueKind::String),
            ("scale", ValueKind::Number),
            ("fillColor", ValueKind::Color),
            ("outlineColor", ValueKind::Color),
            ("outlineWidth", ValueKind::Number),
            ("pixelOffset", ValueKind::Vec2),
            ("show", ValueKind::Boolean),
        ],
    ),
    (
        "point",
        &[
            ("color", ValueKind::Color),
            ("pixelSize", ValueKind::Number),
            ("outlineColor", ValueKind::Color),
            ("outlineWidth", ValueKind::Number),
            ("show", ValueKind::Boolean),
        ],
    ),
    (
        "path",
        &[
            ("color", ValueKind::Color),
            ("width", ValueKind::Number),
            ("leadTime", ValueKind::Number),
            ("trailTime", ValueKind::Number),
            ("resolution", ValueKind::Number),
            ("show", ValueKind::Boolean),
        ],
    ),
    (
        "polyline",
        &[
            ("positions", ValueKind::VertexList),
            ("color", ValueKind::Color),
            ("width", ValueKind::Number),
            ("show", ValueKind::Boolean),
        ],
    ),
    (
        "polygon",
        &[
            ("positions", ValueKind::VertexList),
            ("color", ValueKind::Color),
            ("height", ValueKind::Number),
            ("extrudedHeight", ValueKind::Number),
            ("fill", ValueKind::Boolean),
            ("outline", ValueKind::Boolean),
            ("outlineColor", ValueKind::Color),
            ("show", ValueKind::Boolean),
        ],
    ),
];

/// Decode one packet. `fallback_id` names the entity when the packet
/// carries no id of its own.
pub(crate) fn decode_packet(json: &Json, fallback_id: &str) -> Result<PacketUpdate> {
    let obj = json
        .as_object()
        .ok_or_else(|| Error::other("packet must be a JSON object"))?;

    let (id, generated_id) = match obj.get("id") {
        Some(Json::String(s)) if !s.is_empty() => (s.clone(), false),
        Some(_) => return Err(Error::other("packet id must be a non-empty string")),
        None => (fallback_id.to_string(), true),
    };
    let attr_err = |attribute: &str| {
        let id = id.clone();
        let attribute = attribute.to_string();
        move |e: Error| Error::malformed(id, attribute, e.to_string())
    };

    let mut update = PacketUpdate {
        id: id.clone(),
        generated_id,
        delete: false,
        name: None,
        parent: None,
        availability: None,
        clock: None,
        version: None,
        slots: Vec::new(),
    };

    if matches!(obj.get("delete"), Some(Json::Bool(true))) {
        update.delete = true;
        return Ok(update);
    }

    let scope = match obj.get("interval") {
        Some(Json::String(s)) => Some(TimeInterval::from_iso8601(s).map_err(attr_err("interval"))?),
        Some(_) => {
            return Err(Error::malformed(id.clone(), "interval", "must be a string"));
        }
        None => None,
    };

    match obj.get("name") {
        Some(Json::String(s)) => update.name = Some(s.clone()),
        Some(_) => return Err(Error::malformed(id.clone(), "name", "must be a string")),
        None => {}
    }

    match obj.get("parent") {
        Some(Json::String(s)) => {
            if *s == id {
                return Err(Error::malformed(
                    id.clone(),
                    "parent",
                    "entity cannot be its own parent",
                ));
            }
            update.parent = Some(s.clone());
        }
        Some(_) => return Err(Error::malformed(id.clone(), "parent", "must be a string")),
        None => {}
    }

    if let Some(payload) = obj.get("availability") {
        update.availability = Some(decode_availability(payload).map_err(attr_err("availability"))?);
    }

    if let Some(payload) = obj.get("clock") {
        update.clock = Some(DocumentClock::decode(payload).map_err(attr_err("clock"))?);
    }

    match obj.get("version") {
        Some(Json::String(s)) => update.version = Some(s.clone()),
        Some(_) => return Err(Error::malformed(id.clone(), "version", "must be a string")),
        None => {}
    }

    for &(attr, kind) in TOP_SLOTS {
        if let Some(payload) = obj.get(attr) {
            let contributions =
                decode_value_spec(kind, payload, scope, &id).map_err(attr_err(attr))?;
            update.slots.push(SlotTarget {
                path: SlotPath::Top(attr),
                contributions,
            });
        }
    }

    for &(pack, fields) in PACKS {
        if let Some(payload) = obj.get(pack) {
            decode_pack(&mut update.slots, pack, fields, payload, scope, &id)?;
        }
    }

    Ok(update)
}

/// Availability payloads: one `start/stop` string or an array of them.
fn decode_availability(json: &Json) -> Result<IntervalSet> {
    let mut set = IntervalSet::new();
    match json {
        Json::String(s) => set.add(TimeInterval::from_iso8601(s)?),
        Json::Array(items) => {
            for item in items {
                let s = item
                    .as_str()
                    .ok_or_else(|| Error::other("availability entries must be strings"))?;
                set.add(TimeInterval::from_iso8601(s)?);
            }
        }
        _ => return Err(Error::other("must be a string or array of strings")),
    }
    Ok(set)
}

/// Decode one graphics pack: a single object or an array of
/// interval-scoped objects, each holding any of the pack's fields. An
/// `interval` on the pack object constrains every field inside it.
fn decode_pack(
    slots: &mut Vec<SlotTarget>,
    pack: &'static str,
    fields: &'static [(&'static str, ValueKind)],
    payload: &Json,
    scope: Option<TimeInterval>,
    owner_id: &str,
) -> Result<()> {
    let attr_err = |field: &str, e: Error| {
        Error::malformed(owner_id, format!("{pack}.{field}"), e.to_string())
    };

    let elements: Vec<&serde_json::Map<String, Json>> = match payload {
        Json::Object(map) => vec![map],
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| Error::malformed(owner_id, pack, "array entries must be objects"))
            })
            .collect::<Result<_>>()?,
        _ => return Err(Error::malformed(owner_id, pack, "must be an object or array")),
    };

    for element in elements {
        let pack_scope = match element.get("interval") {
            Some(Json::String(s)) => {
                let own = TimeInterval::from_iso8601(s).map_err(|e| attr_err("interval", e))?;
                Some(match scope {
                    Some(outer) => outer.intersection(&own),
                    None => own,
                })
            }
            Some(_) => return Err(Error::malformed(owner_id, pack, "interval must be a string")),
            None => scope,
        };
        // The pack's interval may fall entirely outside the packet's
        if pack_scope.as_ref().is_some_and(TimeInterval::is_empty) {
            continue;
        }

        for &(field, kind) in fields {
            if let Some(payload) = element.get(field) {
                let contributions = decode_value_spec(kind, payload, pack_scope, owner_id)
                    .map_err(|e| attr_err(field, e))?;
                slots.push(SlotTarget {
                    path: SlotPath::Pack { pack, field },
                    contributions,
                });
            }
        }
    }

    Ok(())
}

/// Decode one attribute payload into its ordered contributions.
fn decode_value_spec(
    kind: ValueKind,
    json: &Json,
    scope: Option<TimeInterval>,
    owner_id: &str,
) -> Result<Vec<(Option<TimeInterval>, Property)>> {
    match json {
        Json::Array(items) if items.iter().all(Json::is_object) && !items.is_empty() => {
            let mut out = Vec::new();
            for item in items {
                if let Some(map) = item.as_object() {
                    out.extend(decode_envelope(kind, map, scope, owner_id)?);
                }
            }
            Ok(out)
        }
        Json::Object(map) => decode_envelope(kind, map, scope, owner_id),
        literal => {
            let value = decode_literal(kind, literal)?;
            Ok(vec![(scope, Property::constant(value))])
        }
    }
}

/// Decode a `{interval?, epoch?, reference? | <dataKey>: …}` envelope.
fn decode_envelope(
    kind: ValueKind,
    map: &serde_json::Map<String, Json>,
    scope: Option<TimeInterval>,
    owner_id: &str,
) -> Result<Vec<(Option<TimeInterval>, Property)>> {
    let combined = match map.get("interval") {
        Some(Json::String(s)) => {
            let own = TimeInterval::from_iso8601(s)?;
            Some(match scope {
                Some(outer) => outer.intersection(&own),
                None => own,
            })
        }
        Some(_) => return Err(Error::other("interval must be a string")),
        None => scope,
    };
    if combined.as_ref().is_some_and(TimeInterval::is_empty) {
        return Ok(Vec::new());
    }

    if let Some(reference) = map.get("reference") {
        let s = reference
            .as_str()
            .ok_or_else(|| Error::other("reference must be a string"))?;
        let property = Property::Reference(ReferenceProperty::parse(Some(owner_id), s)?);
        return Ok(vec![(combined, property)]);
    }

    let (data, byte_color) = find_data(kind, map)?;
    let property = match kind {
        ValueKind::VertexList => Property::constant(decode_vertex_list(data)?),
        ValueKind::String | ValueKind::Boolean => Property::constant(decode_literal(kind, data)?),
        _ => decode_packed(kind, data, map, byte_color)?,
    };
    Ok(vec![(combined, property)])
}

/// Find the typed data key for `kind` inside an envelope.
fn find_data<'a>(
    kind: ValueKind,
    map: &'a serde_json::Map<String, Json>,
) -> Result<(&'a Json, bool)> {
    let keys: &[&str] = match kind {
        ValueKind::Number => &["number"],
        ValueKind::Boolean => &["boolean"],
        ValueKind::String => &["string", "uri", "image"],
        ValueKind::Vec2 => &["cartesian2"],
        ValueKind::Vec3 | ValueKind::VertexList => &["cartesian"],
        ValueKind::Quat => &["unitQuaternion"],
        ValueKind::Color => &["rgbaf", "rgba"],
    };
    for key in keys {
        if let Some(data) = map.get(*key) {
            return Ok((data, *key == "rgba"));
        }
    }
    if kind == ValueKind::Vec3
        && (map.contains_key("cartographicDegrees") || map.contains_key("cartographicRadians"))
    {
        return Err(Error::other(
            "geodetic positions are not supported; convert to cartesian upstream",
        ));
    }
    Err(Error::other(format!("no recognized {kind} payload key")))
}

/// Literal scalar payloads outside envelopes.
fn decode_literal(kind: ValueKind, json: &Json) -> Result<Value> {
    let value = match (kind, json) {
        (ValueKind::Number, Json::Number(n)) => n.as_f64().map(Value::Number),
        (ValueKind::Boolean, Json::Bool(b)) => Some(Value::Boolean(*b)),
        (ValueKind::String, Json::String(s)) => Some(Value::String(s.clone())),
        _ => None,
    };
    value.ok_or_else(|| {
        Error::other(format!(
            "expected a {kind} literal, got {}",
            json_type_name(json)
        ))
    })
}

/// Flat `[x, y, z, x, y, z, …]` position lists.
fn decode_vertex_list(data: &Json) -> Result<Value> {
    let numbers = as_number_slice(data)?;
    if numbers.is_empty() || numbers.len() % 3 != 0 {
        return Err(Error::other(format!(
            "vertex list length {} is not a non-zero multiple of 3",
            numbers.len()
        )));
    }
    let vertices = numbers
        .chunks_exact(3)
        .map(|c| DVec3::new(c[0], c[1], c[2]))
        .collect();
    Ok(Value::VertexList(vertices))
}

/// Packed numeric payloads: a constant component tuple, or an
/// interleaved `[time, components…]` sampled series.
fn decode_packed(
    kind: ValueKind,
    data: &Json,
    map: &serde_json::Map<String, Json>,
    byte_color: bool,
) -> Result<Property> {
    let packed = match kind {
        ValueKind::Number => 1,
        ValueKind::Vec2 => 2,
        ValueKind::Vec3 => 3,
        ValueKind::Quat | ValueKind::Color => 4,
        _ => return Err(Error::other(format!("{kind} payloads cannot be packed"))),
    };

    // A bare number is a constant scalar
    if let Json::Number(n) = data {
        if kind == ValueKind::Number {
            let n = n
                .as_f64()
                .ok_or_else(|| Error::other("number out of range"))?;
            return Ok(Property::constant(Value::Number(n)));
        }
    }

    let Json::Array(items) = data else {
        return Err(Error::other(format!(
            "expected a {kind} payload array, got {}",
            json_type_name(data)
        )));
    };

    // Exactly one component tuple of plain numbers is a constant
    if items.len() == packed && items.iter().all(Json::is_number) {
        let comps: Vec<f64> = items.iter().filter_map(Json::as_f64).collect();
        return Ok(Property::constant(value_from_components(
            kind, &comps, byte_color,
        )?));
    }

    // Otherwise interleaved samples: time, then `packed` components
    let epoch = match map.get("epoch") {
        Some(Json::String(s)) => Some(TimeStamp::from_iso8601(s)?),
        Some(_) => return Err(Error::other("epoch must be a string")),
        None => None,
    };

    let mut samples = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let time = match &items[i] {
            Json::String(s) => TimeStamp::from_iso8601(s)?,
            Json::Number(n) => {
                let offset = n
                    .as_f64()
                    .ok_or_else(|| Error::other("sample time out of range"))?;
                epoch
                    .ok_or_else(|| Error::other("numeric sample times require an epoch"))?
                    .add_seconds(offset)
            }
            other => {
                return Err(Error::other(format!(
                    "sample time must be a string or number, got {}",
                    json_type_name(other)
                )))
            }
        };
        if i + packed >= items.len() {
            return Err(Error::other(format!(
                "sampled {kind} array truncated at element {i}"
            )));
        }
        let comps: Vec<f64> = items[i + 1..=i + packed]
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| Error::other("sample components must be numbers"))
            })
            .collect::<Result<_>>()?;
        samples.push((time, value_from_components(kind, &comps, byte_color)?));
        i += 1 + packed;
    }

    let mut property = SampledProperty::new(kind)?;
    property.set_interpolation(decode_interpolation(map)?);
    property.set_extrapolation(
        decode_extrapolation(map, "backwardExtrapolationType", "backwardExtrapolationDuration")?,
        decode_extrapolation(map, "forwardExtrapolationType", "forwardExtrapolationDuration")?,
    );
    property.add_samples(samples)?;
    Ok(Property::Sampled(property))
}

fn value_from_components(kind: ValueKind, comps: &[f64], byte_color: bool) -> Result<Value> {
    let value = match (kind, comps) {
        (ValueKind::Number, [n]) => Value::Number(*n),
        (ValueKind::Vec2, [x, y]) => Value::Vec2(DVec2::new(*x, *y)),
        (ValueKind::Vec3, [x, y, z]) => Value::Vec3(DVec3::new(*x, *y, *z)),
        (ValueKind::Quat, [x, y, z, w]) => Value::Quat(DQuat::from_xyzw(*x, *y, *z, *w)),
        (ValueKind::Color, [r, g, b, a]) => {
            if byte_color {
                let byte = |v: f64| v.clamp(0.0, 255.0).round() as u8;
                Value::Color(Color::from_bytes(byte(*r), byte(*g), byte(*b), byte(*a)))
            } else {
                Value::Color(Color::new(*r as f32, *g as f32, *b as f32, *a as f32))
            }
        }
        _ => {
            return Err(Error::other(format!(
                "wrong component count for {kind}: {}",
                comps.len()
            )))
        }
    };
    Ok(value)
}

fn decode_interpolation(map: &serde_json::Map<String, Json>) -> Result<InterpolationOptions> {
    let algorithm = match map.get("interpolationAlgorithm") {
        Some(Json::String(s)) => match s.as_str() {
            "LINEAR" => InterpolationAlgorithm::Linear,
            "LAGRANGE" => InterpolationAlgorithm::Lagrange,
            other => {
                return Err(Error::other(format!(
                    "unknown interpolation algorithm '{other}'"
                )))
            }
        },
        Some(_) => return Err(Error::other("interpolationAlgorithm must be a string")),
        None => InterpolationAlgorithm::Linear,
    };
    let degree = match map.get("interpolationDegree") {
        Some(v) => v
            .as_u64()
            .ok_or_else(|| Error::other("interpolationDegree must be a non-negative integer"))?
            as usize,
        None => 1,
    };
    Ok(InterpolationOptions { algorithm, degree })
}

fn decode_extrapolation(
    map: &serde_json::Map<String, Json>,
    type_key: &str,
    duration_key: &str,
) -> Result<ExtrapolationPolicy> {
    let kind = match map.get(type_key) {
        Some(Json::String(s)) => match s.as_str() {
            "NONE" => ExtrapolationKind::None,
            "HOLD" => ExtrapolationKind::Hold,
            "EXTRAPOLATE" => ExtrapolationKind::Extrapolate,
            other => return Err(Error::other(format!("unknown extrapolation type '{other}'"))),
        },
        Some(_) => return Err(Error::other(format!("{type_key} must be a string"))),
        None => ExtrapolationKind::None,
    };
    let duration = match map.get(duration_key) {
        Some(v) => v
            .as_f64()
            .ok_or_else(|| Error::other(format!("{duration_key} must be a number")))?,
        None => 0.0,
    };
    Ok(ExtrapolationPolicy { kind, duration })
}

fn as_number_slice(json: &Json) -> Result<Vec<f64>> {
    let Json::Array(items) = json else {
        return Err(Error::other(format!(
            "expected an array of numbers, got {}",
            json_type_name(json)
        )));
    };
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| Error::other("expected an array of numbers"))
        })
        .collect()
}

fn json_type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(kind: ValueKind, payload: Json) -> Vec<(Option<TimeInterval>, Property)> {
        decode_value_spec(kind, &payload, None, "owner").unwrap()
    }

    #[test]
    fn test_literal_number() {
        let out = decode(ValueKind::Number, json!(4.5));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, Property::constant(Value::Number(4.5)));
    }

    #[test]
    fn test_constant_cartesian() {
        let out = decode(ValueKind::Vec3, json!({ "cartesian": [1.0, 2.0, 3.0] }));
        assert_eq!(
            out[0].1,
            Property::constant(Value::Vec3(DVec3::new(1.0, 2.0, 3.0)))
        );
    }

    #[test]
    fn test_sampled_cartesian_with_epoch() {
        let out = decode(
            ValueKind::Vec3,
            json!({
                "epoch": "2012-01-01T00:00:00Z",
                "cartesian": [0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 13.0]
            }),
        );
        let Property::Sampled(p) = &out[0].1 else {
            panic!("expected sampled property");
        };
        assert_eq!(p.len(), 2);
        let mid = TimeStamp::from_iso8601("2012-01-01T00:00:05Z").unwrap();
        assert_eq!(
            p.get_value(mid),
            Some(Value::Vec3(DVec3::new(6.0, 7.0, 8.0)))
        );
    }

    #[test]
    fn test_sampled_iso_times_without_epoch() {
        let out = decode(
            ValueKind::Number,
            json!({ "number": ["2012-01-01T00:00:00Z", 0.0, "2012-01-01T00:00:10Z", 10.0] }),
        );
        let Property::Sampled(p) = &out[0].1 else {
            panic!("expected sampled property");
        };
        let mid = TimeStamp::from_iso8601("2012-01-01T00:00:05Z").unwrap();
        assert_eq!(p.get_value(mid), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_numeric_times_require_epoch() {
        let err = decode_value_spec(
            ValueKind::Number,
            &json!({ "number": [0.0, 1.0, 10.0, 2.0] }),
            None,
            "owner",
        )
        .unwrap_err();
        assert!(err.to_string().contains("epoch"));
    }

    #[test]
    fn test_rgba_bytes_normalized() {
        let out = decode(ValueKind::Color, json!({ "rgba": [255, 0, 0, 255] }));
        assert_eq!(
            out[0].1,
            Property::constant(Value::Color(Color::new(1.0, 0.0, 0.0, 1.0)))
        );
    }

    #[test]
    fn test_rgbaf_passthrough() {
        let out = decode(ValueKind::Color, json!({ "rgbaf": [0.1, 0.2, 0.3, 0.4] }));
        assert_eq!(
            out[0].1,
            Property::constant(Value::Color(Color::new(0.1, 0.2, 0.3, 0.4)))
        );
    }

    #[test]
    fn test_reference_payload() {
        let out = decode(ValueKind::Number, json!({ "reference": "target#point.pixelSize" }));
        let Property::Reference(r) = &out[0].1 else {
            panic!("expected reference property");
        };
        assert_eq!(r.target_id(), "target");
    }

    #[test]
    fn test_self_reference_uses_owner() {
        let out = decode(ValueKind::Number, json!({ "reference": "#point.pixelSize" }));
        let Property::Reference(r) = &out[0].1 else {
            panic!("expected reference property");
        };
        assert_eq!(r.target_id(), "owner");
    }

    #[test]
    fn test_interval_scoped_array() {
        let out = decode(
            ValueKind::Number,
            json!([
                { "interval": "2012/2013", "number": 1.0 },
                { "interval": "2013/2014", "number": 2.0 }
            ]),
        );
        assert_eq!(out.len(), 2);
        assert!(out[0].0.is_some());
        assert_eq!(out[1].1, Property::constant(Value::Number(2.0)));
    }

    #[test]
    fn test_vertex_list() {
        let out = decode(
            ValueKind::VertexList,
            json!({ "cartesian": [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] }),
        );
        let Property::Constant(c) = &out[0].1 else {
            panic!("expected constant property");
        };
        let Value::VertexList(verts) = c.value() else {
            panic!("expected vertex list");
        };
        assert_eq!(verts.len(), 3);
    }

    #[test]
    fn test_vertex_list_bad_length() {
        assert!(decode_value_spec(
            ValueKind::VertexList,
            &json!({ "cartesian": [0.0, 0.0] }),
            None,
            "owner"
        )
        .is_err());
    }

    #[test]
    fn test_geodetic_positions_rejected_with_hint() {
        let err = decode_value_spec(
            ValueKind::Vec3,
            &json!({ "cartographicDegrees": [0.0, 0.0, 0.0] }),
            None,
            "owner",
        )
        .unwrap_err();
        assert!(err.to_string().contains("cartesian"));
    }

    #[test]
    fn test_truncated_sampled_array() {
        assert!(decode_value_spec(
            ValueKind::Vec3,
            &json!({ "cartesian": ["2012-01-01T00:00:00Z", 0.0, 1.0] }),
            None,
            "owner"
        )
        .is_err());
    }

    #[test]
    fn test_decode_packet_shapes() {
        let update = decode_packet(
            &json!({
                "id": "sat",
                "name": "Satellite",
                "availability": "2012/2013",
                "position": { "cartesian": [1.0, 2.0, 3.0] },
                "point": { "pixelSize": 5.0 }
            }),
            "fallback",
        )
        .unwrap();

        assert_eq!(update.id, "sat");
        assert!(!update.generated_id);
        assert_eq!(update.name.as_deref(), Some("Satellite"));
        assert!(update.availability.is_some());
        assert_eq!(update.slots.len(), 2);
    }

    #[test]
    fn test_decode_packet_generates_id() {
        let update = decode_packet(&json!({ "point": { "show": true } }), "entity-7").unwrap();
        assert_eq!(update.id, "entity-7");
        assert!(update.generated_id);
    }

    #[test]
    fn test_decode_packet_rejects_self_parent() {
        assert!(decode_packet(&json!({ "id": "a", "parent": "a" }), "x").is_err());
    }

    #[test]
    fn test_malformed_attribute_has_context() {
        let err = decode_packet(
            &json!({ "id": "sat", "point": { "pixelSize": "huge" } }),
            "x",
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("sat"));
        assert!(msg.contains("point.pixelSize"));
    }
}
