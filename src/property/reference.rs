//! Properties that forward evaluation to another entity's attribute.
//!
//! A reference is written `"<entityId>#<attribute.path>"`; backslash
//! escapes `#`, `.`, and `\` inside ids and path segments. An empty id
//! (`#attribute`) refers to the entity the reference appears on, which
//! the packet processor resolves to a concrete id at decode time.
//!
//! Binding is lazy and order-independent: every evaluation resolves
//! against the live entity collection, so a reference created before
//! its target entity exists simply evaluates to nothing until the
//! target arrives.

use smallvec::SmallVec;

use crate::event::Event;
use crate::util::{Error, Result};

/// A property aliasing another entity's attribute by id and path.
#[derive(Clone, Debug)]
pub struct ReferenceProperty {
    target_id: String,
    path: SmallVec<[String; 2]>,
    definition_changed: Event,
}

impl ReferenceProperty {
    /// Create from an already-split id and path.
    pub fn new(target_id: impl Into<String>, path: impl IntoIterator<Item = String>) -> Result<Self> {
        let target_id = target_id.into();
        let path: SmallVec<[String; 2]> = path.into_iter().collect();
        if target_id.is_empty() || path.is_empty() || path.iter().any(String::is_empty) {
            return Err(Error::InvalidReference(format!(
                "empty id or path in '{}#{}'",
                target_id,
                path.join(".")
            )));
        }
        Ok(Self {
            target_id,
            path,
            definition_changed: Event::new(),
        })
    }

    /// Parse a `"<id>#<path>"` reference string. `owner_id` is the
    /// entity the string appeared on and resolves the self-reference
    /// form `"#path"`.
    pub fn parse(owner_id: Option<&str>, s: &str) -> Result<Self> {
        let (id_part, path_part) = split_unescaped(s, '#')
            .ok_or_else(|| Error::InvalidReference(format!("missing '#' in '{}'", s)))?;
        if split_unescaped(path_part, '#').is_some() {
            return Err(Error::InvalidReference(format!("multiple '#' in '{}'", s)));
        }

        let target_id = if id_part.is_empty() {
            owner_id
                .ok_or_else(|| {
                    Error::InvalidReference(format!("'{}' has no id and no owning entity", s))
                })?
                .to_string()
        } else {
            unescape(id_part)
        };

        let mut path: SmallVec<[String; 2]> = SmallVec::new();
        let mut rest = path_part;
        loop {
            match split_unescaped(rest, '.') {
                Some((seg, tail)) => {
                    path.push(unescape(seg));
                    rest = tail;
                }
                None => {
                    path.push(unescape(rest));
                    break;
                }
            }
        }

        Self::new(target_id, path)
    }

    #[inline]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    #[inline]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    #[inline]
    pub fn definition_changed(&self) -> &Event {
        &self.definition_changed
    }

    /// The canonical escaped string form, `id#seg.seg`.
    pub fn reference_string(&self) -> String {
        let mut out = escape(&self.target_id);
        out.push('#');
        for (i, seg) in self.path.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&escape(seg));
        }
        out
    }
}

impl PartialEq for ReferenceProperty {
    fn eq(&self, other: &Self) -> bool {
        self.target_id == other.target_id && self.path == other.path
    }
}

/// Split at the first unescaped occurrence of `sep`.
fn split_unescaped(s: &str, sep: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            return Some((&s[..i], &s[i + c.len_utf8()..]));
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '#' | '.' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let r = ReferenceProperty::parse(None, "targetId#point.pixelSize").unwrap();
        assert_eq!(r.target_id(), "targetId");
        assert_eq!(r.path(), ["point", "pixelSize"]);
    }

    #[test]
    fn test_parse_self_reference() {
        let r = ReferenceProperty::parse(Some("me"), "#position").unwrap();
        assert_eq!(r.target_id(), "me");
        assert_eq!(r.path(), ["position"]);

        assert!(ReferenceProperty::parse(None, "#position").is_err());
    }

    #[test]
    fn test_parse_escapes() {
        let r = ReferenceProperty::parse(None, r"weird\#id\.name#billboard.scale").unwrap();
        assert_eq!(r.target_id(), "weird#id.name");
        assert_eq!(r.path(), ["billboard", "scale"]);
        assert_eq!(r.reference_string(), r"weird\#id\.name#billboard.scale");
    }

    #[test]
    fn test_parse_rejects_bad_arity() {
        assert!(ReferenceProperty::parse(None, "no-hash-here").is_err());
        assert!(ReferenceProperty::parse(None, "a#b#c").is_err());
        assert!(ReferenceProperty::parse(None, "id#").is_err());
        assert!(ReferenceProperty::parse(None, "id#a..b").is_err());
    }
}
