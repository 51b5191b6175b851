//! Reference expansion (`expand=cart`, `expand=lineItems[*].variant`).
//!
//! Every `{typeId, id}` reference met along an expand path gets an `obj`
//! holding the referenced record. Dangling references stay as they are.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::resolver::ReferenceResolver;
use crate::resource::{Reference, Resource};
use crate::warnings::WarningLog;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    name: String,
    each: bool,
}

/// A parsed expand path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandPath {
    raw: String,
    segments: Vec<Segment>,
}

impl ExpandPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || StoreError::invalid_input(format!("invalid expand path '{}'", raw));
        let mut segments = Vec::new();
        for part in raw.trim().split('.') {
            let (name, each) = match part.strip_suffix("[*]") {
                Some(name) => (name, true),
                None => (part, false),
            };
            if name.is_empty() || name.contains(['[', ']']) {
                return Err(invalid());
            }
            segments.push(Segment {
                name: name.to_string(),
                each,
            });
        }
        Ok(Self {
            raw: raw.trim().to_string(),
            segments,
        })
    }

    pub fn parse_all(raw: &[String]) -> Result<Vec<Self>> {
        raw.iter().map(|path| Self::parse(path)).collect()
    }
}

impl fmt::Display for ExpandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

struct Expander<'a> {
    resolver: ReferenceResolver<'a>,
    warnings: &'a WarningLog,
    path: &'a ExpandPath,
}

/// Expand `paths` inside `resource` in place.
pub(crate) fn expand_resource(
    resolver: ReferenceResolver<'_>,
    warnings: &WarningLog,
    resource: &mut Resource,
    paths: &[ExpandPath],
) -> Result<()> {
    for path in paths {
        let expander = Expander {
            resolver,
            warnings,
            path,
        };
        expander.fields(resource.fields_mut(), &path.segments)?;
    }
    Ok(())
}

impl Expander<'_> {
    fn fields(&self, fields: &mut Map<String, Value>, segments: &[Segment]) -> Result<()> {
        let Some((segment, rest)) = segments.split_first() else {
            return Ok(());
        };
        let Some(target) = fields.get_mut(&segment.name) else {
            return Ok(());
        };
        match target {
            Value::Array(items) if segment.each => {
                for item in items {
                    self.target(item, rest)?;
                }
                Ok(())
            }
            Value::Array(_) => {
                self.warnings.warn_once(format!(
                    "expand path '{}': '{}' is a list, use '{}[*]'",
                    self.path, segment.name, segment.name
                ));
                Ok(())
            }
            _ => self.target(target, rest),
        }
    }

    fn target(&self, target: &mut Value, rest: &[Segment]) -> Result<()> {
        if let Some(reference) = Reference::from_value(target) {
            if reference.obj.is_none() {
                match self.resolver.lookup(&reference)? {
                    Some(resolved) => {
                        if let Value::Object(map) = target {
                            map.insert("obj".into(), resolved.to_value());
                        }
                    }
                    None => {
                        self.warnings.warn_once(format!(
                            "expand path '{}': {} {} not found",
                            self.path, reference.type_id, reference.id
                        ));
                        return Ok(());
                    }
                }
            }
            if let Some(Value::Object(obj)) = target.get_mut("obj") {
                return self.fields(obj, rest);
            }
            return Ok(());
        }

        match target {
            Value::Object(map) if !rest.is_empty() => self.fields(map, rest),
            _ if rest.is_empty() => {
                self.warnings.warn_once(format!(
                    "expand path '{}' does not point at a reference",
                    self.path
                ));
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
