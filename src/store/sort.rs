//! `sort` expressions such as `createdAt desc` or `name.en asc`.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::predicate::{sort_order, Document};
use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: Vec<String>,
    pub direction: SortDirection,
}

impl SortKey {
    /// Parse `path [asc|desc]`; the direction defaults to ascending.
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = || StoreError::invalid_input(format!("invalid sort expression '{}'", expression));
        let mut parts = expression.split_whitespace();
        let path = parts.next().ok_or_else(invalid)?;
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        let path: Vec<String> = path.split('.').map(String::from).collect();
        if path.iter().any(String::is_empty) {
            return Err(invalid());
        }
        Ok(Self { path, direction })
    }

    /// First value found along the path; arrays contribute their first element.
    fn value_of(&self, resource: &Resource) -> Option<Value> {
        let (first, rest) = self.path.split_first()?;
        let mut current = resource.field(first)?.into_owned();
        for segment in rest {
            current = first_element(current);
            current = current.get(segment.as_str())?.clone();
        }
        match first_element(current) {
            Value::Null => None,
            value => Some(value),
        }
    }
}

fn first_element(value: Value) -> Value {
    match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}

/// Stable multi-key sort; records missing a sort value go last.
pub(crate) fn sort_resources(resources: &mut [&Resource], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    let mut decorated: Vec<(Vec<Option<Value>>, &Resource)> = resources
        .iter()
        .map(|resource| (keys.iter().map(|k| k.value_of(resource)).collect(), *resource))
        .collect();

    decorated.sort_by(|(a, _), (b, _)| {
        for (key, (a, b)) in keys.iter().zip(a.iter().zip(b.iter())) {
            let ordering = match (a, b) {
                (Some(a), Some(b)) => {
                    let ordering = sort_order(a, b);
                    match key.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    for (slot, (_, resource)) in resources.iter_mut().zip(decorated) {
        *slot = resource;
    }
}
