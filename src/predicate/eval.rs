//! Predicate evaluation against JSON-shaped documents.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use super::ast::{Circle, CompareOp, ContainsMode, Expr, Literal};

const EARTH_RADIUS_METRES: f64 = 6_371_000.0;

/// Something a predicate can look fields up in.
pub trait Document {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>>;
}

impl Document for Value {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        match self {
            Value::Object(map) => map.get(name).map(Cow::Borrowed),
            _ => None,
        }
    }
}

impl Document for Map<String, Value> {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.get(name).map(Cow::Borrowed)
    }
}

/// Evaluate `expr` against `doc`.
pub fn matches<D: Document + ?Sized>(expr: &Expr, doc: &D) -> bool {
    match expr {
        Expr::FieldPath { field, inner } => match doc.field(field).as_deref() {
            Some(Value::Array(items)) if !items.is_empty() => {
                items.iter().any(|item| matches(inner, item))
            }
            Some(Value::Array(_)) | None => matches(inner, &Value::Null),
            Some(scope) => matches(inner, scope),
        },
        Expr::Comparison { field, op, value } => {
            any_value(doc.field(field).as_deref(), |v| compare(v, *op, value))
        }
        Expr::Existence { field, defined } => {
            let present = !matches!(doc.field(field).as_deref(), None | Some(Value::Null));
            present == *defined
        }
        Expr::Emptiness { field, empty } => match doc.field(field).as_deref() {
            Some(Value::Array(items)) => items.is_empty() == *empty,
            _ => false,
        },
        Expr::Containment {
            field,
            mode,
            values,
        } => {
            let resolved = doc.field(field);
            let present: &[Value] = match resolved.as_deref() {
                None | Some(Value::Null) => return false,
                Some(Value::Array(items)) => items,
                Some(single) => std::slice::from_ref(single),
            };
            let has = |literal: &Literal| present.iter().any(|v| equals(v, literal));
            match mode {
                ContainsMode::Any => values.iter().any(has),
                ContainsMode::All => values.iter().all(has),
            }
        }
        Expr::Membership { field, values } => any_value(doc.field(field).as_deref(), |v| {
            values.iter().any(|literal| equals(v, literal))
        }),
        Expr::Within { field, circle } => doc
            .field(field)
            .as_deref()
            .and_then(point)
            .is_some_and(|(lng, lat)| within(circle, lng, lat)),
        Expr::And(lhs, rhs) => matches(lhs, doc) && matches(rhs, doc),
        Expr::Or(lhs, rhs) => matches(lhs, doc) || matches(rhs, doc),
        Expr::Not(inner) => !matches(inner, doc),
        Expr::Group(inner) => matches(inner, doc),
    }
}

/// Arrays match when any element does; absent and `null` never match.
fn any_value(value: Option<&Value>, mut test: impl FnMut(&Value) -> bool) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => items.iter().any(|item| test(item)),
        Some(other) => test(other),
    }
}

fn compare(value: &Value, op: CompareOp, literal: &Literal) -> bool {
    let Some(ordering) = compare_literal(value, literal) else {
        return false;
    };
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

fn equals(value: &Value, literal: &Literal) -> bool {
    compare_literal(value, literal) == Some(Ordering::Equal)
}

/// Typed ordering of a stored value against a literal; `None` on type mismatch.
fn compare_literal(value: &Value, literal: &Literal) -> Option<Ordering> {
    match (value, literal) {
        (Value::String(s), Literal::String(l)) => Some(compare_strings(s, l)),
        (Value::Number(n), Literal::Number(l)) => n.as_f64()?.partial_cmp(l),
        (Value::Bool(b), Literal::Bool(l)) => Some(b.cmp(l)),
        _ => None,
    }
}

/// Total ordering of two stored values, used for sorting.
///
/// Numbers sort before strings, strings before booleans, and anything else
/// last. Among strings, dates and date-times come first in chronological
/// order, then plain text.
pub(crate) fn sort_order(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Bool(_) => 2,
            _ => 3,
        }
    }

    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.total_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => match (instant(a), instant(b)) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        },
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A date-time or a date (taken at midnight UTC).
fn instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Date-times and dates compare chronologically, everything else lexically.
fn compare_strings(a: &str, b: &str) -> Ordering {
    if let (Ok(a), Ok(b)) = (
        DateTime::parse_from_rfc3339(a),
        DateTime::parse_from_rfc3339(b),
    ) {
        return a.cmp(&b);
    }
    if let (Ok(a), Ok(b)) = (
        NaiveDate::parse_from_str(a, "%Y-%m-%d"),
        NaiveDate::parse_from_str(b, "%Y-%m-%d"),
    ) {
        return a.cmp(&b);
    }
    a.cmp(b)
}

/// `[lng, lat]` or a GeoJSON-style `{ "coordinates": [lng, lat] }`.
fn point(value: &Value) -> Option<(f64, f64)> {
    let coordinates = match value {
        Value::Array(items) => items,
        Value::Object(map) => map.get("coordinates")?.as_array()?,
        _ => return None,
    };
    match coordinates.as_slice() {
        [lng, lat] => Some((lng.as_f64()?, lat.as_f64()?)),
        _ => None,
    }
}

fn within(circle: &Circle, lng: f64, lat: f64) -> bool {
    let (lat1, lat2) = (circle.latitude.to_radians(), lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (lng - circle.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let distance = 2.0 * EARTH_RADIUS_METRES * a.sqrt().asin();
    distance <= circle.radius
}
