use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// Typed access to the fields of a JSON draft.
pub(crate) struct Draft<'a> {
    type_id: &'static str,
    fields: &'a Map<String, Value>,
}

impl<'a> Draft<'a> {
    pub(crate) fn new(type_id: &'static str, value: &'a Value) -> Result<Self> {
        let fields = value.as_object().ok_or_else(|| {
            StoreError::invalid_input(format!("{} draft must be a JSON object", type_id))
        })?;
        Ok(Self { type_id, fields })
    }

    /// A field, treating `null` as absent.
    pub(crate) fn value(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub(crate) fn required(&self, name: &str) -> Result<&'a Value> {
        self.value(name).ok_or_else(|| {
            StoreError::invalid_input(format!(
                "{} draft requires the field '{}'",
                self.type_id, name
            ))
        })
    }

    pub(crate) fn string(&self, name: &str) -> Result<Option<String>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.wrong_type(name, "a string")),
        }
    }

    pub(crate) fn required_string(&self, name: &str) -> Result<String> {
        match self.required(name)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(self.wrong_type(name, "a string")),
        }
    }

    pub(crate) fn int(&self, name: &str) -> Result<Option<i64>> {
        match self.value(name) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.wrong_type(name, "an integer")),
        }
    }

    /// An array field; absent counts as empty.
    pub(crate) fn array(&self, name: &str) -> Result<&'a [Value]> {
        match self.value(name) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(self.wrong_type(name, "an array")),
        }
    }

    pub(crate) fn object(&self, name: &str) -> Result<Option<&'a Map<String, Value>>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(self.wrong_type(name, "an object")),
        }
    }

    fn wrong_type(&self, name: &str, expected: &str) -> StoreError {
        StoreError::invalid_input(format!(
            "field '{}' of the {} draft must be {}",
            name, self.type_id, expected
        ))
    }
}
