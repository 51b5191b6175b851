use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// `{ "action": "setText", ...parameters }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAction {
    pub action: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl UpdateAction {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: Map::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// A parameter, treating `null` as absent.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name).filter(|v| !v.is_null())
    }

    pub fn required(&self, name: &str) -> Result<&Value> {
        self.param(name).ok_or_else(|| self.missing(name))
    }

    pub fn str_param(&self, name: &str) -> Result<Option<&str>> {
        match self.param(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(self.wrong_type(name, "a string")),
        }
    }

    pub fn required_str(&self, name: &str) -> Result<&str> {
        self.str_param(name)?.ok_or_else(|| self.missing(name))
    }

    pub fn int_param(&self, name: &str) -> Result<Option<i64>> {
        match self.param(name) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.wrong_type(name, "an integer")),
        }
    }

    fn missing(&self, name: &str) -> StoreError {
        StoreError::invalid_input(format!(
            "action '{}' requires the field '{}'",
            self.action, name
        ))
    }

    fn wrong_type(&self, name: &str, expected: &str) -> StoreError {
        StoreError::invalid_input(format!(
            "field '{}' of action '{}' must be {}",
            name, self.action, expected
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_flat_parameters() {
        let action: UpdateAction =
            serde_json::from_value(json!({ "action": "setRating", "rating": 50 })).unwrap();
        assert_eq!(action, UpdateAction::new("setRating").with("rating", 50));
        assert_eq!(action.int_param("rating").unwrap(), Some(50));
    }

    #[test]
    fn null_parameters_are_absent() {
        let action = UpdateAction::new("setKey").with("key", Value::Null);
        assert_eq!(action.str_param("key").unwrap(), None);
        assert!(matches!(
            action.required_str("key"),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn wrong_parameter_type_is_invalid_input() {
        let action = UpdateAction::new("setText").with("text", 3);
        assert!(matches!(
            action.str_param("text"),
            Err(StoreError::InvalidInput(_))
        ));
    }
}
