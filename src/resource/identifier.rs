use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{typeId, id?, key?}` pointing at a record of another type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    pub type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ResourceIdentifier {
    pub fn by_id(type_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            id: Some(id.into()),
            key: None,
        }
    }

    pub fn by_key(type_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            id: None,
            key: Some(key.into()),
        }
    }

    /// Human readable form used in error messages, e.g. `cart:id=c1`.
    pub fn describe(&self) -> String {
        match (&self.id, &self.key) {
            (Some(id), _) => format!("{}:id={}", self.type_id, id),
            (None, Some(key)) => format!("{}:key={}", self.type_id, key),
            (None, None) => format!("{}:<none>", self.type_id),
        }
    }
}

/// A resolved `{typeId, id}` reference; `obj` is filled by expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub type_id: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<Value>,
}

impl Reference {
    pub fn new(type_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            id: id.into(),
            obj: None,
        }
    }

    /// Parse a JSON object that looks like a reference.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            type_id: map.get("typeId")?.as_str()?.to_string(),
            id: map.get("id")?.as_str()?.to_string(),
            obj: map.get("obj").cloned(),
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
