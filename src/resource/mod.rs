//! Stored resource records and the identifiers that point at them.

mod identifier;
mod timestamp;

pub use identifier::{Reference, ResourceIdentifier};

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::predicate::Document;

/// A stored resource.
///
/// `id`, `version` and the timestamps are owned by the store and the update
/// pipeline; everything type specific lives in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    id: String,
    version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    last_modified_at: DateTime<Utc>,
    #[serde(skip)]
    type_id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Resource {
    /// A fresh record at version 1.
    pub fn new(
        type_id: impl Into<String>,
        id: impl Into<String>,
        key: Option<String>,
        fields: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Resource {
            id: id.into(),
            version: 1,
            key,
            created_at: now,
            last_modified_at: now,
            type_id: type_id.into(),
            fields,
        }
    }

    /// Rebuild a record from its serialized form.
    pub fn from_value(type_id: impl Into<String>, value: Value) -> Result<Self, serde_json::Error> {
        let mut resource: Resource = serde_json::from_value(value)?;
        resource.type_id = type_id.into();
        Ok(resource)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified_at(&self) -> DateTime<Utc> {
        self.last_modified_at
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Set a field; `null` removes it.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if value.is_null() {
            self.fields.remove(&name);
        } else {
            self.fields.insert(name, value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    /// A `{typeId, id}` reference to this record.
    pub fn to_reference(&self) -> Reference {
        Reference::new(self.type_id.clone(), self.id.clone())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// Record one applied update.
    pub(crate) fn bump_version(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.last_modified_at = now;
    }
}

impl Document for Resource {
    fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        match name {
            "id" => Some(Cow::Owned(Value::String(self.id.clone()))),
            "version" => Some(Cow::Owned(Value::from(self.version))),
            "key" => self.key.clone().map(|key| Cow::Owned(Value::String(key))),
            "createdAt" => Some(Cow::Owned(Value::String(timestamp::format(&self.created_at)))),
            "lastModifiedAt" => Some(Cow::Owned(Value::String(timestamp::format(
                &self.last_modified_at,
            )))),
            _ => self.fields.get(name).map(Cow::Borrowed),
        }
    }
}
