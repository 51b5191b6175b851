//! Resolution of `{typeId, id|key}` identifiers within one project.

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::resource::{Reference, Resource, ResourceIdentifier};
use crate::store::ResourceStore;

/// Resolves identifiers against one project's collections.
#[derive(Clone, Copy)]
pub struct ReferenceResolver<'a> {
    store: &'a dyn ResourceStore,
    project_key: &'a str,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(store: &'a dyn ResourceStore, project_key: &'a str) -> Self {
        Self { store, project_key }
    }

    pub fn project_key(&self) -> &'a str {
        self.project_key
    }

    /// The record an identifier points at, or `ReferenceNotResolved`.
    pub fn resolve(&self, identifier: &ResourceIdentifier) -> Result<Resource> {
        self.store
            .get_by_resource_identifier(self.project_key, identifier)?
            .ok_or_else(|| StoreError::ReferenceNotResolved {
                type_id: identifier.type_id.clone(),
                identifier: identifier.describe(),
            })
    }

    /// Like [`resolve`](Self::resolve) for a raw JSON identifier that must
    /// point at `expected_type`.
    pub fn resolve_value(&self, value: &Value, expected_type: &str) -> Result<Resource> {
        let identifier: ResourceIdentifier = serde_json::from_value(value.clone())
            .map_err(|e| StoreError::invalid_input(format!("invalid resource identifier: {}", e)))?;
        if identifier.type_id != expected_type {
            return Err(StoreError::invalid_input(format!(
                "expected a reference to {}, got {}",
                expected_type, identifier.type_id
            )));
        }
        self.resolve(&identifier)
    }

    /// Resolve a JSON identifier into the canonical `{typeId, id}` reference.
    pub fn reference(&self, value: &Value, expected_type: &str) -> Result<Reference> {
        Ok(self.resolve_value(value, expected_type)?.to_reference())
    }

    /// Look up a reference without failing when it dangles.
    pub(crate) fn lookup(&self, reference: &Reference) -> Result<Option<Resource>> {
        self.store
            .get(self.project_key, &reference.type_id, &reference.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::Utc;
    use serde_json::{json, Map};

    fn store_with_type() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add(
                "p",
                Resource::new("type", "t1", Some("shirt-fields".into()), Map::new(), Utc::now()),
            )
            .unwrap();
        store
    }

    #[test]
    fn resolves_by_id_and_key() {
        let store = store_with_type();
        let resolver = ReferenceResolver::new(&store, "p");
        let by_key = resolver
            .reference(&json!({ "typeId": "type", "key": "shirt-fields" }), "type")
            .unwrap();
        assert_eq!(by_key, Reference::new("type", "t1"));
        let by_id = resolver
            .resolve(&ResourceIdentifier::by_id("type", "t1"))
            .unwrap();
        assert_eq!(by_id.key(), Some("shirt-fields"));
    }

    #[test]
    fn dangling_identifier_is_not_resolved() {
        let store = store_with_type();
        let resolver = ReferenceResolver::new(&store, "p");
        let err = resolver
            .resolve(&ResourceIdentifier::by_key("type", "nope"))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::ReferenceNotResolved {
                type_id: "type".into(),
                identifier: "type:key=nope".into(),
            }
        );
    }

    #[test]
    fn other_projects_are_invisible() {
        let store = store_with_type();
        let resolver = ReferenceResolver::new(&store, "q");
        assert!(matches!(
            resolver.resolve(&ResourceIdentifier::by_id("type", "t1")),
            Err(StoreError::ReferenceNotResolved { .. })
        ));
    }

    #[test]
    fn wrong_type_is_invalid_input() {
        let store = store_with_type();
        let resolver = ReferenceResolver::new(&store, "p");
        assert!(matches!(
            resolver.resolve_value(&json!({ "typeId": "cart", "id": "t1" }), "type"),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            resolver.resolve_value(&json!("t1"), "type"),
            Err(StoreError::InvalidInput(_))
        ));
    }
}
