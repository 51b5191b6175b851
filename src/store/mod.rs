//! Multi-tenant resource storage.
//!
//! Records are partitioned by project key, then by resource type. Each
//! partition keeps an id index and a key index; queries are full scans that
//! run the predicate evaluator over every record.

mod collection;
mod in_memory;
mod sort;

use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::predicate::Expr;
use crate::resource::{Resource, ResourceIdentifier};

pub use in_memory::InMemoryStore;
pub use sort::{SortDirection, SortKey};

/// Filter, ordering and paging for [`ResourceStore::query`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub predicate: Option<Expr>,
    pub sort: Vec<SortKey>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            predicate: None,
            sort: Vec::new(),
            offset: 0,
            limit: 20,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedQueryResult {
    pub limit: usize,
    pub offset: usize,
    /// Number of records in this page.
    pub count: usize,
    /// Number of matching records before paging.
    pub total: usize,
    pub results: Vec<Resource>,
}

impl PagedQueryResult {
    pub fn empty(offset: usize, limit: usize) -> Self {
        Self {
            limit,
            offset,
            count: 0,
            total: 0,
            results: Vec::new(),
        }
    }
}

/// Storage backend for resources.
///
/// Absence is reported as `Ok(None)`; errors are reserved for key
/// collisions, malformed input and lock poisoning.
pub trait ResourceStore: Send + Sync {
    /// Insert or overwrite a record by id. The record's type id selects the
    /// collection.
    fn add(&self, project_key: &str, resource: Resource) -> Result<Resource>;

    fn get(&self, project_key: &str, type_id: &str, id: &str) -> Result<Option<Resource>>;

    fn get_by_key(&self, project_key: &str, type_id: &str, key: &str) -> Result<Option<Resource>>;

    /// Every record of a type, in insertion order.
    fn all(&self, project_key: &str, type_id: &str) -> Result<Vec<Resource>>;

    fn query(
        &self,
        project_key: &str,
        type_id: &str,
        options: &QueryOptions,
    ) -> Result<PagedQueryResult>;

    /// Remove a record from both indices.
    fn delete(&self, project_key: &str, type_id: &str, id: &str) -> Result<Option<Resource>>;

    /// Project keys that hold at least one collection.
    fn projects(&self) -> Result<Vec<String>>;

    /// Drop every project.
    fn clear(&self) -> Result<()>;

    /// Resolve a `{typeId, id|key}` identifier.
    fn get_by_resource_identifier(
        &self,
        project_key: &str,
        identifier: &ResourceIdentifier,
    ) -> Result<Option<Resource>> {
        match (&identifier.id, &identifier.key) {
            (Some(id), None) => self.get(project_key, &identifier.type_id, id),
            (None, Some(key)) => self.get_by_key(project_key, &identifier.type_id, key),
            _ => Err(StoreError::invalid_input(format!(
                "resource identifier for {} requires exactly one of 'id' or 'key'",
                identifier.type_id
            ))),
        }
    }
}
