//! InMemoryStore - HashMap-backed resource storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::collection::Collection;
use super::sort::sort_resources;
use super::{PagedQueryResult, QueryOptions, ResourceStore};
use crate::error::{Result, StoreError};
use crate::predicate;
use crate::resource::Resource;

#[derive(Default)]
struct Project {
    collections: HashMap<String, Collection>,
}

/// In-memory resource store. Clone-friendly via Arc; clones share storage.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    projects: Arc<RwLock<HashMap<String, Project>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Project>>> {
        self.projects
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Project>>> {
        self.projects
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))
    }

    fn with_collection<T>(
        &self,
        project_key: &str,
        type_id: &str,
        f: impl FnOnce(&Collection) -> T,
    ) -> Result<Option<T>> {
        let projects = self.read()?;
        Ok(projects
            .get(project_key)
            .and_then(|project| project.collections.get(type_id))
            .map(f))
    }
}

impl ResourceStore for InMemoryStore {
    fn add(&self, project_key: &str, resource: Resource) -> Result<Resource> {
        if resource.type_id().is_empty() {
            return Err(StoreError::invalid_input(format!(
                "resource {} has no type id",
                resource.id()
            )));
        }
        let mut projects = self.write()?;
        let collection = projects
            .entry(project_key.to_string())
            .or_default()
            .collections
            .entry(resource.type_id().to_string())
            .or_default();
        collection.insert(resource.clone())?;
        Ok(resource)
    }

    fn get(&self, project_key: &str, type_id: &str, id: &str) -> Result<Option<Resource>> {
        Ok(self
            .with_collection(project_key, type_id, |c| c.get(id).cloned())?
            .flatten())
    }

    fn get_by_key(&self, project_key: &str, type_id: &str, key: &str) -> Result<Option<Resource>> {
        Ok(self
            .with_collection(project_key, type_id, |c| c.get_by_key(key).cloned())?
            .flatten())
    }

    fn all(&self, project_key: &str, type_id: &str) -> Result<Vec<Resource>> {
        Ok(self
            .with_collection(project_key, type_id, |c| c.iter().cloned().collect())?
            .unwrap_or_default())
    }

    fn query(
        &self,
        project_key: &str,
        type_id: &str,
        options: &QueryOptions,
    ) -> Result<PagedQueryResult> {
        let page = self.with_collection(project_key, type_id, |collection| {
            let mut matched: Vec<&Resource> = collection
                .iter()
                .filter(|resource| {
                    options
                        .predicate
                        .as_ref()
                        .map_or(true, |expr| predicate::matches(expr, *resource))
                })
                .collect();
            sort_resources(&mut matched, &options.sort);

            let total = matched.len();
            let results: Vec<Resource> = matched
                .into_iter()
                .skip(options.offset)
                .take(options.limit)
                .cloned()
                .collect();
            PagedQueryResult {
                limit: options.limit,
                offset: options.offset,
                count: results.len(),
                total,
                results,
            }
        })?;

        let page = page.unwrap_or_else(|| PagedQueryResult::empty(options.offset, options.limit));
        debug!(
            project = project_key,
            type_id,
            total = page.total,
            count = page.count,
            "query executed"
        );
        Ok(page)
    }

    fn delete(&self, project_key: &str, type_id: &str, id: &str) -> Result<Option<Resource>> {
        let mut projects = self.write()?;
        Ok(projects
            .get_mut(project_key)
            .and_then(|project| project.collections.get_mut(type_id))
            .and_then(|collection| collection.remove(id)))
    }

    fn projects(&self) -> Result<Vec<String>> {
        let projects = self.read()?;
        let mut keys: Vec<String> = projects.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }
}
