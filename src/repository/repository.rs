use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{DeleteOptions, GetOptions, HandlerContext, QueryParams, ResourceType, UpdateAction};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::expand::{expand_resource, ExpandPath};
use crate::lock::{record_key, LockGuard, LockManager};
use crate::predicate::parse_clauses;
use crate::resolver::ReferenceResolver;
use crate::resource::Resource;
use crate::store::{PagedQueryResult, QueryOptions, ResourceStore, SortKey};
use crate::warnings::WarningLog;

/// Request scope: every operation runs inside one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub project_key: String,
}

impl Context {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
        }
    }
}

/// Operations for one resource type, borrowed from an
/// [`Engine`](crate::Engine).
pub struct Repository<'a, S: ResourceStore, L: LockManager> {
    store: &'a S,
    locks: &'a L,
    config: &'a StoreConfig,
    warnings: &'a WarningLog,
    resource_type: &'a ResourceType,
}

impl<'a, S: ResourceStore, L: LockManager> Repository<'a, S, L> {
    pub(crate) fn new(
        store: &'a S,
        locks: &'a L,
        config: &'a StoreConfig,
        warnings: &'a WarningLog,
        resource_type: &'a ResourceType,
    ) -> Self {
        Self {
            store,
            locks,
            config,
            warnings,
            resource_type,
        }
    }

    pub fn type_id(&self) -> &'static str {
        self.resource_type.type_id()
    }

    /// Build a record from a draft and store it at version 1.
    pub fn create(&self, ctx: &Context, draft: &Value) -> Result<Resource> {
        let cx = self.handler_context(ctx);
        let built = self.resource_type.build(&cx, draft)?;
        self.insert_new(ctx, built.key, built.fields, cx.now)
    }

    /// Like [`create`](Self::create) but from the type's import draft shape.
    pub fn import(&self, ctx: &Context, draft: &Value) -> Result<Resource> {
        let cx = self.handler_context(ctx);
        let built = self.resource_type.import(&cx, draft)?;
        self.insert_new(ctx, built.key, built.fields, cx.now)
    }

    pub fn get(&self, ctx: &Context, id: &str, options: &GetOptions) -> Result<Option<Resource>> {
        let found = self.store.get(&ctx.project_key, self.type_id(), id)?;
        self.expanded(ctx, found, &options.expand)
    }

    pub fn get_by_key(
        &self,
        ctx: &Context,
        key: &str,
        options: &GetOptions,
    ) -> Result<Option<Resource>> {
        let found = self.store.get_by_key(&ctx.project_key, self.type_id(), key)?;
        self.expanded(ctx, found, &options.expand)
    }

    /// Filter, sort, page and expand.
    pub fn query(&self, ctx: &Context, params: &QueryParams) -> Result<PagedQueryResult> {
        let (limit, offset) = self.config.page(params.limit, params.offset)?;
        let predicate = parse_clauses(&params.where_, &params.vars)?;
        let sort = params
            .sort
            .iter()
            .map(|raw| SortKey::parse(raw))
            .collect::<Result<Vec<_>>>()?;
        let paths = ExpandPath::parse_all(&params.expand)?;

        let options = QueryOptions {
            predicate,
            sort,
            offset,
            limit,
        };
        let mut page = self.store.query(&ctx.project_key, self.type_id(), &options)?;
        if !paths.is_empty() {
            let resolver = ReferenceResolver::new(self.store, &ctx.project_key);
            for resource in &mut page.results {
                expand_resource(resolver, self.warnings, resource, &paths)?;
            }
        }
        Ok(page)
    }

    /// Remove a record. Returns `None` when nothing was stored under `id`.
    pub fn delete(
        &self,
        ctx: &Context,
        id: &str,
        options: &DeleteOptions,
    ) -> Result<Option<Resource>> {
        let paths = ExpandPath::parse_all(&options.expand)?;
        let key = record_key(&ctx.project_key, self.type_id(), id);
        let _guard = LockGuard::acquire(self.locks, key)?;

        let Some(current) = self.store.get(&ctx.project_key, self.type_id(), id)? else {
            return Ok(None);
        };
        if let Some(expected) = options.version {
            if current.version() != expected {
                return Err(StoreError::ConcurrentModification {
                    id: id.to_string(),
                    expected,
                    actual: current.version(),
                });
            }
        }

        let removed = self.store.delete(&ctx.project_key, self.type_id(), id)?;
        debug!(project = %ctx.project_key, type_id = self.type_id(), id, "deleted resource");
        self.expanded_with(ctx, removed, &paths)
    }

    /// Apply `actions` in order to a working copy of the stored record and
    /// persist it once.
    ///
    /// Fails with `ConcurrentModification` unless both `resource` and the
    /// stored record are at `expected_version`. Any failing action aborts
    /// the whole batch and leaves the stored record untouched. The version
    /// grows by one per applied action.
    pub fn process_update_actions(
        &self,
        ctx: &Context,
        resource: &Resource,
        expected_version: u64,
        actions: &[UpdateAction],
    ) -> Result<Resource> {
        let type_id = self.type_id();
        let key = record_key(&ctx.project_key, type_id, resource.id());
        let _guard = LockGuard::acquire(self.locks, key)?;

        let current = self
            .store
            .get(&ctx.project_key, type_id, resource.id())?
            .ok_or_else(|| StoreError::ResourceNotFound {
                type_id: type_id.to_string(),
                id: resource.id().to_string(),
            })?;

        if resource.version() != expected_version || current.version() != expected_version {
            return Err(StoreError::ConcurrentModification {
                id: resource.id().to_string(),
                expected: expected_version,
                actual: current.version(),
            });
        }

        if actions.is_empty() {
            return Ok(current);
        }

        let cx = self.handler_context(ctx);
        let mut working = current;
        for action in actions {
            let handler = self.resource_type.handler(&action.action).ok_or_else(|| {
                StoreError::InvalidAction {
                    type_id: type_id.to_string(),
                    action: action.action.clone(),
                    supported: self.resource_type.supported_actions(),
                }
            })?;
            handler(&cx, &mut working, action)?;
            working.bump_version(cx.now);
        }

        let saved = self.store.add(&ctx.project_key, working)?;
        debug!(
            project = %ctx.project_key,
            type_id,
            id = saved.id(),
            version = saved.version(),
            actions = actions.len(),
            "applied update actions"
        );
        Ok(saved)
    }

    fn handler_context<'c>(&'c self, ctx: &'c Context) -> HandlerContext<'c> {
        HandlerContext {
            resolver: ReferenceResolver::new(self.store, &ctx.project_key),
            now: Utc::now(),
        }
    }

    fn insert_new(
        &self,
        ctx: &Context,
        key: Option<String>,
        fields: serde_json::Map<String, Value>,
        now: chrono::DateTime<Utc>,
    ) -> Result<Resource> {
        let resource = Resource::new(self.type_id(), Uuid::now_v7().to_string(), key, fields, now);
        let saved = self.store.add(&ctx.project_key, resource)?;
        debug!(project = %ctx.project_key, type_id = self.type_id(), id = saved.id(), "created resource");
        Ok(saved)
    }

    fn expanded(
        &self,
        ctx: &Context,
        found: Option<Resource>,
        expand: &[String],
    ) -> Result<Option<Resource>> {
        let paths = ExpandPath::parse_all(expand)?;
        self.expanded_with(ctx, found, &paths)
    }

    fn expanded_with(
        &self,
        ctx: &Context,
        found: Option<Resource>,
        paths: &[ExpandPath],
    ) -> Result<Option<Resource>> {
        let Some(mut resource) = found else {
            return Ok(None);
        };
        if !paths.is_empty() {
            let resolver = ReferenceResolver::new(self.store, &ctx.project_key);
            expand_resource(resolver, self.warnings, &mut resource, paths)?;
        }
        Ok(Some(resource))
    }
}
