//! Per-type behaviour plugged into the generic repository.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::UpdateAction;
use crate::error::{Result, StoreError};
use crate::resolver::ReferenceResolver;
use crate::resource::Resource;

/// What builders and action handlers get to work with.
pub struct HandlerContext<'a> {
    pub resolver: ReferenceResolver<'a>,
    pub now: DateTime<Utc>,
}

/// Domain fields produced from a draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltResource {
    pub key: Option<String>,
    pub fields: Map<String, Value>,
}

/// Turns a JSON draft into the domain part of a new record.
pub type DraftBuilder = fn(&HandlerContext<'_>, &Value) -> Result<BuiltResource>;

/// Applies one update action to the working copy of a record.
pub type ActionHandler = fn(&HandlerContext<'_>, &mut Resource, &UpdateAction) -> Result<()>;

/// Descriptor of one resource type: its id, how to build it, and its
/// update-action dispatch table.
pub struct ResourceType {
    type_id: &'static str,
    build: DraftBuilder,
    import: Option<DraftBuilder>,
    actions: BTreeMap<&'static str, ActionHandler>,
}

impl std::fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceType")
            .field("type_id", &self.type_id)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("importable", &self.import.is_some())
            .finish()
    }
}

impl ResourceType {
    pub fn builder(type_id: &'static str, build: DraftBuilder) -> ResourceTypeBuilder {
        ResourceTypeBuilder {
            type_id,
            build,
            import: None,
            declared: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn type_id(&self) -> &'static str {
        self.type_id
    }

    pub fn handler(&self, action: &str) -> Option<ActionHandler> {
        self.actions.get(action).copied()
    }

    /// Supported action names, sorted.
    pub fn supported_actions(&self) -> Vec<String> {
        self.actions.keys().map(|name| name.to_string()).collect()
    }

    pub(crate) fn build(&self, cx: &HandlerContext<'_>, draft: &Value) -> Result<BuiltResource> {
        (self.build)(cx, draft)
    }

    pub(crate) fn import(&self, cx: &HandlerContext<'_>, draft: &Value) -> Result<BuiltResource> {
        match self.import {
            Some(import) => import(cx, draft),
            None => Err(StoreError::invalid_operation(format!(
                "{} resources cannot be imported",
                self.type_id
            ))),
        }
    }
}

/// Collects a [`ResourceType`] and checks its action table on `build`.
pub struct ResourceTypeBuilder {
    type_id: &'static str,
    build: DraftBuilder,
    import: Option<DraftBuilder>,
    declared: Vec<&'static str>,
    handlers: Vec<(&'static str, ActionHandler)>,
}

impl ResourceTypeBuilder {
    /// The full set of action names this type accepts.
    pub fn declare(mut self, actions: &[&'static str]) -> Self {
        self.declared.extend_from_slice(actions);
        self
    }

    pub fn action(mut self, name: &'static str, handler: ActionHandler) -> Self {
        self.handlers.push((name, handler));
        self
    }

    pub fn import(mut self, import: DraftBuilder) -> Self {
        self.import = Some(import);
        self
    }

    /// Fails unless every declared action has exactly one handler and every
    /// handler is declared.
    pub fn build(self) -> Result<ResourceType> {
        let config_error = |message: String| {
            Err(StoreError::Configuration(format!("{}: {}", self.type_id, message)))
        };

        let declared: BTreeSet<&str> = self.declared.iter().copied().collect();
        if declared.len() != self.declared.len() {
            return config_error("action declared twice".into());
        }

        let mut actions = BTreeMap::new();
        for (name, handler) in &self.handlers {
            if !declared.contains(name) {
                return config_error(format!("handler for undeclared action '{}'", name));
            }
            if actions.insert(*name, *handler).is_some() {
                return config_error(format!("two handlers for action '{}'", name));
            }
        }

        let missing: Vec<&str> = declared
            .iter()
            .filter(|name| !actions.contains_key(*name))
            .copied()
            .collect();
        if !missing.is_empty() {
            return config_error(format!("no handler for {}", missing.join(", ")));
        }

        Ok(ResourceType {
            type_id: self.type_id,
            build: self.build,
            import: self.import,
            actions,
        })
    }
}
