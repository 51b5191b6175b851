use serde::Deserialize;

use crate::predicate::Variables;

/// Query-string style parameters for [`Repository::query`](super::Repository::query).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    /// Predicate clauses, AND-ed together.
    #[serde(rename = "where")]
    pub where_: Vec<String>,
    /// Values for `:name` placeholders in `where_`.
    pub vars: Variables,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// `"path [asc|desc]"` entries, most significant first.
    pub sort: Vec<String>,
    pub expand: Vec<String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.where_.push(clause.into());
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort.push(sort.into());
        self
    }

    pub fn expand(mut self, path: impl Into<String>) -> Self {
        self.expand.push(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GetOptions {
    pub expand: Vec<String>,
}

impl GetOptions {
    pub fn expand(path: impl Into<String>) -> Self {
        Self {
            expand: vec![path.into()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeleteOptions {
    /// When set, the stored version must match.
    pub version: Option<u64>,
    pub expand: Vec<String>,
}

impl DeleteOptions {
    pub fn version(version: u64) -> Self {
        Self {
            version: Some(version),
            ..Self::default()
        }
    }
}
