mod config;
mod engine;
mod error;
mod expand;
mod resolver;
mod warnings;

pub mod lock;
pub mod predicate;
pub mod repository;
pub mod resource;
pub mod resources;
pub mod store;

pub use config::StoreConfig;
pub use engine::Engine;
pub use error::{Result, StoreError};
pub use expand::ExpandPath;
pub use repository::{
    ActionHandler, BuiltResource, Context, DeleteOptions, DraftBuilder, GetOptions,
    HandlerContext, QueryParams, Repository, ResourceType, UpdateAction,
};
pub use resolver::ReferenceResolver;
pub use resource::{Reference, Resource, ResourceIdentifier};
pub use store::{InMemoryStore, PagedQueryResult, QueryOptions, ResourceStore};
pub use warnings::WarningLog;
