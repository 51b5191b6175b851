//! Generic per-type repository and the descriptors that drive it.

mod action;
mod descriptor;
mod params;
mod repository;

pub use action::UpdateAction;
pub use descriptor::{
    ActionHandler, BuiltResource, DraftBuilder, HandlerContext, ResourceType, ResourceTypeBuilder,
};
pub use params::{DeleteOptions, GetOptions, QueryParams};
pub use repository::{Context, Repository};
