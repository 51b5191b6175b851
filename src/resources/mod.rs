//! Built-in resource types.

mod common;
mod draft;

pub mod cart;
pub mod custom_type;
pub mod order;
pub mod product;
pub mod review;

use crate::error::Result;
use crate::repository::ResourceType;

/// Every built-in type, validated.
pub fn default_types() -> Result<Vec<ResourceType>> {
    Ok(vec![
        custom_type::resource_type()?,
        review::resource_type()?,
        cart::resource_type()?,
        order::resource_type()?,
        product::resource_type()?,
    ])
}
