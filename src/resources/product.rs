//! `product`: sellable items with a master variant and numbered variants.

use serde_json::{json, Map, Value};

use super::common::set_key;
use super::draft::Draft;
use crate::error::{Result, StoreError};
use crate::repository::{BuiltResource, HandlerContext, ResourceType, UpdateAction};
use crate::resource::Resource;

pub const TYPE_ID: &str = "product";

const MASTER: &str = "masterVariant";
const VARIANTS: &str = "variants";

pub(crate) fn resource_type() -> Result<ResourceType> {
    ResourceType::builder(TYPE_ID, build)
        .declare(&[
            "setKey",
            "changeName",
            "changeSlug",
            "addVariant",
            "removeVariant",
            "setAttribute",
            "publish",
            "unpublish",
        ])
        .action("setKey", set_key)
        .action("changeName", change_name)
        .action("changeSlug", change_slug)
        .action("addVariant", add_variant)
        .action("removeVariant", remove_variant)
        .action("setAttribute", set_attribute)
        .action("publish", publish)
        .action("unpublish", unpublish)
        .build()
}

fn build(_: &HandlerContext<'_>, value: &Value) -> Result<BuiltResource> {
    let draft = Draft::new(TYPE_ID, value)?;
    let mut fields = Map::new();
    fields.insert("name".into(), draft.required("name")?.clone());
    fields.insert("slug".into(), draft.required("slug")?.clone());
    if let Some(description) = draft.value("description") {
        fields.insert("description".into(), description.clone());
    }

    let empty = Value::Object(Map::new());
    let master = variant(draft.value(MASTER).unwrap_or(&empty), 1)?;
    let mut variants = Vec::new();
    for (variant_draft, id) in draft.array(VARIANTS)?.iter().zip(2..) {
        variants.push(variant(variant_draft, id)?);
    }
    let mut skus: Vec<&str> = std::iter::once(&master)
        .chain(&variants)
        .filter_map(|v| v["sku"].as_str())
        .collect();
    let total = skus.len();
    skus.sort_unstable();
    skus.dedup();
    if skus.len() != total {
        return Err(StoreError::invalid_input("variant SKUs must be unique"));
    }

    fields.insert(MASTER.into(), master);
    fields.insert(VARIANTS.into(), Value::Array(variants));
    fields.insert("published".into(), Value::Bool(false));

    Ok(BuiltResource {
        key: draft.string("key")?,
        fields,
    })
}

fn variant(draft: &Value, id: u64) -> Result<Value> {
    let draft = Draft::new("variant", draft)?;
    let mut variant = Map::new();
    variant.insert("id".into(), Value::from(id));
    for name in ["sku", "key"] {
        if let Some(s) = draft.string(name)? {
            variant.insert(name.into(), Value::String(s));
        }
    }
    variant.insert(
        "attributes".into(),
        Value::Array(draft.array("attributes")?.to_vec()),
    );
    Ok(Value::Object(variant))
}

fn all_variants(resource: &Resource) -> impl Iterator<Item = &Value> {
    resource.get(MASTER).into_iter().chain(
        resource
            .get(VARIANTS)
            .and_then(Value::as_array)
            .into_iter()
            .flatten(),
    )
}

/// A variant is addressed by `id` or by `sku`.
enum Selector<'a> {
    Id(u64),
    Sku(&'a str),
}

impl<'a> Selector<'a> {
    fn from_action(action: &'a UpdateAction, id_param: &str) -> Result<Self> {
        if let Some(id) = action.int_param(id_param)? {
            return u64::try_from(id)
                .map(Selector::Id)
                .map_err(|_| StoreError::invalid_input(format!("invalid variant id {}", id)));
        }
        match action.str_param("sku")? {
            Some(sku) => Ok(Selector::Sku(sku)),
            None => Err(StoreError::invalid_input(format!(
                "action '{}' requires either '{}' or 'sku'",
                action.action, id_param
            ))),
        }
    }

    fn matches(&self, variant: &Value) -> bool {
        match self {
            Selector::Id(id) => variant["id"].as_u64() == Some(*id),
            Selector::Sku(sku) => variant["sku"].as_str() == Some(*sku),
        }
    }

    fn not_found(&self) -> StoreError {
        match self {
            Selector::Id(id) => StoreError::invalid_input(format!("no variant with id {}", id)),
            Selector::Sku(sku) => StoreError::invalid_input(format!("no variant with sku '{}'", sku)),
        }
    }
}

fn variant_mut<'r>(resource: &'r mut Resource, selector: &Selector<'_>) -> Result<&'r mut Value> {
    if resource.get(MASTER).is_some_and(|master| selector.matches(master)) {
        return resource.field_mut(MASTER).ok_or_else(|| selector.not_found());
    }
    resource
        .field_mut(VARIANTS)
        .and_then(Value::as_array_mut)
        .and_then(|items| items.iter_mut().find(|v| selector.matches(v)))
        .ok_or_else(|| selector.not_found())
}

fn change_name(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    resource.set("name", action.required("name")?.clone());
    Ok(())
}

fn change_slug(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    resource.set("slug", action.required("slug")?.clone());
    Ok(())
}

/// New variants get the next free id.
fn add_variant(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    let next_id = all_variants(resource)
        .filter_map(|v| v["id"].as_u64())
        .max()
        .unwrap_or(0)
        + 1;
    let variant = variant(&Value::Object(action.params.clone()), next_id)?;
    if let Some(sku) = variant["sku"].as_str() {
        if all_variants(resource).any(|v| v["sku"] == sku) {
            return Err(StoreError::invalid_operation(format!(
                "a variant with sku '{}' already exists",
                sku
            )));
        }
    }
    resource
        .fields_mut()
        .entry(VARIANTS)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| StoreError::invalid_operation("variants is not an array"))?
        .push(variant);
    Ok(())
}

fn remove_variant(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let selector = Selector::from_action(action, "id")?;
    if resource.get(MASTER).is_some_and(|master| selector.matches(master)) {
        return Err(StoreError::invalid_operation(
            "the master variant cannot be removed",
        ));
    }
    let variants = resource
        .field_mut(VARIANTS)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| selector.not_found())?;
    let index = variants
        .iter()
        .position(|v| selector.matches(v))
        .ok_or_else(|| selector.not_found())?;
    variants.remove(index);
    Ok(())
}

/// Without a value the attribute is removed.
fn set_attribute(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let selector = Selector::from_action(action, "variantId")?;
    let name = action.required_str("name")?;
    let value = action.param("value").cloned();

    let variant = variant_mut(resource, &selector)?;
    let attributes = variant
        .as_object_mut()
        .ok_or_else(|| StoreError::invalid_operation("variant is not an object"))?
        .entry("attributes")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| StoreError::invalid_operation("attributes is not an array"))?;

    attributes.retain(|attribute| attribute["name"] != name);
    if let Some(value) = value {
        attributes.push(json!({ "name": name, "value": value }));
    }
    Ok(())
}

fn publish(_: &HandlerContext<'_>, resource: &mut Resource, _: &UpdateAction) -> Result<()> {
    resource.set("published", Value::Bool(true));
    Ok(())
}

fn unpublish(_: &HandlerContext<'_>, resource: &mut Resource, _: &UpdateAction) -> Result<()> {
    resource.set("published", Value::Bool(false));
    Ok(())
}
