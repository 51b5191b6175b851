//! Fields and actions shared by several resource types.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::repository::{HandlerContext, UpdateAction};
use crate::resource::Resource;

pub(crate) const CUSTOM: &str = "custom";

/// `{type: identifier, fields?}` → `{type: {typeId, id}, fields}`.
pub(crate) fn custom_fields(cx: &HandlerContext<'_>, draft: &Value) -> Result<Value> {
    let type_identifier = draft
        .get("type")
        .filter(|v| !v.is_null())
        .ok_or_else(|| StoreError::invalid_input("custom fields require a 'type'"))?;
    let reference = cx.resolver.reference(type_identifier, "type")?;
    let fields = match draft.get("fields") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(Value::Object(fields)) => Value::Object(fields.clone()),
        Some(_) => return Err(StoreError::invalid_input("custom 'fields' must be an object")),
    };
    Ok(json!({ "type": reference.to_value(), "fields": fields }))
}

/// Line items from `[{sku, quantity?}]` drafts, each with a fresh id.
pub(crate) fn line_items(drafts: &[Value]) -> Result<Vec<Value>> {
    drafts.iter().map(line_item).collect()
}

pub(crate) fn line_item(draft: &Value) -> Result<Value> {
    let sku = draft
        .get("sku")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::invalid_input("line item requires a 'sku'"))?;
    let quantity = match draft.get("quantity") {
        None | Some(Value::Null) => 1,
        Some(value) => positive_quantity(value)?,
    };
    Ok(json!({
        "id": Uuid::now_v7().to_string(),
        "sku": sku,
        "quantity": quantity,
    }))
}

pub(crate) fn positive_quantity(value: &Value) -> Result<u64> {
    match value.as_u64() {
        Some(quantity) if quantity > 0 => Ok(quantity),
        _ => Err(StoreError::invalid_input(format!(
            "quantity must be a positive integer, got {}",
            value
        ))),
    }
}

/// Reject values outside a fixed set of enum names.
pub(crate) fn one_of<'v>(field: &str, value: &'v str, allowed: &[&str]) -> Result<&'v str> {
    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(StoreError::invalid_input(format!(
            "invalid {} '{}'; expected one of {}",
            field,
            value,
            allowed.join(", ")
        )))
    }
}

/// Copy an optional string parameter onto a field of the same name.
pub(crate) fn set_string_field(
    resource: &mut Resource,
    action: &UpdateAction,
    name: &str,
) -> Result<()> {
    let value = action.str_param(name)?.map(Value::from).unwrap_or(Value::Null);
    resource.set(name, value);
    Ok(())
}

pub(crate) fn set_key(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let key = action.str_param("key")?.map(str::to_string);
    resource.set_key(key);
    Ok(())
}

pub(crate) fn set_custom_type(
    cx: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let custom = match action.param("type") {
        None => Value::Null,
        Some(_) => custom_fields(cx, &Value::Object(action.params.clone()))?,
    };
    resource.set(CUSTOM, custom);
    Ok(())
}

pub(crate) fn set_custom_field(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let name = action.required_str("name")?.to_string();
    let value = action.param("value").cloned();
    let fields = resource
        .field_mut(CUSTOM)
        .and_then(|custom| custom.get_mut("fields"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            StoreError::invalid_operation(
                "no custom type is set; use setCustomType before setCustomField",
            )
        })?;
    match value {
        Some(value) => {
            fields.insert(name, value);
        }
        None => {
            fields.remove(&name);
        }
    }
    Ok(())
}
