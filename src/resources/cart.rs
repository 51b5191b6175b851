//! `cart`: line items collected before an order is placed.

use serde_json::{Map, Value};

use super::common::{
    custom_fields, line_item, line_items, positive_quantity, set_custom_field, set_custom_type,
    set_key, set_string_field,
};
use super::draft::Draft;
use crate::error::{Result, StoreError};
use crate::repository::{BuiltResource, HandlerContext, ResourceType, UpdateAction};
use crate::resource::Resource;

pub const TYPE_ID: &str = "cart";

const LINE_ITEMS: &str = "lineItems";

pub(crate) fn resource_type() -> Result<ResourceType> {
    ResourceType::builder(TYPE_ID, build)
        .declare(&[
            "setKey",
            "setCustomerEmail",
            "setCountry",
            "setShippingAddress",
            "addLineItem",
            "removeLineItem",
            "changeLineItemQuantity",
            "setCustomType",
            "setCustomField",
        ])
        .action("setKey", set_key)
        .action("setCustomerEmail", set_customer_email)
        .action("setCountry", set_country)
        .action("setShippingAddress", set_shipping_address)
        .action("addLineItem", add_line_item)
        .action("removeLineItem", remove_line_item)
        .action("changeLineItemQuantity", change_line_item_quantity)
        .action("setCustomType", set_custom_type)
        .action("setCustomField", set_custom_field)
        .build()
}

/// ISO 4217 style: three upper-case letters.
pub(crate) fn currency(code: &str) -> Result<&str> {
    if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(StoreError::invalid_input(format!(
            "'{}' is not a valid currency code",
            code
        )))
    }
}

fn build(cx: &HandlerContext<'_>, value: &Value) -> Result<BuiltResource> {
    let draft = Draft::new(TYPE_ID, value)?;
    let mut fields = Map::new();

    let code = draft.required_string("currency")?;
    fields.insert("currency".into(), Value::from(currency(&code)?));
    for name in ["customerEmail", "country"] {
        if let Some(s) = draft.string(name)? {
            fields.insert(name.into(), Value::String(s));
        }
    }
    if let Some(address) = draft.object("shippingAddress")? {
        fields.insert("shippingAddress".into(), Value::Object(address.clone()));
    }
    fields.insert(
        LINE_ITEMS.into(),
        Value::Array(line_items(draft.array(LINE_ITEMS)?)?),
    );
    if let Some(custom) = draft.value("custom") {
        fields.insert("custom".into(), custom_fields(cx, custom)?);
    }
    fields.insert("cartState".into(), Value::from("Active"));

    Ok(BuiltResource {
        key: draft.string("key")?,
        fields,
    })
}

fn items_mut(resource: &mut Resource) -> Result<&mut Vec<Value>> {
    resource
        .fields_mut()
        .entry(LINE_ITEMS)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| StoreError::invalid_operation("lineItems is not an array"))
}

fn position(items: &[Value], line_item_id: &str) -> Result<usize> {
    items
        .iter()
        .position(|item| item["id"] == line_item_id)
        .ok_or_else(|| {
            StoreError::invalid_input(format!("no line item with id '{}'", line_item_id))
        })
}

fn quantity_of(item: &Value) -> u64 {
    item["quantity"].as_u64().unwrap_or(0)
}

fn set_customer_email(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    set_string_field(resource, action, "customerEmail")
}

fn set_country(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    set_string_field(resource, action, "country")
}

fn set_shipping_address(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let address = match action.param("address") {
        None => Value::Null,
        Some(address @ Value::Object(_)) => address.clone(),
        Some(_) => return Err(StoreError::invalid_input("address must be an object")),
    };
    resource.set("shippingAddress", address);
    Ok(())
}

/// Adding a SKU that is already in the cart raises its quantity.
fn add_line_item(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let item = line_item(&Value::Object(action.params.clone()))?;
    let items = items_mut(resource)?;
    match items.iter_mut().find(|existing| existing["sku"] == item["sku"]) {
        Some(existing) => {
            existing["quantity"] = Value::from(quantity_of(existing) + quantity_of(&item));
        }
        None => items.push(item),
    }
    Ok(())
}

/// Without a quantity the whole line item goes.
fn remove_line_item(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let line_item_id = action.required_str("lineItemId")?;
    let quantity = action.param("quantity").map(positive_quantity).transpose()?;
    let items = items_mut(resource)?;
    let index = position(items, line_item_id)?;
    let remaining = match quantity {
        Some(quantity) => quantity_of(&items[index]).saturating_sub(quantity),
        None => 0,
    };
    if remaining == 0 {
        items.remove(index);
    } else {
        items[index]["quantity"] = Value::from(remaining);
    }
    Ok(())
}

/// Quantity 0 removes the line item.
fn change_line_item_quantity(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let line_item_id = action.required_str("lineItemId")?;
    let quantity = action.required("quantity")?.as_u64().ok_or_else(|| {
        StoreError::invalid_input("quantity must be a non-negative integer")
    })?;
    let items = items_mut(resource)?;
    let index = position(items, line_item_id)?;
    if quantity == 0 {
        items.remove(index);
    } else {
        items[index]["quantity"] = Value::from(quantity);
    }
    Ok(())
}
