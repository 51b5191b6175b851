//! `order`: created from a cart or imported as-is.

use serde_json::{Map, Value};

use super::cart;
use super::common::{
    custom_fields, line_items, one_of, set_custom_field, set_custom_type, set_string_field,
};
use super::draft::Draft;
use crate::error::{Result, StoreError};
use crate::repository::{BuiltResource, HandlerContext, ResourceType, UpdateAction};
use crate::resource::Resource;

pub const TYPE_ID: &str = "order";

const ORDER_STATES: &[&str] = &["Open", "Confirmed", "Complete", "Cancelled"];
const PAYMENT_STATES: &[&str] = &["BalanceDue", "Failed", "Pending", "CreditOwed", "Paid"];
const SHIPMENT_STATES: &[&str] = &[
    "Shipped",
    "Delivered",
    "Ready",
    "Pending",
    "Delayed",
    "Partial",
    "Backorder",
];

/// Fields carried over from the cart an order is created from.
const COPIED_FROM_CART: &[&str] = &[
    "lineItems",
    "currency",
    "customerEmail",
    "country",
    "shippingAddress",
    "custom",
];

pub(crate) fn resource_type() -> Result<ResourceType> {
    ResourceType::builder(TYPE_ID, build)
        .import(import)
        .declare(&[
            "changeOrderState",
            "changePaymentState",
            "changeShipmentState",
            "setOrderNumber",
            "setCustomerEmail",
            "setCustomType",
            "setCustomField",
        ])
        .action("changeOrderState", change_order_state)
        .action("changePaymentState", change_payment_state)
        .action("changeShipmentState", change_shipment_state)
        .action("setOrderNumber", set_order_number)
        .action("setCustomerEmail", set_customer_email)
        .action("setCustomType", set_custom_type)
        .action("setCustomField", set_custom_field)
        .build()
}

fn build(cx: &HandlerContext<'_>, value: &Value) -> Result<BuiltResource> {
    let draft = Draft::new(TYPE_ID, value)?;
    let cart = cx.resolver.resolve_value(draft.required("cart")?, cart::TYPE_ID)?;
    if cart.get_str("cartState") == Some("Ordered") {
        return Err(StoreError::invalid_operation(format!(
            "cart {} has already been ordered",
            cart.id()
        )));
    }

    let mut fields = Map::new();
    fields.insert("cart".into(), cart.to_reference().to_value());
    for name in COPIED_FROM_CART {
        if let Some(value) = cart.get(name) {
            fields.insert(name.to_string(), value.clone());
        }
    }
    if let Some(number) = draft.string("orderNumber")? {
        fields.insert("orderNumber".into(), Value::String(number));
    }
    fields.insert("orderState".into(), Value::from("Open"));

    Ok(BuiltResource { key: None, fields })
}

fn import(cx: &HandlerContext<'_>, value: &Value) -> Result<BuiltResource> {
    let draft = Draft::new(TYPE_ID, value)?;
    let mut fields = Map::new();

    let code = draft.required_string("currency")?;
    fields.insert("currency".into(), Value::from(cart::currency(&code)?));
    fields.insert(
        "lineItems".into(),
        Value::Array(line_items(draft.array("lineItems")?)?),
    );
    for name in ["orderNumber", "customerEmail", "country"] {
        if let Some(s) = draft.string(name)? {
            fields.insert(name.into(), Value::String(s));
        }
    }
    let state = draft.string("orderState")?;
    let state = one_of("orderState", state.as_deref().unwrap_or("Open"), ORDER_STATES)?;
    fields.insert("orderState".into(), Value::from(state));
    if let Some(custom) = draft.value("custom") {
        fields.insert("custom".into(), custom_fields(cx, custom)?);
    }

    Ok(BuiltResource { key: None, fields })
}

fn change_state(
    resource: &mut Resource,
    action: &UpdateAction,
    field: &str,
    allowed: &[&str],
) -> Result<()> {
    let state = one_of(field, action.required_str(field)?, allowed)?;
    resource.set(field, Value::from(state));
    Ok(())
}

fn change_order_state(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    change_state(resource, action, "orderState", ORDER_STATES)
}

fn change_payment_state(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    change_state(resource, action, "paymentState", PAYMENT_STATES)
}

fn change_shipment_state(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    change_state(resource, action, "shipmentState", SHIPMENT_STATES)
}

fn set_order_number(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    set_string_field(resource, action, "orderNumber")
}

fn set_customer_email(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    set_string_field(resource, action, "customerEmail")
}
