//! A small custom resource type registered on top of the built-ins.

use commerce_mock_store::{
    BuiltResource, HandlerContext, Resource, ResourceType, Result, StoreError, UpdateAction,
};
use serde_json::{Map, Value};

pub const TYPE_ID: &str = "ticket";

pub fn resource_type() -> ResourceType {
    ResourceType::builder(TYPE_ID, build)
        .declare(&["changeStatus", "setTitle"])
        .action("changeStatus", change_status)
        .action("setTitle", set_title)
        .build()
        .unwrap()
}

fn build(_: &HandlerContext<'_>, draft: &Value) -> Result<BuiltResource> {
    let status = draft
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidInput("ticket requires a status".into()))?;
    let mut fields = Map::new();
    fields.insert("status".into(), Value::from(status));
    for name in ["title", "details", "tags"] {
        if let Some(value) = draft.get(name) {
            fields.insert(name.into(), value.clone());
        }
    }
    Ok(BuiltResource {
        key: draft.get("key").and_then(Value::as_str).map(str::to_string),
        fields,
    })
}

fn change_status(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    let status = action.required_str("status")?;
    resource.set("status", Value::from(status));
    Ok(())
}

fn set_title(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    let title = action.str_param("title")?.map(Value::from).unwrap_or(Value::Null);
    resource.set("title", title);
    Ok(())
}
