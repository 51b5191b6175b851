//! `type`: definitions of custom fields that other resources attach via
//! `custom.type`.

use serde_json::{Map, Value};

use super::draft::Draft;
use crate::error::{Result, StoreError};
use crate::repository::{BuiltResource, HandlerContext, ResourceType, UpdateAction};
use crate::resource::Resource;

pub const TYPE_ID: &str = "type";

const FIELD_DEFINITIONS: &str = "fieldDefinitions";

pub(crate) fn resource_type() -> Result<ResourceType> {
    ResourceType::builder(TYPE_ID, build)
        .declare(&[
            "changeKey",
            "changeName",
            "setDescription",
            "addFieldDefinition",
            "removeFieldDefinition",
        ])
        .action("changeKey", change_key)
        .action("changeName", change_name)
        .action("setDescription", set_description)
        .action("addFieldDefinition", add_field_definition)
        .action("removeFieldDefinition", remove_field_definition)
        .build()
}

fn build(_: &HandlerContext<'_>, value: &Value) -> Result<BuiltResource> {
    let draft = Draft::new(TYPE_ID, value)?;
    let key = draft.required_string("key")?;

    let mut definitions: Vec<Value> = Vec::new();
    for definition in draft.array(FIELD_DEFINITIONS)? {
        let name = definition_name(definition)?;
        if definitions.iter().any(|d| d["name"] == name) {
            return Err(StoreError::invalid_input(format!(
                "field definition '{}' appears twice",
                name
            )));
        }
        definitions.push(definition.clone());
    }

    let mut fields = Map::new();
    fields.insert("name".into(), draft.required("name")?.clone());
    if let Some(description) = draft.value("description") {
        fields.insert("description".into(), description.clone());
    }
    fields.insert(
        "resourceTypeIds".into(),
        Value::Array(draft.array("resourceTypeIds")?.to_vec()),
    );
    fields.insert(FIELD_DEFINITIONS.into(), Value::Array(definitions));

    Ok(BuiltResource {
        key: Some(key),
        fields,
    })
}

fn definition_name(definition: &Value) -> Result<&str> {
    definition
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::invalid_input("field definition requires a 'name'"))
}

fn definitions_mut(resource: &mut Resource) -> Result<&mut Vec<Value>> {
    resource
        .fields_mut()
        .entry(FIELD_DEFINITIONS)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| StoreError::invalid_operation("fieldDefinitions is not an array"))
}

fn change_key(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    let key = action.required_str("key")?;
    resource.set_key(Some(key.to_string()));
    Ok(())
}

fn change_name(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    resource.set("name", action.required("name")?.clone());
    Ok(())
}

fn set_description(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let description = action.param("description").cloned().unwrap_or(Value::Null);
    resource.set("description", description);
    Ok(())
}

fn add_field_definition(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let definition = action.required("fieldDefinition")?.clone();
    let name = definition_name(&definition)?.to_string();
    let definitions = definitions_mut(resource)?;
    if definitions.iter().any(|d| d["name"] == name.as_str()) {
        return Err(StoreError::invalid_operation(format!(
            "a field definition named '{}' already exists",
            name
        )));
    }
    definitions.push(definition);
    Ok(())
}

fn remove_field_definition(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    let name = action.required_str("fieldName")?;
    let definitions = definitions_mut(resource)?;
    let before = definitions.len();
    definitions.retain(|d| d["name"] != name);
    if definitions.len() == before {
        return Err(StoreError::invalid_operation(format!(
            "no field definition named '{}'",
            name
        )));
    }
    Ok(())
}
