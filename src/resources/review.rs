//! `review`: free-text ratings attached to a product or channel.

use serde_json::{Map, Value};

use super::common::{custom_fields, set_custom_field, set_custom_type, set_key, set_string_field};
use super::draft::Draft;
use crate::error::{Result, StoreError};
use crate::repository::{BuiltResource, HandlerContext, ResourceType, UpdateAction};
use crate::resource::{Resource, ResourceIdentifier};

pub const TYPE_ID: &str = "review";

const TARGET_TYPES: &[&str] = &["product", "channel"];

pub(crate) fn resource_type() -> Result<ResourceType> {
    ResourceType::builder(TYPE_ID, build)
        .declare(&[
            "setKey",
            "setAuthorName",
            "setTitle",
            "setText",
            "setRating",
            "setTarget",
            "setCustomType",
            "setCustomField",
        ])
        .action("setKey", set_key)
        .action("setAuthorName", set_author_name)
        .action("setTitle", set_title)
        .action("setText", set_text)
        .action("setRating", set_rating)
        .action("setTarget", set_target)
        .action("setCustomType", set_custom_type)
        .action("setCustomField", set_custom_field)
        .build()
}

fn build(cx: &HandlerContext<'_>, value: &Value) -> Result<BuiltResource> {
    let draft = Draft::new(TYPE_ID, value)?;
    let mut fields = Map::new();

    for name in ["authorName", "title", "text", "locale"] {
        if let Some(s) = draft.string(name)? {
            fields.insert(name.into(), Value::String(s));
        }
    }
    if let Some(rating) = draft.int("rating")? {
        fields.insert("rating".into(), rating_value(rating)?);
    }
    if let Some(target) = draft.value("target") {
        fields.insert("target".into(), target_reference(cx, target)?);
    }
    if let Some(custom) = draft.value("custom") {
        fields.insert("custom".into(), custom_fields(cx, custom)?);
    }
    fields.insert("includedInStatistics".into(), Value::Bool(false));

    Ok(BuiltResource {
        key: draft.string("key")?,
        fields,
    })
}

fn rating_value(rating: i64) -> Result<Value> {
    if (-100..=100).contains(&rating) {
        Ok(Value::from(rating))
    } else {
        Err(StoreError::invalid_input(format!(
            "rating must be between -100 and 100, got {}",
            rating
        )))
    }
}

fn target_reference(cx: &HandlerContext<'_>, value: &Value) -> Result<Value> {
    let identifier: ResourceIdentifier = serde_json::from_value(value.clone())
        .map_err(|e| StoreError::invalid_input(format!("invalid review target: {}", e)))?;
    if !TARGET_TYPES.contains(&identifier.type_id.as_str()) {
        return Err(StoreError::invalid_input(format!(
            "a review target must be a product or channel, got {}",
            identifier.type_id
        )));
    }
    Ok(cx.resolver.resolve(&identifier)?.to_reference().to_value())
}

fn set_author_name(
    _: &HandlerContext<'_>,
    resource: &mut Resource,
    action: &UpdateAction,
) -> Result<()> {
    set_string_field(resource, action, "authorName")
}

fn set_title(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    set_string_field(resource, action, "title")
}

fn set_text(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    set_string_field(resource, action, "text")
}

fn set_rating(_: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    let rating = match action.int_param("rating")? {
        Some(rating) => rating_value(rating)?,
        None => Value::Null,
    };
    resource.set("rating", rating);
    Ok(())
}

fn set_target(cx: &HandlerContext<'_>, resource: &mut Resource, action: &UpdateAction) -> Result<()> {
    let target = target_reference(cx, action.required("target")?)?;
    resource.set("target", target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::{self, context};
    use crate::store::{InMemoryStore, ResourceStore};
    use chrono::Utc;
    use serde_json::json;

    fn review(store: &InMemoryStore, draft: Value) -> Result<Resource> {
        let cx = context(store);
        let built = build(&cx, &draft)?;
        Ok(Resource::new(TYPE_ID, "r1", built.key, built.fields, cx.now))
    }

    fn apply(store: &InMemoryStore, resource: &mut Resource, action: UpdateAction) -> Result<()> {
        testing::apply(&resource_type()?, store, resource, action)
    }

    #[test]
    fn builds_from_draft() {
        let store = InMemoryStore::new();
        let resource = review(
            &store,
            json!({ "key": "r", "authorName": "Ann", "rating": 80, "text": "good" }),
        )
        .unwrap();
        assert_eq!(resource.key(), Some("r"));
        assert_eq!(resource.get_str("authorName"), Some("Ann"));
        assert_eq!(resource.get("rating"), Some(&json!(80)));
        assert_eq!(resource.get("includedInStatistics"), Some(&json!(false)));
    }

    #[test]
    fn rating_is_bounded() {
        let store = InMemoryStore::new();
        assert!(review(&store, json!({ "rating": 101 })).is_err());

        let mut resource = review(&store, json!({})).unwrap();
        apply(&store, &mut resource, UpdateAction::new("setRating").with("rating", -100)).unwrap();
        assert_eq!(resource.get("rating"), Some(&json!(-100)));
        assert!(matches!(
            apply(&store, &mut resource, UpdateAction::new("setRating").with("rating", -101)),
            Err(StoreError::InvalidInput(_))
        ));
        apply(&store, &mut resource, UpdateAction::new("setRating")).unwrap();
        assert_eq!(resource.get("rating"), None);
    }

    #[test]
    fn target_must_resolve() {
        let store = InMemoryStore::new();
        store
            .add("p", Resource::new("product", "pr1", Some("shoe".into()), Map::new(), Utc::now()))
            .unwrap();

        let mut resource = review(&store, json!({})).unwrap();
        apply(
            &store,
            &mut resource,
            UpdateAction::new("setTarget").with("target", json!({ "typeId": "product", "key": "shoe" })),
        )
        .unwrap();
        assert_eq!(
            resource.get("target"),
            Some(&json!({ "typeId": "product", "id": "pr1" }))
        );

        assert!(matches!(
            apply(
                &store,
                &mut resource,
                UpdateAction::new("setTarget").with("target", json!({ "typeId": "product", "id": "nope" })),
            ),
            Err(StoreError::ReferenceNotResolved { .. })
        ));
        assert!(matches!(
            apply(
                &store,
                &mut resource,
                UpdateAction::new("setTarget").with("target", json!({ "typeId": "cart", "id": "c1" })),
            ),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn custom_fields_need_a_custom_type() {
        let store = InMemoryStore::new();
        store
            .add("p", Resource::new("type", "t1", Some("review-fields".into()), Map::new(), Utc::now()))
            .unwrap();
        let mut resource = review(&store, json!({})).unwrap();

        assert!(matches!(
            apply(
                &store,
                &mut resource,
                UpdateAction::new("setCustomField").with("name", "source").with("value", "web"),
            ),
            Err(StoreError::InvalidOperation(_))
        ));

        apply(
            &store,
            &mut resource,
            UpdateAction::new("setCustomType").with("type", json!({ "typeId": "type", "key": "review-fields" })),
        )
        .unwrap();
        apply(
            &store,
            &mut resource,
            UpdateAction::new("setCustomField").with("name", "source").with("value", "web"),
        )
        .unwrap();
        assert_eq!(
            resource.get("custom"),
            Some(&json!({
                "type": { "typeId": "type", "id": "t1" },
                "fields": { "source": "web" }
            }))
        );

        apply(&store, &mut resource, UpdateAction::new("setCustomType")).unwrap();
        assert_eq!(resource.get("custom"), None);
    }
}
