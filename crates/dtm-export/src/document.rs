//! Variables of one collection mode to a nested token document.

use chrono::{DateTime, SecondsFormat, Utc};
use dtm_core::{
    split_path, to_reference, ExportError, ModeId, TokenType, VariableType, VariableValue,
    EXTENSIONS_KEY, EXTENSION_NAMESPACE,
};
use dtm_parser::{export_color, export_numeric, numeric_export_type};
use dtm_store::{Collection, Mode, Variable, VariableStore};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Marker identifying documents written by this exporter.
pub const EXPORT_KEY: &str = "variables";

/// Build the document for one mode of a collection.
///
/// Only color and numeric variables with a value in `mode` are exported.
/// Aliases are written as references to the target's name; an alias whose
/// target no longer exists is left out.
pub async fn export_mode(
    store: &dyn VariableStore,
    collection: &Collection,
    mode: &Mode,
    now: DateTime<Utc>,
) -> Result<Value, ExportError> {
    let mut body = Map::new();

    for id in &collection.variable_ids {
        let Some(variable) = store.get_variable(id).await? else {
            warn!(id = %id, collection = %collection.name, "Variable listed but not found");
            continue;
        };
        if let Some(token) = export_token(store, &variable, &mode.mode_id).await? {
            insert_at_path(&mut body, &variable.name, token);
        }
    }

    body.insert(
        EXTENSIONS_KEY.to_string(),
        json!({
            EXTENSION_NAMESPACE: {
                "collection": collection.name,
                "mode": mode.name,
                "exportKey": EXPORT_KEY,
            },
            "date": now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    );
    Ok(Value::Object(body))
}

/// `{ "$type", "$value", "description" }` for one variable, or `None` if it
/// has nothing exportable in `mode`.
async fn export_token(
    store: &dyn VariableStore,
    variable: &Variable,
    mode: &ModeId,
) -> Result<Option<Value>, ExportError> {
    let name = variable.name.as_str();
    let Some(value) = variable.value_for_mode(mode) else {
        return Ok(None);
    };
    let token_type = match variable.resolved_type {
        VariableType::Color => TokenType::Color,
        VariableType::Float => numeric_export_type(name),
        VariableType::String | VariableType::Boolean => {
            debug!(name, resolved_type = %variable.resolved_type, "Not exported");
            return Ok(None);
        }
    };

    let exported = match value {
        VariableValue::Alias(target) => match store.get_variable(target).await? {
            Some(target) => Value::String(to_reference(&target.name)),
            None => {
                warn!(name, target = %target, "Alias target not found; token omitted");
                return Ok(None);
            }
        },
        VariableValue::Color(color) => export_color(color).to_value(),
        VariableValue::Float(number) => export_numeric(name, *number).1,
        VariableValue::String(_) | VariableValue::Boolean(_) => {
            warn!(name, "Value does not match resolved type; token omitted");
            return Ok(None);
        }
    };

    Ok(Some(json!({
        "$type": token_type.as_str(),
        "$value": exported,
        "description": variable.description,
    })))
}

/// Place `token` at the `/`-separated `name`, creating groups on the way.
fn insert_at_path(body: &mut Map<String, Value>, name: &str, token: Value) {
    let parts = split_path(name);
    let Some((leaf, groups)) = parts.split_last() else {
        return;
    };

    let mut node = body;
    for group in groups {
        let entry = node
            .entry(group.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        node = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
    node.insert(leaf.to_string(), token);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dtm_core::Color;
    use dtm_store::MemoryStore;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    async fn setup() -> (MemoryStore, Collection) {
        let store = MemoryStore::new();
        let collection = store.create_collection("Brand Colors").await.unwrap();
        (store, collection)
    }

    async fn add(
        store: &MemoryStore,
        collection: &Collection,
        name: &str,
        variable_type: VariableType,
        value: VariableValue,
    ) -> dtm_core::VariableId {
        let var = store
            .create_variable(name, &collection.id, variable_type)
            .await
            .unwrap();
        store
            .set_value_for_mode(&var.id, &collection.modes[0].mode_id, value)
            .await
            .unwrap();
        var.id
    }

    async fn export(store: &MemoryStore, collection: &Collection) -> Value {
        let collection = store.get_collection(&collection.id).await.unwrap().unwrap();
        export_mode(store, &collection, &collection.modes[0], fixed_time())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_dimension_and_number_categories() {
        let (store, collection) = setup().await;
        add(&store, &collection, "spacing/small", VariableType::Float, VariableValue::Float(8.0)).await;
        add(
            &store,
            &collection,
            "typography/line-height",
            VariableType::Float,
            VariableValue::Float(1.5),
        )
        .await;

        let doc = export(&store, &collection).await;
        assert_eq!(
            doc["spacing"]["small"],
            json!({ "$type": "dimension", "$value": { "value": 8, "unit": "px" }, "description": "" })
        );
        assert_eq!(
            doc["typography"]["line-height"],
            json!({ "$type": "number", "$value": 1.5, "description": "" })
        );
    }

    #[tokio::test]
    async fn test_color_and_alias() {
        let (store, collection) = setup().await;
        let brand = add(
            &store,
            &collection,
            "color/brand",
            VariableType::Color,
            VariableValue::Color(Color::from_rgb8(0x33, 0x66, 0x99)),
        )
        .await;
        store.set_description(&brand, "Primary").await.unwrap();
        add(&store, &collection, "color-alias", VariableType::Color, VariableValue::Alias(brand)).await;

        let doc = export(&store, &collection).await;
        assert_eq!(doc["color"]["brand"]["$value"]["hex"], "#336699");
        assert_eq!(doc["color"]["brand"]["description"], "Primary");
        assert_eq!(doc["color-alias"]["$type"], "color");
        assert_eq!(doc["color-alias"]["$value"], "{color.brand}");
    }

    #[tokio::test]
    async fn test_metadata() {
        let (store, collection) = setup().await;
        let doc = export(&store, &collection).await;
        assert_eq!(
            doc["$extensions"],
            json!({
                "com.designtokensmanager": {
                    "collection": "Brand Colors",
                    "mode": "Mode 1",
                    "exportKey": "variables"
                },
                "date": "2024-05-01T12:30:00.000Z"
            })
        );
    }

    #[tokio::test]
    async fn test_unset_and_unsupported_variables_are_skipped() {
        let (store, collection) = setup().await;
        store
            .create_variable("unset", &collection.id, VariableType::Float)
            .await
            .unwrap();
        add(
            &store,
            &collection,
            "label",
            VariableType::String,
            VariableValue::String("hi".to_string()),
        )
        .await;

        let doc = export(&store, &collection).await;
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["$extensions".to_string()]);
    }

    #[test]
    fn test_insert_at_path_nests_groups() {
        let mut body = Map::new();
        insert_at_path(&mut body, "a/b/c", json!(1));
        insert_at_path(&mut body, "a/b/d", json!(2));
        insert_at_path(&mut body, "e", json!(3));
        assert_eq!(
            Value::Object(body),
            json!({ "a": { "b": { "c": 1, "d": 2 } }, "e": 3 })
        );
    }
}
