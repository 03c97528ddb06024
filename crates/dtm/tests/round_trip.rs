//! Import, export, and import again into a fresh store.

use dtm::{
    export_collections, import_document, ImportOptions, ImportRequest, MemoryStore,
    ThrottleConfig, VariableStore, VariableValue,
};
use dtm_core::CollectionId;
use dtm_store::Variable;
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn options() -> ImportOptions {
    ImportOptions {
        throttle: ThrottleConfig {
            every: 0,
            delay_ms: 0,
        },
    }
}

fn source_document() -> Value {
    json!({
        "$extensions": { "com.designtokensmanager": { "collection": "Brand System" } },
        "color": {
            "$type": "color",
            "brand": { "$value": "#336699", "$description": "Primary" },
            "overlay": { "$value": "rgba(0, 0, 0, 0.5)" },
            "accent": { "$value": "{color.brand}" }
        },
        "spacing": {
            "$type": "dimension",
            "sm": { "$value": "4px" },
            "md": { "$value": "0.5rem" }
        },
        "line-height": { "$type": "number", "$value": 1.25 }
    })
}

/// Variables of a collection keyed by name, with alias targets replaced by
/// the target's name so two stores can be compared.
async fn by_name(store: &MemoryStore, collection: &CollectionId) -> BTreeMap<String, (Variable, Value)> {
    let collection = store.get_collection(collection).await.unwrap().unwrap();
    let mode = collection.modes[0].mode_id.clone();
    let mut variables = BTreeMap::new();
    for id in &collection.variable_ids {
        let variable = store.get_variable(id).await.unwrap().unwrap();
        let value = match variable.value_for_mode(&mode).unwrap() {
            VariableValue::Alias(target) => {
                let target = store.get_variable(target).await.unwrap().unwrap();
                json!({ "alias": target.name })
            }
            VariableValue::Color(color) => json!({ "color": [color.r, color.g, color.b, color.a] }),
            VariableValue::Float(number) => json!({ "float": number }),
            other => panic!("unexpected value {other:?}"),
        };
        variables.insert(variable.name.clone(), (variable, value));
    }
    variables
}

fn assert_same_value(left: &Value, right: &Value) {
    match (left.get("color"), right.get("color")) {
        (Some(a), Some(b)) => {
            let a: Vec<f64> = serde_json::from_value(a.clone()).unwrap();
            let b: Vec<f64> = serde_json::from_value(b.clone()).unwrap();
            for (x, y) in a.iter().zip(&b) {
                assert!((x - y).abs() < 1e-6, "{a:?} != {b:?}");
            }
        }
        _ => assert_eq!(left, right),
    }
}

#[tokio::test]
async fn test_export_reimport_preserves_variables() {
    let original = MemoryStore::new();
    let report = import_document(
        &original,
        &ImportRequest::document("system.json", source_document()),
        &options(),
    )
    .await
    .unwrap();
    assert_eq!(report.collection_name, "Brand System");
    assert!(report.unresolved.is_empty());

    let files = export_collections(&original, &[]).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "brand-system.mode-1.tokens.json");
    assert_eq!(files[0].body["color"]["accent"]["$value"], "{color.brand}");
    assert_eq!(files[0].body["color"]["brand"]["description"], "Primary");

    let copy = MemoryStore::new();
    let reimported = import_document(
        &copy,
        &ImportRequest::document(files[0].file_name.clone(), files[0].body.clone()),
        &options(),
    )
    .await
    .unwrap();
    assert_eq!(reimported.collection_name, "Brand System");
    assert!(reimported.unresolved.is_empty());
    assert!(reimported.skipped.is_empty());

    let before = by_name(&original, &report.collection_id).await;
    let after = by_name(&copy, &reimported.collection_id).await;
    assert_eq!(
        before.keys().collect::<Vec<_>>(),
        after.keys().collect::<Vec<_>>()
    );
    for (name, (variable, value)) in &before {
        let (copied, copied_value) = &after[name];
        assert_eq!(variable.resolved_type, copied.resolved_type, "{name}");
        assert_eq!(variable.description, copied.description, "{name}");
        assert_same_value(value, copied_value);
    }
    // Units are dropped on import and exported as px.
    assert_eq!(after["spacing/md"].1, json!({ "float": 0.5 }));
}

#[tokio::test]
async fn test_reimport_into_same_store_changes_nothing() {
    let store = MemoryStore::new();
    let first = import_document(
        &store,
        &ImportRequest::document("system.json", source_document()),
        &options(),
    )
    .await
    .unwrap();
    let before = by_name(&store, &first.collection_id).await;

    let files = export_collections(&store, &[]).await.unwrap();
    store.reset_stats().unwrap();
    let second = import_document(
        &store,
        &ImportRequest::document(files[0].file_name.clone(), files[0].body.clone()),
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(second.collection_id, first.collection_id);
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, before.len());
    assert_eq!(store.stats().unwrap().variables_created, 0);
    assert_eq!(store.list_collections().await.unwrap().len(), 1);

    let after = by_name(&store, &first.collection_id).await;
    for (name, (_, value)) in &before {
        assert_same_value(value, &after[name].1);
    }
}
