//! Token tree traversal.
//!
//! Walks the document with an explicit work stack so deep nesting never grows
//! the call stack. Children are pushed in reverse, which keeps the visit order
//! equal to document order.

use crate::context::ImportContext;
use dtm_core::{
    is_metadata_key, is_reference, join_path, reference_target, Alias, ImportError, SkipReason,
    TokenType, VariableValue,
};
use dtm_parser::{parse_color, parse_dimension, parse_number};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const TYPE_KEY: &str = "$type";
const VALUE_KEY: &str = "$value";
const DESCRIPTION_KEY: &str = "$description";
/// Plain description key, as written by the exporter.
const PLAIN_DESCRIPTION_KEY: &str = "description";

struct Frame<'a> {
    path: String,
    node: &'a Value,
    inherited_type: Option<&'a str>,
    inherited_description: &'a str,
}

/// Materialize every literal token of `document` and return the aliases whose
/// targets were not yet materialized when they were visited.
pub async fn traverse(
    ctx: &mut ImportContext<'_>,
    document: &Value,
) -> Result<Vec<Alias>, ImportError> {
    let Some(root) = document.as_object() else {
        warn!("Document root is not an object; nothing to import");
        return Ok(Vec::new());
    };

    let mut pending: IndexMap<String, Alias> = IndexMap::new();
    let mut stack = Vec::new();
    push_children(
        &mut stack,
        None,
        root,
        string_field(root, TYPE_KEY),
        string_field(root, DESCRIPTION_KEY).unwrap_or(""),
    );

    while let Some(frame) = stack.pop() {
        let Some(object) = frame.node.as_object() else {
            debug!(path = %frame.path, "Skipping non-object node");
            continue;
        };
        let declared_type = string_field(object, TYPE_KEY).or(frame.inherited_type);

        match object.get(VALUE_KEY) {
            Some(value) => {
                let description = string_field(object, DESCRIPTION_KEY)
                    .or_else(|| string_field(object, PLAIN_DESCRIPTION_KEY))
                    .unwrap_or(frame.inherited_description);
                visit_leaf(ctx, &mut pending, &frame.path, value, declared_type, description)
                    .await?;
            }
            None => {
                let description =
                    string_field(object, DESCRIPTION_KEY).unwrap_or(frame.inherited_description);
                push_children(&mut stack, Some(&frame.path), object, declared_type, description);
            }
        }
    }

    Ok(pending.into_values().collect())
}

fn push_children<'a>(
    stack: &mut Vec<Frame<'a>>,
    parent: Option<&str>,
    object: &'a Map<String, Value>,
    inherited_type: Option<&'a str>,
    inherited_description: &'a str,
) {
    for (key, node) in object.iter().rev() {
        if is_metadata_key(key) {
            continue;
        }
        let path = match parent {
            Some(parent) => join_path(parent, key),
            None => key.clone(),
        };
        stack.push(Frame {
            path,
            node,
            inherited_type,
            inherited_description,
        });
    }
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

async fn visit_leaf(
    ctx: &mut ImportContext<'_>,
    pending: &mut IndexMap<String, Alias>,
    name: &str,
    value: &Value,
    declared_type: Option<&str>,
    description: &str,
) -> Result<(), ImportError> {
    if let Some(reference) = value.as_str().filter(|s| is_reference(s)) {
        let alias = Alias {
            name: name.to_string(),
            token_type: declared_type.and_then(TokenType::parse),
            target: reference_target(reference),
            description: description.to_string(),
        };
        if !ctx.materialize_alias(&alias).await? {
            debug!(name, target = %alias.target, "Deferring alias");
            pending.insert(alias.name.clone(), alias);
        }
        return Ok(());
    }

    let Some(token_type) = declared_type.and_then(TokenType::parse) else {
        let declared = declared_type.unwrap_or("<none>").to_string();
        ctx.skip(name, value, SkipReason::UnsupportedTokenType(declared));
        return Ok(());
    };

    let parsed = match token_type {
        TokenType::Color => parse_color(value)
            .map(VariableValue::Color)
            .map_err(SkipReason::from),
        TokenType::Number => parse_number(value)
            .map(VariableValue::Float)
            .map_err(SkipReason::from),
        TokenType::Dimension => parse_dimension(value)
            .map(VariableValue::Float)
            .map_err(SkipReason::from),
    };

    match parsed {
        Ok(parsed) => {
            ctx.materialize(name, token_type.variable_type(), parsed, description)
                .await?;
        }
        Err(reason) => ctx.skip(name, value, reason),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VariableCache;
    use dtm_core::{Color, VariableType};
    use dtm_store::{MemoryStore, Throttle, ThrottleConfig, VariableStore};
    use serde_json::json;

    async fn run(store: &MemoryStore, document: Value) -> (ImportContext<'_>, Vec<Alias>) {
        let collection = store.create_collection("Test").await.unwrap();
        let mut ctx = ImportContext::new(
            store,
            collection.id,
            collection.modes[0].mode_id.clone(),
            VariableCache::default(),
            Throttle::new(ThrottleConfig {
                every: 0,
                delay_ms: 0,
            }),
        );
        let pending = traverse(&mut ctx, &document).await.unwrap();
        (ctx, pending)
    }

    #[tokio::test]
    async fn test_paths_follow_document_order() {
        let store = MemoryStore::new();
        let doc = json!({
            "spacing": {
                "$type": "dimension",
                "small": { "$value": "4px" },
                "large": { "$value": { "value": 16, "unit": "px" } }
            },
            "opacity": { "$type": "number", "$value": 0.5 }
        });
        let (ctx, pending) = run(&store, doc).await;

        assert!(pending.is_empty());
        let names: Vec<_> = ctx.tokens.names().collect();
        assert_eq!(names, vec!["spacing/small", "spacing/large", "opacity"]);
    }

    #[tokio::test]
    async fn test_own_type_wins_over_inherited() {
        let store = MemoryStore::new();
        let doc = json!({
            "$type": "number",
            "theme": {
                "brand": { "$type": "color", "$value": "#336699" },
                "ratio": { "$value": 1.5 }
            }
        });
        let (ctx, _) = run(&store, doc).await;

        assert_eq!(
            ctx.tokens.get("theme/brand").unwrap().variable_type,
            VariableType::Color
        );
        assert_eq!(
            ctx.tokens.get("theme/ratio").unwrap().variable_type,
            VariableType::Float
        );
    }

    #[tokio::test]
    async fn test_description_precedence() {
        let store = MemoryStore::new();
        let doc = json!({
            "color": {
                "$type": "color",
                "$description": "Palette",
                "brand": { "$value": "#336699", "$description": "Brand" },
                "plain": { "$value": "#000000", "description": "Exported" },
                "other": { "$value": "#ffffff" }
            }
        });
        let (ctx, _) = run(&store, doc).await;

        assert_eq!(ctx.tokens.get("color/brand").unwrap().description, "Brand");
        assert_eq!(ctx.tokens.get("color/plain").unwrap().description, "Exported");
        assert_eq!(ctx.tokens.get("color/other").unwrap().description, "Palette");
    }

    #[tokio::test]
    async fn test_metadata_keys_are_not_tokens() {
        let store = MemoryStore::new();
        let doc = json!({
            "$extensions": { "com.designtokensmanager": { "collection": "X" } },
            "size": { "$type": "number", "$value": 2 }
        });
        let (ctx, _) = run(&store, doc).await;
        assert_eq!(ctx.tokens.names().collect::<Vec<_>>(), vec!["size"]);
    }

    #[tokio::test]
    async fn test_forward_reference_is_deferred() {
        let store = MemoryStore::new();
        let doc = json!({
            "accent": { "$type": "color", "$value": "{color.brand}" },
            "color": { "brand": { "$type": "color", "$value": "#336699" } }
        });
        let (ctx, pending) = run(&store, doc).await;

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "accent");
        assert_eq!(pending[0].target, "color/brand");
        assert_eq!(pending[0].token_type, Some(TokenType::Color));
        assert!(!ctx.tokens.contains("accent"));
    }

    #[tokio::test]
    async fn test_backward_reference_is_materialized_immediately() {
        let store = MemoryStore::new();
        let doc = json!({
            "color": { "brand": { "$type": "color", "$value": "#336699" } },
            "accent": { "$value": " {color.brand} " }
        });
        let (ctx, pending) = run(&store, doc).await;

        assert!(pending.is_empty());
        let brand = ctx.tokens.get("color/brand").unwrap();
        let accent = ctx.tokens.get("accent").unwrap();
        assert_eq!(accent.variable_type, VariableType::Color);

        let stored = store.get_variable(&accent.id).await.unwrap().unwrap();
        let value = stored.values_by_mode.values().next().unwrap();
        assert_eq!(value.as_alias(), Some(&brand.id));
    }

    #[tokio::test]
    async fn test_bad_leaves_are_skipped_and_recorded() {
        let store = MemoryStore::new();
        let doc = json!({
            "font": { "$type": "fontFamily", "$value": "Inter" },
            "broken": { "$type": "color", "$value": "not-a-color" },
            "untyped": { "$value": 3 },
            "good": { "$type": "color", "$value": "rgb(255, 0, 0)" }
        });
        let (ctx, _) = run(&store, doc).await;

        let skipped: Vec<_> = ctx.skipped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skipped, vec!["font", "broken", "untyped"]);
        assert_eq!(
            ctx.skipped[0].reason,
            SkipReason::UnsupportedTokenType("fontFamily".to_string())
        );
        assert!(matches!(ctx.skipped[1].reason, SkipReason::Color(_)));
        assert_eq!(ctx.tokens.len(), 1);

        let good = ctx.tokens.get("good").unwrap();
        let stored = store.get_variable(&good.id).await.unwrap().unwrap();
        let color = stored.values_by_mode.values().next().unwrap().as_color().unwrap();
        assert!(color.approx_eq(&Color::rgb(1.0, 0.0, 0.0), 1e-9));
    }

    #[tokio::test]
    async fn test_non_object_root_imports_nothing() {
        let store = MemoryStore::new();
        let (ctx, pending) = run(&store, json!([1, 2, 3])).await;
        assert!(ctx.tokens.is_empty());
        assert!(pending.is_empty());
    }
}
