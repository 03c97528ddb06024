//! Token naming, references, and the per-import working set.

use crate::types::{TokenType, VariableId, VariableType};
use indexmap::IndexMap;

/// Keys starting with this character carry metadata, not child tokens.
pub const METADATA_SIGIL: char = '$';

/// Separator between path segments in a variable name (`color/brand`).
pub const PATH_SEPARATOR: char = '/';

/// Separator between path segments inside a reference (`{color.brand}`).
pub const REFERENCE_SEPARATOR: char = '.';

pub const REFERENCE_OPEN: char = '{';
pub const REFERENCE_CLOSE: char = '}';

/// Root key holding document metadata.
pub const EXTENSIONS_KEY: &str = "$extensions";

/// Namespace inside `$extensions` carrying collection and mode naming hints.
pub const EXTENSION_NAMESPACE: &str = "com.designtokensmanager";

/// Whether a document key is metadata (`$type`, `$extensions`, ...).
pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with(METADATA_SIGIL)
}

/// Whether a raw string value is a reference to another token.
pub fn is_reference(value: &str) -> bool {
    value.trim_start().starts_with(REFERENCE_OPEN)
}

/// Normalize a reference (`{color.brand}`) to the variable name it targets (`color/brand`).
pub fn reference_target(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|&c| c != REFERENCE_OPEN && c != REFERENCE_CLOSE)
        .map(|c| if c == REFERENCE_SEPARATOR { PATH_SEPARATOR } else { c })
        .collect()
}

/// Render a variable name as a reference string (`color/brand` -> `{color.brand}`).
pub fn to_reference(name: &str) -> String {
    let dotted: String = name
        .chars()
        .map(|c| if c == PATH_SEPARATOR { REFERENCE_SEPARATOR } else { c })
        .collect();
    format!("{REFERENCE_OPEN}{dotted}{REFERENCE_CLOSE}")
}

/// Extend a token path with a child key.
pub fn join_path(parent: &str, child: &str) -> String {
    format!("{parent}{PATH_SEPARATOR}{child}")
}

/// Split a variable name into its path segments.
pub fn split_path(name: &str) -> Vec<&str> {
    name.split(PATH_SEPARATOR).collect()
}

/// A pending cross-reference discovered during traversal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alias {
    /// Name of the referencing token.
    pub name: String,
    /// Declared type of the referencing token, if any.
    pub token_type: Option<TokenType>,
    /// Name of the referenced token, already normalized to `/` form.
    pub target: String,
    pub description: String,
}

impl Alias {
    /// The declared type, if it disagrees with the type of the resolved target.
    pub fn type_conflict(&self, target: VariableType) -> Option<TokenType> {
        self.token_type
            .filter(|declared| declared.variable_type() != target)
    }
}

/// A token already written to the store during the current import.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedToken {
    pub id: VariableId,
    pub variable_type: VariableType,
    pub description: String,
}

/// Working set of materialized tokens, keyed by name in materialization order.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: IndexMap<String, MaterializedToken>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, token: MaterializedToken) {
        self.tokens.insert(name.to_string(), token);
    }

    pub fn get(&self, name: &str) -> Option<&MaterializedToken> {
        self.tokens.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MaterializedToken)> {
        self.tokens.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
