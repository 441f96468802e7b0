use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Result of walking the language resource. A miss is not an error: every
/// caller supplies the value to show instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<'a>(Option<&'a str>);

impl<'a> Lookup<'a> {
    pub fn missed() -> Self {
        Self(None)
    }

    /// Chain a second lookup, consulted only when this one missed.
    pub fn or_lookup(self, next: impl FnOnce() -> Lookup<'a>) -> Self {
        match self.0 {
            Some(_) => self,
            None => next(),
        }
    }

    pub fn or(self, default: &str) -> String {
        self.0.unwrap_or(default).to_string()
    }

    pub fn or_else(self, default: impl FnOnce() -> String) -> String {
        match self.0 {
            Some(text) => text.to_string(),
            None => default(),
        }
    }

    pub fn or_empty(self) -> String {
        self.or("")
    }
}

impl<'a> From<Option<&'a str>> for Lookup<'a> {
    fn from(value: Option<&'a str>) -> Self {
        Self(value.filter(|text| !text.is_empty()))
    }
}

/// Nested language resource, e.g. `history.update.success` or
/// `tasks.account_creation.status.todo`.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    root: Value,
}

impl LabelCatalog {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let root = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(root))
    }

    /// Walk `path` segment by segment. Each segment is tried verbatim, then
    /// lower-cased: resource keys for record codes are lower case while the
    /// codes themselves usually are not. Empty or non-string leaves count as
    /// misses.
    pub fn lookup(&self, path: &[&str]) -> Lookup<'_> {
        let mut node = &self.root;
        for segment in path {
            let next = node
                .get(*segment)
                .or_else(|| node.get(segment.to_lowercase().as_str()));
            match next {
                Some(next) => node = next,
                None => return Lookup::missed(),
            }
        }
        match node.as_str() {
            Some(text) if !text.is_empty() => Lookup(Some(text)),
            _ => Lookup::missed(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeInfo {
    pub label: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct AttributeKeyDef {
    #[serde(alias = "keyName")]
    key_name: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Referential {
    #[serde(alias = "attributeKeys")]
    attribute_keys: Vec<AttributeKeyDef>,
}

/// Attribute definitions from the identity referential, keyed by attribute key.
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalog {
    by_key: HashMap<String, AttributeInfo>,
}

impl AttributeCatalog {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let referential: Referential = serde_json::from_value(value)?;
        Ok(referential
            .attribute_keys
            .into_iter()
            .map(|def| {
                (
                    def.key_name,
                    AttributeInfo {
                        label: def.name,
                        description: def.description,
                    },
                )
            })
            .collect())
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let parse_err = |source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        };
        let value: Value = serde_json::from_str(&content).map_err(parse_err)?;
        Self::from_value(value).map_err(parse_err)
    }

    pub fn insert(&mut self, key: impl Into<String>, info: AttributeInfo) {
        self.by_key.insert(key.into(), info);
    }

    pub fn get(&self, key: &str) -> Option<&AttributeInfo> {
        self.by_key.get(key)
    }

    /// Display label for `key`; empty when the key is not in the referential.
    pub fn label(&self, key: &str) -> String {
        self.get(key).map(|info| info.label.clone()).unwrap_or_default()
    }
}

impl FromIterator<(String, AttributeInfo)> for AttributeCatalog {
    fn from_iter<I: IntoIterator<Item = (String, AttributeInfo)>>(iter: I) -> Self {
        Self {
            by_key: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> LabelCatalog {
        LabelCatalog::new(json!({
            "unknown": "Unknown",
            "history": {"update": {"success": "Identity updated", "failure": ""}},
            "tasks": {"account_creation": {"label": "Account creation"}}
        }))
    }

    #[test]
    fn lookup_lowercases_segments() {
        let labels = catalog();
        assert_eq!(
            labels.lookup(&["history", "UPDATE", "SUCCESS"]).or_empty(),
            "Identity updated"
        );
    }

    #[test]
    fn missing_and_empty_leaves_fall_back() {
        let labels = catalog();
        assert_eq!(labels.lookup(&["history", "create", "success"]), Lookup::missed());
        assert_eq!(labels.lookup(&["history", "update", "failure"]).or("x"), "x");
        // an object is not a label
        assert_eq!(labels.lookup(&["tasks", "account_creation"]).or_empty(), "");
    }

    #[test]
    fn chained_lookup_uses_first_hit() {
        let labels = catalog();
        let text = labels
            .lookup(&["tasks", "email_validation", "label"])
            .or_lookup(|| labels.lookup(&["unknown"]))
            .or_empty();
        assert_eq!(text, "Unknown");
    }

    #[test]
    fn empty_direct_value_counts_as_miss() {
        let labels = catalog();
        assert_eq!(Lookup::from(Some("")), Lookup::missed());
        assert_eq!(
            Lookup::from(Some("alice"))
                .or_lookup(|| labels.lookup(&["unknown"]))
                .or_empty(),
            "alice"
        );
    }

    #[test]
    fn attribute_catalog_from_referential() {
        let attrs = AttributeCatalog::from_value(json!({
            "attributeKeys": [
                {"keyName": "email", "name": "Email address", "description": "Contact"}
            ]
        }))
        .expect("referential");
        assert_eq!(attrs.label("email"), "Email address");
        assert_eq!(attrs.label("birthdate"), "");
    }
}
